//! SQLite-backed slot (key-value table in a local database file).

use std::future::Future;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::runtime::{Builder, Handle, Runtime};

use super::r#trait::{StorageError, StorageSlot};

/// Slot stored as one row of the `storage_slots` table.
///
/// The slot API is synchronous, so the slot owns a small current-thread tokio
/// runtime and blocks on each query. When called from inside another runtime
/// the query is driven from a scoped helper thread instead.
#[derive(Debug)]
pub struct SqliteSlot {
    pool: SqlitePool,
    key: String,
    runtime: Option<Runtime>,
}

fn run_blocking<F, T>(runtime: &Runtime, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send,
    T: Send,
{
    if Handle::try_current().is_err() {
        return runtime.block_on(fut);
    }

    std::thread::scope(|scope| {
        scope
            .spawn(move || runtime.block_on(fut))
            .join()
            .unwrap_or_else(|_| Err(anyhow::anyhow!("sqlite worker thread panicked")))
    })
}

impl SqliteSlot {
    /// Open (creating if needed) the database at `path` and bind the slot `key`.
    pub fn open(path: impl AsRef<Path>, key: &str) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Runtime(format!("failed to create sqlite runtime: {e}")))?;

        let pool = run_blocking(&runtime, async {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create data directory at {parent:?}"))?;
            }

            let options = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
                .with_context(|| format!("failed to open SQLite database at {path:?}"))?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS storage_slots (
                    slot_key TEXT PRIMARY KEY NOT NULL,
                    value    TEXT NOT NULL,
                    saved_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .context("failed to create storage_slots table")?;

            Ok(pool)
        })
        .map_err(StorageError::sqlite)?;

        Ok(Self {
            pool,
            key: key.to_string(),
            runtime: Some(runtime),
        })
    }

    fn run<F, T>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = anyhow::Result<T>> + Send,
        T: Send,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| StorageError::Runtime("sqlite runtime already shut down".to_string()))?;
        run_blocking(runtime, fut).map_err(StorageError::sqlite)
    }
}

impl StorageSlot for SqliteSlot {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let pool = &self.pool;
        let key = self.key.as_str();

        self.run(async move {
            let row = sqlx::query("SELECT value FROM storage_slots WHERE slot_key = ?1")
                .bind(key)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("failed to load slot {key}"))?;

            match row {
                Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
                None => Ok(None),
            }
        })
    }

    fn save(&self, value: &str) -> Result<(), StorageError> {
        let pool = &self.pool;
        let key = self.key.as_str();
        let saved_at = Utc::now().to_rfc3339();

        self.run(async move {
            sqlx::query(
                r#"
                INSERT INTO storage_slots (slot_key, value, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(slot_key) DO UPDATE SET
                    value = excluded.value,
                    saved_at = excluded.saved_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(&saved_at)
            .execute(pool)
            .await
            .with_context(|| format!("failed to save slot {key}"))?;
            Ok(())
        })
    }
}

impl Drop for SqliteSlot {
    fn drop(&mut self) {
        // Dropping a runtime from async context panics; shutting down in the
        // background is allowed anywhere.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_keeps_slots_separate() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.sqlite3");

        let cart = SqliteSlot::open(&db, "headless_store_cart").unwrap();
        let other = SqliteSlot::open(&db, "other").unwrap();

        assert_eq!(cart.load().unwrap(), None);

        cart.save("[1]").unwrap();
        cart.save("[2]").unwrap();
        other.save("x").unwrap();

        assert_eq!(cart.load().unwrap().as_deref(), Some("[2]"));
        assert_eq!(other.load().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("store.sqlite3");

        SqliteSlot::open(&db, "cart").unwrap().save("[]").unwrap();

        let reopened = SqliteSlot::open(&db, "cart").unwrap();
        assert_eq!(reopened.load().unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn usable_from_inside_an_async_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let slot = SqliteSlot::open(dir.path().join("store.sqlite3"), "cart").unwrap();

        slot.save("[]").unwrap();
        assert_eq!(slot.load().unwrap().as_deref(), Some("[]"));
    }
}
