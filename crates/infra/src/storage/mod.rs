//! Durable single-slot storage for the client-side cart.
//!
//! The cart store only needs one named slot holding a JSON document: `load()`
//! returns the last saved value (if any) and `save()` replaces it. Backends:
//!
//! - [`InMemorySlot`]: tests and the `memory` backend; supports failure injection
//! - [`FileSlot`]: one JSON file per slot in the data directory (default)
//! - [`SqliteSlot`]: key-value table in a local SQLite database

pub mod file;
pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use file::FileSlot;
pub use in_memory::InMemorySlot;
pub use r#trait::{StorageError, StorageSlot};
pub use sqlite::SqliteSlot;

use crate::config::{StorageBackend, StorefrontConfig};

/// Open the slot selected by configuration.
pub fn open_slot(config: &StorefrontConfig) -> Result<Box<dyn StorageSlot>, StorageError> {
    let slot: Box<dyn StorageSlot> = match config.storage {
        StorageBackend::Memory => Box::new(InMemorySlot::new()),
        StorageBackend::File => {
            let slot = FileSlot::new(&config.data_dir, &config.cart_key);
            tracing::debug!(path = %slot.path().display(), "cart file");
            Box::new(slot)
        }
        StorageBackend::Sqlite => Box::new(SqliteSlot::open(
            config.data_dir.join("storefront.sqlite3"),
            &config.cart_key,
        )?),
    };

    tracing::debug!(
        backend = ?config.storage,
        key = %config.cart_key,
        data_dir = %config.data_dir.display(),
        "opened cart storage slot"
    );

    Ok(slot)
}
