use std::sync::Arc;

use thiserror::Error;

/// Storage operation error.
///
/// Infrastructure failures only; what the stored document means is the
/// caller's concern.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(String),

    #[error("sqlite error: {0}")]
    Sqlite(String),

    #[error("storage runtime error: {0}")]
    Runtime(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Flatten an `anyhow` chain (`outer: inner: root`) into an `Io` error.
    pub(crate) fn io(err: anyhow::Error) -> Self {
        Self::Io(format!("{err:#}"))
    }

    pub(crate) fn sqlite(err: anyhow::Error) -> Self {
        Self::Sqlite(format!("{err:#}"))
    }
}

/// One named, durable slot holding a serialized document.
///
/// Calls are synchronous and complete before returning. `save` replaces the
/// whole value; there is no partial update.
pub trait StorageSlot: Send + Sync {
    /// Last saved value, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored value.
    fn save(&self, value: &str) -> Result<(), StorageError>;
}

impl<S> StorageSlot for Arc<S>
where
    S: StorageSlot + ?Sized,
{
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, value: &str) -> Result<(), StorageError> {
        (**self).save(value)
    }
}

impl<S> StorageSlot for Box<S>
where
    S: StorageSlot + ?Sized,
{
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, value: &str) -> Result<(), StorageError> {
        (**self).save(value)
    }
}
