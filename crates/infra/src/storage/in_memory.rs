use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::r#trait::{StorageError, StorageSlot};

/// In-memory slot.
///
/// Intended for tests/dev. Reads and writes can be made to fail on demand to
/// exercise the cart store's fail-soft paths.
#[derive(Debug, Default)]
pub struct InMemorySlot {
    value: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-populated with `value`, as if saved by an earlier session.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
            ..Self::default()
        }
    }

    /// Currently stored value.
    pub fn value(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageSlot for InMemorySlot {
    fn load(&self) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.lock().clone())
    }

    fn save(&self, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        *self.lock() = Some(value.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
