//! Infrastructure layer: cart storage backends, the commerce-backend relay,
//! configuration.

pub mod config;
pub mod relay;
pub mod storage;

pub use config::{StorageBackend, StorefrontConfig, WooCommerceSettings};
pub use relay::WooCommerceRelay;
pub use storage::{open_slot, FileSlot, InMemorySlot, SqliteSlot, StorageError, StorageSlot};
