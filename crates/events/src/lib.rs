//! Domain events and in-process change notification.
//!
//! - [`Event`]: the trait domain events implement (stable type name + schema version)
//! - [`ChangeNotifier`]: synchronous, callback-based fan-out used by stores to push
//!   change notifications to observers (views, badges, tests)

pub mod event;
pub mod notifier;

pub use event::Event;
pub use notifier::{ChangeNotifier, Subscription};
