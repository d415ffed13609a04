//! Order relay adapters (commerce backend clients).

pub mod woocommerce;

pub use woocommerce::{WooCommerceRelay, WooOrderPayload};
