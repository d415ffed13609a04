//! `storefront-client`
//!
//! **Responsibility:** the client-side half of the storefront.
//!
//! This crate provides:
//! - the Cart Store (persisted, observable cart state)
//! - checkout (cart snapshot → paid order through the order relay)
//!
//! The `storefront` binary is a thin command-line shell over both.

pub mod checkout;
pub mod store;

pub use checkout::{Checkout, CheckoutError, ORDER_FAILED_MESSAGE};
pub use store::{CartChanged, CartStore};
