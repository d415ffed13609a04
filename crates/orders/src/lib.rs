//! Order placement: what checkout hands to the commerce backend.
//!
//! This crate turns a cart snapshot plus customer contact details and an
//! external payment confirmation into an [`OrderRequest`], and defines the
//! [`OrderRelay`] seam that forwards it to the backend. Adapters live in
//! `storefront-infra`.

pub mod contact;
pub mod order;
pub mod relay;

pub use contact::CustomerContact;
pub use order::{OrderConfirmation, OrderLine, OrderRequest, PaymentConfirmation};
pub use relay::{OrderRelay, RelayError};
