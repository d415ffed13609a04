//! Shopping cart domain module.
//!
//! This crate contains the business rules for the client-side cart, implemented
//! purely as deterministic domain logic (no IO, no storage, no notification).
//! The cart store in `storefront-client` composes it with persistence and
//! change notification.

pub mod cart;
pub mod line_item;

pub use cart::{
    AddItem, Cart, CartCleared, CartCommand, CartEvent, CartSnapshot, ClearCart, ItemAdded,
    ItemRemoved, QuantityChanged, QuantityIncremented, RemoveItem, SetQuantity,
};
pub use line_item::{ItemSelection, LineItem, LineItemId};
