//! Catalog records as delivered by the commerce backend.
//!
//! The catalog is owned by the backend; this crate only models the fields the
//! storefront needs to turn a product page selection into a cart
//! [`ItemSelection`](storefront_cart::ItemSelection) (price capture, default
//! color/size, size requirement).

pub mod product;

pub use product::{CatalogImage, CatalogProduct, ProductExtras, DEFAULT_COLOR, DEFAULT_SIZE, STANDARD_SIZES};
