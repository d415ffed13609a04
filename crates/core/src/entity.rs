//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// In the cart domain a line item is an entity: its quantity changes over
/// time, but it is the same line item as long as its identity is the same.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
