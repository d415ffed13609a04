//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// create a new one with the new values.
///
/// Example:
/// - `Money::from_minor(4990)` is a value object (any two `49.90`s are interchangeable)
/// - a cart line item is an entity (it keeps its identity while its quantity changes)
///
/// ```ignore
/// let a = Money::parse_decimal("49.90")?;
/// let b = Money::from_minor(4990);
/// assert_eq!(a, b);  // Equal by value, not identity
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
