//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values
/// (`Sku`, `Price`, `Quantity`, `StockKey`). To "modify" one, build a new
/// one. Constructors validate, so a value object in hand is always valid.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
