//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products, locations and movements are entities: two instances with the
/// same id are the same record regardless of their attribute values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
