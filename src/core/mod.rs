//! In-memory series store and the pure transformations behind it.

/// Position index helpers.
pub mod indices;
/// Authoritative series store.
pub mod store;
/// Pure collection-to-collection transformations.
pub mod transform;
