//! Shared primitive identifiers and the collection alias.

use std::sync::Arc;

use crate::series::Series;

/// Series identifier, the creation timestamp in milliseconds as text.
pub type SeriesId = String;
/// Episode identifier, `"{series_id}-{index}"`.
pub type EpisodeId = String;
/// Monotonic snapshot sequence number.
pub type SnapshotSeq = u64;

/// Immutable, cheaply shareable view of the ordered series list.
///
/// Every mutation builds a new collection, so a `Collection` handed to an
/// observer or to persistence never changes underneath it.
pub type Collection = Arc<[Series]>;
