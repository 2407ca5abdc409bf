//! Point-in-time copies of the collection handed to persistence.

use crate::types::{Collection, SnapshotSeq};

/// Full collection captured after one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Monotonic sequence, one per successful mutation.
    pub seq: SnapshotSeq,
    /// Capture time in milliseconds since epoch.
    pub ts_ms: u64,
    /// The collection as it stood after the mutation.
    pub collection: Collection,
}

impl Snapshot {
    /// Number of series in the captured collection.
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Returns true when the captured collection is empty.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}
