//! Runtime event stream payloads.

use crate::types::{EpisodeId, SeriesId, SnapshotSeq};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesEvent {
    /// A new series was appended.
    Added {
        /// New series id.
        id: SeriesId,
    },
    /// A series completion toggle, cascaded to its episodes.
    SeriesUpdated {
        /// Updated series id.
        id: SeriesId,
    },
    /// A single episode completion toggle.
    EpisodeUpdated {
        /// Parent series id.
        series_id: SeriesId,
        /// Updated episode id.
        episode_id: EpisodeId,
    },
    /// A series was removed.
    Removed {
        /// Removed series id.
        id: SeriesId,
    },
    /// The whole collection was emptied.
    Cleared,
    /// The snapshot with this sequence reached storage.
    Persisted {
        /// Snapshot sequence written.
        seq: SnapshotSeq,
    },
    /// Writing the snapshot with this sequence failed and was dropped.
    PersistFailed {
        /// Snapshot sequence that failed.
        seq: SnapshotSeq,
    },
}
