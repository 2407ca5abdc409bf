use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    core::{
        indices::{PositionIndex, position_index},
        transform,
    },
    persist::PersistenceAdapter,
    series::{EpisodeCount, Series, ValidationError, check_name},
    snapshot::Snapshot,
    types::{Collection, SeriesId, SnapshotSeq},
};

/// Failure of a store mutation. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Rejected `add` input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No series with this id.
    #[error("series not found: {0}")]
    SeriesNotFound(SeriesId),
    /// The series exists but has no episode with this id.
    #[error("episode {episode_id} not found in series {series_id}")]
    EpisodeNotFound {
        /// Series that was searched.
        series_id: SeriesId,
        /// Missing episode id.
        episode_id: String,
    },
}

impl StoreError {
    /// True for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SeriesNotFound(_) | Self::EpisodeNotFound { .. }
        )
    }
}

/// Authoritative owner of the series collection.
///
/// Every successful mutation swaps in a freshly built collection and queues
/// exactly one [`Snapshot`] of it. Queued snapshots are held until drained
/// with [`SeriesStore::drain_pending_snapshots`] or
/// [`SeriesStore::persist_pending`], so callers using the store directly
/// must drain after mutating.
#[derive(Debug)]
pub struct SeriesStore {
    collection: Collection,
    pos: PositionIndex,
    pending: Vec<Snapshot>,
    next_seq: SnapshotSeq,
    last_id_ms: u64,
    clock: fn() -> u64,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesStore {
    /// Empty store using the system clock for ids.
    pub fn new() -> Self {
        Self::from_collection(Vec::new())
    }

    /// Store seeded with an existing collection, e.g. one read from storage.
    pub fn from_collection(collection: Vec<Series>) -> Self {
        let last_id_ms = collection
            .iter()
            .filter_map(|s| s.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            pos: position_index(&collection),
            collection: Arc::from(collection),
            pending: Vec::new(),
            next_seq: 1,
            last_id_ms,
            clock: now_ms,
        }
    }

    /// Seeds a store from persistent storage. Never fails: unreadable or
    /// absent data yields an empty store.
    pub fn load(adapter: &PersistenceAdapter) -> Self {
        Self::from_collection(adapter.load())
    }

    /// Replaces the millisecond clock used for new ids and snapshot times.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Current collection. Cheap to clone and never mutated in place.
    pub fn collection(&self) -> Collection {
        Arc::clone(&self.collection)
    }

    /// Looks up a series by id.
    pub fn series(&self, id: &str) -> Option<&Series> {
        self.pos.get(id).and_then(|idx| self.collection.get(*idx))
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// True when no series are tracked.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Sequence of the most recent snapshot, or zero before any mutation.
    pub fn latest_snapshot_seq(&self) -> SnapshotSeq {
        self.next_seq.saturating_sub(1)
    }

    /// Snapshot of the current state without queueing it.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            seq: self.latest_snapshot_seq(),
            ts_ms: (self.clock)(),
            collection: self.collection(),
        }
    }

    /// Takes every snapshot queued since the last drain, oldest first.
    pub fn drain_pending_snapshots(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.pending)
    }

    /// Saves every queued snapshot in order, best-effort.
    pub fn persist_pending(&mut self, adapter: &mut PersistenceAdapter) {
        for snapshot in self.drain_pending_snapshots() {
            adapter.save(&snapshot.collection);
        }
    }

    /// Appends a new pending series with `episode_count` episodes.
    pub fn add<C>(&mut self, name: &str, episode_count: C) -> Result<Series, StoreError>
    where
        C: TryInto<EpisodeCount>,
        C::Error: Into<ValidationError>,
    {
        check_name(name)?;
        let count = TryInto::<EpisodeCount>::try_into(episode_count)
            .map_err(|err| StoreError::Validation(err.into()))?;

        let id = self.next_series_id();
        let series = Series::new(id, name, count);
        self.commit(transform::append(&self.collection, series.clone()));
        Ok(series)
    }

    /// Marks the series and every one of its episodes completed.
    pub fn mark_series_complete(&mut self, series_id: &str) -> Result<Series, StoreError> {
        self.set_series_completion(series_id, true)
    }

    /// Marks the series and every one of its episodes pending.
    pub fn unmark_series_complete(&mut self, series_id: &str) -> Result<Series, StoreError> {
        self.set_series_completion(series_id, false)
    }

    /// Marks one episode completed. The series flag is not recomputed.
    pub fn mark_episode_complete(
        &mut self,
        series_id: &str,
        episode_id: &str,
    ) -> Result<Series, StoreError> {
        self.set_episode_completion(series_id, episode_id, true)
    }

    /// Marks one episode pending. The series flag is not recomputed.
    pub fn unmark_episode_complete(
        &mut self,
        series_id: &str,
        episode_id: &str,
    ) -> Result<Series, StoreError> {
        self.set_episode_completion(series_id, episode_id, false)
    }

    /// Removes exactly one series and returns it.
    pub fn remove_series(&mut self, series_id: &str) -> Result<Series, StoreError> {
        let idx = self.position(series_id)?;
        let removed = self.collection[idx].clone();
        self.commit(transform::without(&self.collection, idx));
        Ok(removed)
    }

    /// Empties the collection.
    pub fn clear_all(&mut self) {
        self.commit(Vec::new());
    }

    fn set_series_completion(
        &mut self,
        series_id: &str,
        completed: bool,
    ) -> Result<Series, StoreError> {
        let idx = self.position(series_id)?;
        self.commit(transform::with_series_completion(&self.collection, idx, completed));
        Ok(self.collection[idx].clone())
    }

    fn set_episode_completion(
        &mut self,
        series_id: &str,
        episode_id: &str,
        completed: bool,
    ) -> Result<Series, StoreError> {
        let idx = self.position(series_id)?;
        let next = transform::with_episode_completion(&self.collection, idx, episode_id, completed)
            .ok_or_else(|| StoreError::EpisodeNotFound {
                series_id: series_id.to_string(),
                episode_id: episode_id.to_string(),
            })?;
        self.commit(next);
        Ok(self.collection[idx].clone())
    }

    fn position(&self, series_id: &str) -> Result<usize, StoreError> {
        self.pos
            .get(series_id)
            .copied()
            .filter(|idx| *idx < self.collection.len())
            .ok_or_else(|| StoreError::SeriesNotFound(series_id.to_string()))
    }

    fn commit(&mut self, next: Vec<Series>) {
        self.pos = position_index(&next);
        self.collection = Arc::from(next);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Snapshot {
            seq,
            ts_ms: (self.clock)(),
            collection: self.collection(),
        });
    }

    fn next_series_id(&mut self) -> SeriesId {
        let now = (self.clock)();
        let start = match self.last_id_ms.checked_add(1) {
            Some(next) => now.max(next),
            None => now,
        };
        // Wraps to zero past u64::MAX.
        let ms = (start..=u64::MAX)
            .chain(0..start)
            .find(|ms| !self.pos.contains_key(ms.to_string().as_str()))
            .unwrap_or(start);
        self.last_id_ms = ms;
        ms.to_string()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
