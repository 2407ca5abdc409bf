//! Pure transformations: each takes the prior collection and returns a new one.
//!
//! Positions come from the caller's index. An out-of-range position leaves
//! every series untouched.

use crate::series::Series;

/// New collection with `series` appended at the end.
pub fn append(collection: &[Series], series: Series) -> Vec<Series> {
    let mut next = Vec::with_capacity(collection.len() + 1);
    next.extend_from_slice(collection);
    next.push(series);
    next
}

/// New collection with the series at `pos` and all its episodes set to `completed`.
pub fn with_series_completion(collection: &[Series], pos: usize, completed: bool) -> Vec<Series> {
    collection
        .iter()
        .enumerate()
        .map(|(idx, series)| {
            if idx == pos {
                series.with_completion(completed)
            } else {
                series.clone()
            }
        })
        .collect()
}

/// New collection with one episode of the series at `pos` set to `completed`.
///
/// Returns `None` when that series has no such episode.
pub fn with_episode_completion(
    collection: &[Series],
    pos: usize,
    episode_id: &str,
    completed: bool,
) -> Option<Vec<Series>> {
    let updated = collection.get(pos)?.with_episode_completion(episode_id, completed)?;
    let mut next = collection.to_vec();
    next[pos] = updated;
    Some(next)
}

/// New collection without the series at `pos`.
pub fn without(collection: &[Series], pos: usize) -> Vec<Series> {
    collection
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != pos)
        .map(|(_, series)| series.clone())
        .collect()
}
