use hashbrown::HashMap;

use crate::{series::Series, types::SeriesId};

/// Series id to position in the collection.
pub type PositionIndex = HashMap<SeriesId, usize>;

/// Builds the position index; the first occurrence of a duplicated id wins.
pub fn position_index(collection: &[Series]) -> PositionIndex {
    let mut pos = PositionIndex::with_capacity(collection.len());
    for (idx, series) in collection.iter().enumerate() {
        pos.entry(series.id.clone()).or_insert(idx);
    }
    pos
}
