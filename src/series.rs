//! Series and episode records, plus validated creation inputs.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::{EpisodeId, SeriesId};

/// Rejected input to series creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The series name was empty or only whitespace.
    #[error("please provide the series name")]
    EmptyName,
    /// The episode count was not a positive integer within range.
    #[error("please provide a valid number of episodes (got {0:?})")]
    InvalidEpisodeCount(String),
}

impl From<Infallible> for ValidationError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

/// Rejects names that are empty once surrounding whitespace is ignored.
pub(crate) fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// One individually toggleable episode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Episode {
    /// Identifier, unique within the parent series.
    pub id: EpisodeId,
    /// Display name, `"Episode {n}"` counting from one.
    pub name: String,
    /// True once watched.
    pub completed: bool,
}

/// A tracked show with its ordered episodes and an aggregate completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Series {
    /// Identifier derived from the creation timestamp.
    pub id: SeriesId,
    /// User-supplied title.
    pub name: String,
    /// Episodes in broadcast order.
    pub episodes: Vec<Episode>,
    /// Series-level completion flag.
    pub completed: bool,
}

impl Series {
    /// Builds a pending series with `count` sequentially named episodes.
    pub fn new(id: SeriesId, name: impl Into<String>, count: EpisodeCount) -> Self {
        let episodes = (0..count.get())
            .map(|i| Episode {
                id: format!("{id}-{i}"),
                name: format!("Episode {}", i + 1),
                completed: false,
            })
            .collect();

        Self {
            id,
            name: name.into(),
            episodes,
            completed: false,
        }
    }

    /// Looks up an episode by id.
    pub fn episode(&self, episode_id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|ep| ep.id == episode_id)
    }

    /// Number of episodes marked completed.
    pub fn completed_episodes(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.completed).count()
    }

    /// Copy with the series flag and every episode flag set to `completed`.
    pub fn with_completion(&self, completed: bool) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            episodes: self
                .episodes
                .iter()
                .map(|ep| Episode {
                    completed,
                    ..ep.clone()
                })
                .collect(),
            completed,
        }
    }

    /// Copy with one episode flag set, or `None` when the episode is absent.
    ///
    /// The series flag is left as is.
    pub fn with_episode_completion(&self, episode_id: &str, completed: bool) -> Option<Self> {
        let pos = self.episodes.iter().position(|ep| ep.id == episode_id)?;
        let mut next = self.clone();
        next.episodes[pos].completed = completed;
        Some(next)
    }
}

/// Largest episode count accepted for a new series.
pub const MAX_EPISODES: u32 = 10_000;

/// Positive number of episodes for a new series, at most [`MAX_EPISODES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeCount(u32);

impl EpisodeCount {
    /// Validates a raw count.
    pub fn new(count: u32) -> Result<Self, ValidationError> {
        if count == 0 || count > MAX_EPISODES {
            return Err(ValidationError::InvalidEpisodeCount(count.to_string()));
        }
        Ok(Self(count))
    }

    /// The count as an integer.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EpisodeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EpisodeCount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidEpisodeCount(s.to_string()));
        }
        let count = trimmed
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidEpisodeCount(s.to_string()))?;
        Self::new(count)
    }
}

impl TryFrom<&str> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<u32> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        i64::from(value).try_into()
    }
}

impl TryFrom<i64> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let count = u32::try_from(value)
            .map_err(|_| ValidationError::InvalidEpisodeCount(value.to_string()))?;
        Self::new(count)
    }
}

impl TryFrom<usize> for EpisodeCount {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let count = u32::try_from(value)
            .map_err(|_| ValidationError::InvalidEpisodeCount(value.to_string()))?;
        Self::new(count)
    }
}
