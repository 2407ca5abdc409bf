//! Personal TV-series watch-progress tracking with local snapshot persistence.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::SeriesStore`]:
//! ```
//! use seriestrack::{
//!     core::store::SeriesStore,
//!     persist::{PersistenceAdapter, memory::MemoryKvStore},
//! };
//!
//! let mut store = SeriesStore::new();
//! let show = store.add("Show A", 3).expect("add");
//! assert_eq!(show.episodes.len(), 3);
//!
//! let show = store
//!     .mark_episode_complete(&show.id, &show.episodes[1].id)
//!     .expect("mark");
//! assert!(show.episodes[1].completed);
//! assert!(!show.completed);
//!
//! let mut adapter = PersistenceAdapter::new(MemoryKvStore::new());
//! store.persist_pending(&mut adapter);
//! assert_eq!(adapter.load(), store.collection().to_vec());
//! ```
//!
//! Runtime usage with SQLite storage:
//! ```no_run
//! use seriestrack::{
//!     persist::{PersistenceAdapter, default_database_path, sqlite::SqliteKvStore},
//!     runtime::handle::{RuntimeConfig, start_series_tracker},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let path = default_database_path().expect("data dir");
//! let adapter = PersistenceAdapter::new(SqliteKvStore::open(path).expect("open sqlite"));
//! let handle = start_series_tracker(Some(adapter), RuntimeConfig::default()).await;
//! let show = handle.add("Show A", "12").await.expect("add");
//! handle.mark_series_complete(show.id).await.expect("mark");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Core in-memory store and its pure transformations.
pub mod core;
/// Persistence adapter and key-value backends.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Series and episode records.
pub mod series;
/// Point-in-time collection snapshots.
pub mod snapshot;
/// Shared identifier types.
pub mod types;
