use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};

use crate::{
    core::store::{SeriesStore, StoreError},
    persist::{PersistError, PersistenceAdapter},
    series::{EpisodeCount, Series, ValidationError, check_name},
    snapshot::Snapshot,
    types::{Collection, SeriesId, SnapshotSeq},
};

use super::events::SeriesEvent;

/// Failure surfaced by [`SeriesTrackerHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The store rejected the mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The runtime task has stopped.
    #[error("series tracker runtime is closed")]
    ChannelClosed,
}

impl From<ValidationError> for RuntimeError {
    fn from(value: ValidationError) -> Self {
        Self::Store(StoreError::Validation(value))
    }
}

/// Channel sizing for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pending commands before callers wait.
    pub command_buffer: usize,
    /// Events retained for slow subscribers before they lag.
    pub event_buffer: usize,
    /// Snapshots queued for the persistence worker before the command loop waits.
    pub persist_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            event_buffer: 1024,
            persist_queue_bound: 64,
        }
    }
}

/// Cloneable front door to the single-writer runtime.
pub struct SeriesTrackerHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<SeriesEvent>,
    collection_rx: watch::Receiver<Collection>,
}

impl Clone for SeriesTrackerHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
            collection_rx: self.collection_rx.clone(),
        }
    }
}

enum Command {
    Add {
        name: String,
        episode_count: EpisodeCount,
        resp: oneshot::Sender<Result<Series, StoreError>>,
    },
    SetSeriesCompletion {
        series_id: SeriesId,
        completed: bool,
        resp: oneshot::Sender<Result<Series, StoreError>>,
    },
    SetEpisodeCompletion {
        series_id: SeriesId,
        episode_id: String,
        completed: bool,
        resp: oneshot::Sender<Result<Series, StoreError>>,
    },
    Remove {
        series_id: SeriesId,
        resp: oneshot::Sender<Result<Series, StoreError>>,
    },
    ClearAll {
        resp: oneshot::Sender<()>,
    },
    Get {
        series_id: SeriesId,
        resp: oneshot::Sender<Option<Series>>,
    },
    List {
        resp: oneshot::Sender<Collection>,
    },
    Flush {
        resp: oneshot::Sender<SnapshotSeq>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

enum PersistMsg {
    Snapshot(Snapshot),
    Flush {
        resp: oneshot::Sender<SnapshotSeq>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct Outbox {
    events_tx: broadcast::Sender<SeriesEvent>,
    collection_tx: watch::Sender<Collection>,
    persist_tx: Option<mpsc::Sender<PersistMsg>>,
}

/// Seeds a store from `adapter` (once, off the async threads) and spawns the
/// runtime around it. Without an adapter the tracker runs purely in memory.
pub async fn start_series_tracker(
    adapter: Option<PersistenceAdapter>,
    config: RuntimeConfig,
) -> SeriesTrackerHandle {
    let Some(adapter) = adapter else {
        return spawn_series_tracker(SeriesStore::new(), None, config);
    };

    let loaded = tokio::task::spawn_blocking(move || {
        let store = SeriesStore::load(&adapter);
        (store, adapter)
    })
    .await;

    match loaded {
        Ok((store, adapter)) => spawn_series_tracker(store, Some(adapter), config),
        Err(err) => {
            log::error!("loading series list failed, running without persistence: {err}");
            spawn_series_tracker(SeriesStore::new(), None, config)
        }
    }
}

/// Spawns the command loop (and the persistence worker when `adapter` is
/// set) around an already seeded store.
pub fn spawn_series_tracker(
    store: SeriesStore,
    adapter: Option<PersistenceAdapter>,
    config: RuntimeConfig,
) -> SeriesTrackerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_buffer.max(1));
    let (events_tx, _) = broadcast::channel::<SeriesEvent>(config.event_buffer.max(1));
    let (collection_tx, collection_rx) = watch::channel(store.collection());

    let persist_tx = adapter.map(|adapter| {
        let (persist_tx, persist_rx) =
            mpsc::channel::<PersistMsg>(config.persist_queue_bound.max(1));
        spawn_persistence_worker(adapter, persist_rx, events_tx.clone());
        persist_tx
    });

    let outbox = Outbox {
        events_tx: events_tx.clone(),
        collection_tx,
        persist_tx,
    };

    tokio::spawn(async move {
        let mut store = store;
        log::debug!("series tracker started with {} series", store.len());

        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut store, &outbox).await {
                break;
            }
        }

        log::debug!("series tracker stopped");
    });

    SeriesTrackerHandle {
        cmd_tx,
        events_tx,
        collection_rx,
    }
}

impl SeriesTrackerHandle {
    /// Subscribes to mutation and persistence events.
    pub fn subscribe(&self) -> broadcast::Receiver<SeriesEvent> {
        self.events_tx.subscribe()
    }

    /// Receiver that always holds the latest collection.
    pub fn watch(&self) -> watch::Receiver<Collection> {
        self.collection_rx.clone()
    }

    /// Latest published collection.
    pub fn current(&self) -> Collection {
        Arc::clone(&self.collection_rx.borrow())
    }

    /// Appends a new series. Input is validated before anything is sent.
    pub async fn add<C>(
        &self,
        name: impl Into<String>,
        episode_count: C,
    ) -> Result<Series, RuntimeError>
    where
        C: TryInto<EpisodeCount>,
        C::Error: Into<ValidationError>,
    {
        let name = name.into();
        check_name(&name)?;
        let episode_count = TryInto::<EpisodeCount>::try_into(episode_count)
            .map_err(|err| RuntimeError::from(Into::<ValidationError>::into(err)))?;
        Ok(self
            .request(|resp| Command::Add {
                name,
                episode_count,
                resp,
            })
            .await??)
    }

    /// Marks a series and all of its episodes completed.
    pub async fn mark_series_complete(
        &self,
        series_id: impl Into<SeriesId>,
    ) -> Result<Series, RuntimeError> {
        self.set_series_completion(series_id.into(), true).await
    }

    /// Marks a series and all of its episodes pending.
    pub async fn unmark_series_complete(
        &self,
        series_id: impl Into<SeriesId>,
    ) -> Result<Series, RuntimeError> {
        self.set_series_completion(series_id.into(), false).await
    }

    /// Marks one episode completed.
    pub async fn mark_episode_complete(
        &self,
        series_id: impl Into<SeriesId>,
        episode_id: impl Into<String>,
    ) -> Result<Series, RuntimeError> {
        self.set_episode_completion(series_id.into(), episode_id.into(), true)
            .await
    }

    /// Marks one episode pending.
    pub async fn unmark_episode_complete(
        &self,
        series_id: impl Into<SeriesId>,
        episode_id: impl Into<String>,
    ) -> Result<Series, RuntimeError> {
        self.set_episode_completion(series_id.into(), episode_id.into(), false)
            .await
    }

    /// Removes one series, returning it.
    pub async fn remove_series(
        &self,
        series_id: impl Into<SeriesId>,
    ) -> Result<Series, RuntimeError> {
        let series_id = series_id.into();
        Ok(self
            .request(|resp| Command::Remove { series_id, resp })
            .await??)
    }

    /// Empties the collection.
    pub async fn clear_all(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::ClearAll { resp }).await
    }

    /// Looks up a series by id.
    pub async fn get(
        &self,
        series_id: impl Into<SeriesId>,
    ) -> Result<Option<Series>, RuntimeError> {
        let series_id = series_id.into();
        self.request(|resp| Command::Get { series_id, resp }).await
    }

    /// Collection as of every command sent before this one.
    pub async fn list(&self) -> Result<Collection, RuntimeError> {
        self.request(|resp| Command::List { resp }).await
    }

    /// Waits until every snapshot issued so far has been attempted and
    /// returns the highest sequence that reached storage.
    pub async fn flush(&self) -> Result<SnapshotSeq, RuntimeError> {
        self.request(|resp| Command::Flush { resp }).await
    }

    /// Drains pending writes and stops the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn set_series_completion(
        &self,
        series_id: SeriesId,
        completed: bool,
    ) -> Result<Series, RuntimeError> {
        Ok(self
            .request(|resp| Command::SetSeriesCompletion {
                series_id,
                completed,
                resp,
            })
            .await??)
    }

    async fn set_episode_completion(
        &self,
        series_id: SeriesId,
        episode_id: String,
        completed: bool,
    ) -> Result<Series, RuntimeError> {
        Ok(self
            .request(|resp| Command::SetEpisodeCompletion {
                series_id,
                episode_id,
                completed,
                resp,
            })
            .await??)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(cmd: Command, store: &mut SeriesStore, outbox: &Outbox) -> bool {
    match cmd {
        Command::Add {
            name,
            episode_count,
            resp,
        } => {
            let res = store.add(&name, episode_count);
            if let Ok(series) = &res {
                publish(store, outbox, SeriesEvent::Added { id: series.id.clone() }).await;
            }
            let _ = resp.send(res);
        }
        Command::SetSeriesCompletion {
            series_id,
            completed,
            resp,
        } => {
            let res = if completed {
                store.mark_series_complete(&series_id)
            } else {
                store.unmark_series_complete(&series_id)
            };
            if res.is_ok() {
                publish(store, outbox, SeriesEvent::SeriesUpdated { id: series_id }).await;
            }
            let _ = resp.send(res);
        }
        Command::SetEpisodeCompletion {
            series_id,
            episode_id,
            completed,
            resp,
        } => {
            let res = if completed {
                store.mark_episode_complete(&series_id, &episode_id)
            } else {
                store.unmark_episode_complete(&series_id, &episode_id)
            };
            if res.is_ok() {
                let event = SeriesEvent::EpisodeUpdated {
                    series_id,
                    episode_id,
                };
                publish(store, outbox, event).await;
            }
            let _ = resp.send(res);
        }
        Command::Remove { series_id, resp } => {
            let res = store.remove_series(&series_id);
            if res.is_ok() {
                publish(store, outbox, SeriesEvent::Removed { id: series_id }).await;
            }
            let _ = resp.send(res);
        }
        Command::ClearAll { resp } => {
            store.clear_all();
            publish(store, outbox, SeriesEvent::Cleared).await;
            let _ = resp.send(());
        }
        Command::Get { series_id, resp } => {
            let _ = resp.send(store.series(&series_id).cloned());
        }
        Command::List { resp } => {
            let _ = resp.send(store.collection());
        }
        Command::Flush { resp } => {
            let durable = match &outbox.persist_tx {
                Some(tx) => {
                    let (flush_tx, flush_rx) = oneshot::channel();
                    if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                        0
                    } else {
                        flush_rx.await.unwrap_or(0)
                    }
                }
                None => store.latest_snapshot_seq(),
            };
            let _ = resp.send(durable);
        }
        Command::Shutdown { resp } => {
            if let Some(tx) = &outbox.persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_ok() {
                    let _ = done_rx.await;
                }
            }
            let _ = resp.send(());
            return true;
        }
    }

    false
}

/// Notifies observers of the new state, then hands its snapshots to persistence.
async fn publish(store: &mut SeriesStore, outbox: &Outbox, event: SeriesEvent) {
    outbox.collection_tx.send_replace(store.collection());
    let _ = outbox.events_tx.send(event);

    let snapshots = store.drain_pending_snapshots();
    let Some(tx) = &outbox.persist_tx else {
        return;
    };
    for snapshot in snapshots {
        let seq = snapshot.seq;
        if tx.send(PersistMsg::Snapshot(snapshot)).await.is_err() {
            log::warn!("persistence worker is gone, snapshot {seq} not written");
        }
    }
}

/// Writes snapshots one at a time in the order they were issued, so storage
/// always ends up holding the most recently issued one.
fn spawn_persistence_worker(
    adapter: PersistenceAdapter,
    mut rx: mpsc::Receiver<PersistMsg>,
    events_tx: broadcast::Sender<SeriesEvent>,
) {
    let adapter = Arc::new(Mutex::new(adapter));
    tokio::spawn(async move {
        let mut last_durable: SnapshotSeq = 0;

        while let Some(msg) = rx.recv().await {
            match msg {
                PersistMsg::Snapshot(snapshot) => {
                    let seq = snapshot.seq;
                    match write_snapshot(&adapter, snapshot).await {
                        Ok(()) => {
                            last_durable = last_durable.max(seq);
                            let _ = events_tx.send(SeriesEvent::Persisted { seq });
                        }
                        Err(err) => {
                            log::warn!("failed to save snapshot {seq}: {err}");
                            let _ = events_tx.send(SeriesEvent::PersistFailed { seq });
                        }
                    }
                }
                PersistMsg::Flush { resp } => {
                    let _ = resp.send(last_durable);
                }
                PersistMsg::Shutdown { resp } => {
                    let _ = resp.send(());
                    break;
                }
            }
        }
    });
}

async fn write_snapshot(
    adapter: &Arc<Mutex<PersistenceAdapter>>,
    snapshot: Snapshot,
) -> Result<(), PersistError> {
    let adapter = Arc::clone(adapter);
    tokio::task::spawn_blocking(move || {
        let mut adapter = adapter.blocking_lock();
        adapter.try_save(&snapshot.collection)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?
}
