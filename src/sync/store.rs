//! Snapshot persistence with change notification
//!
//! A store holds the last-known snapshot per key and tells every observer
//! except the writer when a key's content changes. Writers identify
//! themselves with a [`ContextId`]; observers filter with a [`StoreWatcher`].

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    error::{SnapshotError, StoreError},
    state::{SpeakerQueue, TimerSnapshot},
};

/// Key holding the timer snapshot
pub const TIMER_KEY: &str = "timer-snapshot";
/// Key holding the speaker queue
pub const QUEUE_KEY: &str = "speaker-queue";

const CHANGE_CAPACITY: usize = 64;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identity of a control or display context within one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Writes that originated outside this process
    pub const EXTERNAL: ContextId = ContextId(0);

    pub fn next() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::EXTERNAL {
            f.write_str("external")
        } else {
            write!(f, "ctx-{}", self.0)
        }
    }
}

/// Notification that a key now holds `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    pub writer: ContextId,
    pub value: String,
}

pub trait SnapshotStore: Send + Sync {
    /// Current raw value for `key`
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value for `key`. Observers other than `writer` are
    /// notified if the content changed.
    fn write(&self, writer: ContextId, key: &str, value: &str) -> Result<(), StoreError>;

    /// Raw change feed, including the writer's own changes
    fn changes(&self) -> broadcast::Receiver<StoreChange>;

    /// Change feed for `observer`, skipping its own writes
    fn watch(&self, observer: ContextId) -> StoreWatcher {
        StoreWatcher {
            observer,
            rx: self.changes(),
        }
    }
}

pub struct StoreWatcher {
    observer: ContextId,
    rx: broadcast::Receiver<StoreChange>,
}

impl StoreWatcher {
    /// Next change written by someone else. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StoreChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.writer == self.observer => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("{} missed {} store notifications", self.observer, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Fan-out of store changes shared by the store backends
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, writer: ContextId, key: &str, value: &str) {
        debug!("Store key '{}' changed by {}", key, writer);
        // No subscribers is normal before any display attaches
        let _ = self.tx.send(StoreChange {
            key: key.to_string(),
            writer,
            value: value.to_string(),
        });
    }
}

/// In-process store for single-process deployments and tests
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            feed: ChangeFeed::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, writer: ContextId, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        drop(entries);

        self.feed.emit(writer, key, value);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}

/// Serialize `value` and write it under `key`
pub fn save<T: Serialize>(
    store: &dyn SnapshotStore,
    writer: ContextId,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(writer, key, &json)
}

/// Cold-read the timer snapshot, substituting the idle default when the
/// record is missing, unreadable or corrupt
pub fn load_timer_snapshot(store: &dyn SnapshotStore) -> TimerSnapshot {
    match store.read(TIMER_KEY) {
        Ok(Some(json)) => TimerSnapshot::decode(&json).unwrap_or_else(|e| {
            warn!("Discarding persisted timer snapshot: {}", e);
            TimerSnapshot::default()
        }),
        Ok(None) => TimerSnapshot::default(),
        Err(e) => {
            warn!("Failed to read timer snapshot, starting idle: {}", e);
            TimerSnapshot::default()
        }
    }
}

/// Parse a persisted speaker queue
pub fn decode_queue(json: &str) -> Result<SpeakerQueue, SnapshotError> {
    let queue: SpeakerQueue = serde_json::from_str(json)?;
    if let Some(index) = queue.current_index {
        if index >= queue.speakers.len() {
            return Err(SnapshotError::Invariant("currentIndex past end of queue"));
        }
    }
    Ok(queue)
}

/// Cold-read the speaker queue, falling back to an empty queue
pub fn load_speaker_queue(store: &dyn SnapshotStore) -> SpeakerQueue {
    match store.read(QUEUE_KEY) {
        Ok(Some(json)) => decode_queue(&json).unwrap_or_else(|e| {
            warn!("Discarding persisted speaker queue: {}", e);
            SpeakerQueue::default()
        }),
        Ok(None) => SpeakerQueue::default(),
        Err(e) => {
            warn!("Failed to read speaker queue, starting empty: {}", e);
            SpeakerQueue::default()
        }
    }
}
