//! Display context: a read-only mirror of the controller's timer
//!
//! A display never writes the store and never re-broadcasts. It replaces
//! its mirrored snapshot wholesale with whatever either transport delivers
//! last, and derives everything it renders from that snapshot and its own
//! clock.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    channel::SyncReceiver,
    message::SyncMessage,
    store::{self, ContextId, SnapshotStore, StoreChange, StoreWatcher, QUEUE_KEY, TIMER_KEY},
};
use crate::{
    state::{Speaker, TimerSnapshot, TimerStatus},
    timer::{self, Clock},
    utils::format::format_time,
};

const TITLE_SUFFIX: &str = "Speaker Timer";

/// Everything an audience-facing surface needs for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayView {
    pub status: TimerStatus,
    pub remaining: i64,
    pub formatted: String,
    pub overtime: bool,
    /// "Time Exceeded" in overtime, otherwise the status
    pub label: String,
    pub speaker: Option<Speaker>,
    pub speaker_duration: i64,
    pub title: String,
}

/// Mirrored state of one display context
pub struct DisplayMirror {
    snapshot: TimerSnapshot,
    speaker_duration: i64,
    speaker: Option<Speaker>,
    clock: Arc<dyn Clock>,
}

impl DisplayMirror {
    /// Empty mirror, before anything has been read or received
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshot: TimerSnapshot::default(),
            speaker_duration: 0,
            speaker: None,
            clock,
        }
    }

    /// Mirror initialized from whatever the store currently holds
    pub fn cold_start(store: &dyn SnapshotStore, clock: Arc<dyn Clock>) -> Self {
        let snapshot = store::load_timer_snapshot(store);
        let speaker = store::load_speaker_queue(store).current_speaker().cloned();
        Self {
            speaker_duration: speaker.as_ref().map_or(0, |s| s.duration),
            snapshot,
            speaker,
            clock,
        }
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn speaker(&self) -> Option<&Speaker> {
        self.speaker.as_ref()
    }

    /// Replace the mirrored timer with the message's snapshot
    pub fn apply_message(&mut self, message: &SyncMessage) {
        match message {
            SyncMessage::StatusUpdate(update) => {
                self.snapshot = update.snapshot.clone();
                self.speaker_duration = update.duration;
            }
        }
    }

    /// Apply a store notification. Records that fail to decode are
    /// skipped; the next delivery on either transport corrects the mirror.
    pub fn apply_store_change(&mut self, change: &StoreChange) {
        match change.key.as_str() {
            TIMER_KEY => match TimerSnapshot::decode(&change.value) {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => warn!("Ignoring timer snapshot from {}: {}", change.writer, e),
            },
            QUEUE_KEY => match store::decode_queue(&change.value) {
                Ok(queue) => {
                    self.speaker = queue.current_speaker().cloned();
                    self.speaker_duration = self.speaker.as_ref().map_or(0, |s| s.duration);
                }
                Err(e) => warn!("Ignoring speaker queue from {}: {}", change.writer, e),
            },
            other => debug!("Ignoring change to unknown key '{}'", other),
        }
    }

    /// Remaining seconds against this context's clock
    pub fn remaining(&self) -> i64 {
        timer::remaining(&self.snapshot, self.clock.now_ms())
    }

    pub fn render(&self) -> DisplayView {
        let remaining = self.remaining();
        let formatted = format_time(remaining);
        let overtime = remaining < 0;
        let label = if overtime {
            "Time Exceeded".to_string()
        } else {
            self.snapshot.status.to_string()
        };
        let title = match &self.speaker {
            Some(speaker) => format!("{} - {} - {}", speaker.name, formatted, TITLE_SUFFIX),
            None => format!("Waiting for Speaker - {}", TITLE_SUFFIX),
        };

        DisplayView {
            status: self.snapshot.status,
            remaining,
            formatted,
            overtime,
            label,
            speaker: self.speaker.clone(),
            speaker_duration: self.speaker_duration,
            title,
        }
    }
}

/// A display mirror wired to both transports and a render interval
pub struct DisplayContext {
    pub(crate) id: ContextId,
    pub(crate) mirror: DisplayMirror,
    pub(crate) messages: Option<SyncReceiver>,
    pub(crate) changes: StoreWatcher,
    pub(crate) view_tx: watch::Sender<DisplayView>,
    pub(crate) render_period: Duration,
}

impl DisplayContext {
    /// Attach a display to `store` (and `messages` when the controller is
    /// in the same process). The store is watched before it is read so no
    /// change can slip between the cold read and the first notification.
    pub fn new(
        store: &dyn SnapshotStore,
        messages: Option<SyncReceiver>,
        clock: Arc<dyn Clock>,
        render_period: Duration,
    ) -> (Self, watch::Receiver<DisplayView>) {
        let id = ContextId::next();
        let changes = store.watch(id);
        let mirror = DisplayMirror::cold_start(store, clock);
        let (view_tx, view_rx) = watch::channel(mirror.render());

        info!(
            "Display {} attached: status={}, speaker={}",
            id,
            mirror.snapshot().status,
            mirror.speaker().map_or("none", |s| s.name.as_str())
        );

        (
            Self {
                id,
                mirror,
                messages,
                changes,
                view_tx,
                render_period,
            },
            view_rx,
        )
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn mirror(&self) -> &DisplayMirror {
        &self.mirror
    }

    /// Recompute the view and notify watchers if anything visible changed
    pub(crate) fn render(&self) {
        let view = self.mirror.render();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
