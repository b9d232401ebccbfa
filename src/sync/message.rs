//! Messages carried over the sync channel

use serde::{Deserialize, Serialize};

use crate::state::TimerSnapshot;

/// Full timer snapshot plus the active speaker's duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(flatten)]
    pub snapshot: TimerSnapshot,
    /// Duration of the current speaker, 0 when none is loaded
    pub duration: i64,
}

/// Wire shape: `{"type": "STATUS_UPDATE", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    StatusUpdate(StatusUpdate),
}

impl SyncMessage {
    pub fn status_update(snapshot: TimerSnapshot, duration: i64) -> Self {
        SyncMessage::StatusUpdate(StatusUpdate { snapshot, duration })
    }
}
