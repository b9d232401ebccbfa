//! Timer snapshot structure and schema validation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete timer record. Every write and every sync message carries one
/// of these in full; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    /// Seconds loaded for the active speaker
    pub initial_duration: i64,
    /// Epoch ms at which the current running interval began
    pub start_time: Option<i64>,
    /// Epoch ms at which the timer was paused
    pub paused_at: Option<i64>,
    /// Cached remaining seconds. Authoritative only while idle or paused;
    /// negative means overtime.
    pub time_remaining: i64,
}

impl TimerSnapshot {
    /// Create an idle snapshot with nothing loaded
    pub fn new() -> Self {
        Self {
            status: TimerStatus::Idle,
            initial_duration: 0,
            start_time: None,
            paused_at: None,
            time_remaining: 0,
        }
    }

    /// Create an idle snapshot with a duration loaded
    pub fn loaded(duration: i64) -> Self {
        Self {
            initial_duration: duration,
            time_remaining: duration,
            ..Self::new()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Check the structural invariants of the record
    pub fn validate(&self) -> Result<(), SnapshotError> {
        match (self.status, self.start_time, self.paused_at) {
            (TimerStatus::Idle, Some(_), _) => {
                Err(SnapshotError::Invariant("idle snapshot carries a start time"))
            }
            (TimerStatus::Idle, _, Some(_)) | (TimerStatus::Running, _, Some(_)) => Err(
                SnapshotError::Invariant("pausedAt is only valid while paused"),
            ),
            (TimerStatus::Running, None, _) | (TimerStatus::Paused, None, _) => Err(
                SnapshotError::Invariant("active snapshot is missing its start time"),
            ),
            (TimerStatus::Paused, Some(_), None) => {
                Err(SnapshotError::Invariant("paused snapshot is missing pausedAt"))
            }
            _ if self.initial_duration < 0 => {
                Err(SnapshotError::Invariant("initialDuration is negative"))
            }
            _ => Ok(()),
        }
    }

    /// Parse and validate a persisted snapshot
    pub fn decode(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
