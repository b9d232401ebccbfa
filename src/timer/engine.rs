//! Timer state machine
//!
//! `TimerEngine` owns the only mutable `TimerSnapshot` in a control context.
//! Every operation is total: an operation invalid for the current phase is a
//! no-op that returns `false` and leaves the snapshot untouched.

use std::sync::Arc;

use tracing::debug;

use super::{calculator, Clock};
use crate::state::{TimerSnapshot, TimerStatus};

pub struct TimerEngine {
    snapshot: TimerSnapshot,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create an engine in the default idle state
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_snapshot(TimerSnapshot::new(), clock)
    }

    /// Resume from a previously persisted snapshot
    pub fn from_snapshot(snapshot: TimerSnapshot, clock: Arc<dyn Clock>) -> Self {
        Self { snapshot, clock }
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> TimerStatus {
        self.snapshot.status
    }

    /// Remaining seconds as of the engine clock's current reading
    pub fn remaining(&self) -> i64 {
        calculator::remaining(&self.snapshot, self.clock.now_ms())
    }

    /// Load a speaker's duration. Callers only do this while idle; the
    /// engine returns to idle regardless so the timestamp invariants hold.
    /// Negative durations load as zero.
    pub fn load_duration(&mut self, duration: i64) -> bool {
        self.snapshot = TimerSnapshot::loaded(duration.max(0));
        true
    }

    pub fn start(&mut self) -> bool {
        if self.snapshot.status != TimerStatus::Idle || self.snapshot.initial_duration <= 0 {
            debug!(
                "Ignoring start: status={}, duration={}",
                self.snapshot.status, self.snapshot.initial_duration
            );
            return false;
        }

        let now = self.clock.now_ms();
        self.snapshot = TimerSnapshot {
            status: TimerStatus::Running,
            initial_duration: self.snapshot.initial_duration,
            start_time: Some(now),
            paused_at: None,
            time_remaining: self.snapshot.initial_duration,
        };
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.snapshot.is_running() {
            debug!("Ignoring pause: status={}", self.snapshot.status);
            return false;
        }

        let now = self.clock.now_ms();
        self.snapshot.time_remaining = calculator::remaining(&self.snapshot, now);
        self.snapshot.paused_at = Some(now);
        self.snapshot.status = TimerStatus::Paused;
        true
    }

    /// Resume a paused countdown.
    ///
    /// Rather than tracking paused time separately, a new start time is
    /// synthesized so that `initial - elapsed(start, now)` still yields the
    /// remaining value captured at pause.
    pub fn resume(&mut self) -> bool {
        if self.snapshot.status != TimerStatus::Paused {
            debug!("Ignoring resume: status={}", self.snapshot.status);
            return false;
        }

        let now = self.clock.now_ms();
        let consumed = self.snapshot.initial_duration - self.snapshot.time_remaining;
        self.snapshot.start_time = Some(now - consumed * 1000);
        self.snapshot.paused_at = None;
        self.snapshot.status = TimerStatus::Running;
        true
    }

    /// Return to idle. The cached `time_remaining` is left as it was.
    pub fn stop(&mut self) -> bool {
        self.snapshot.status = TimerStatus::Idle;
        self.snapshot.start_time = None;
        self.snapshot.paused_at = None;
        true
    }

    /// Return to idle with the full duration restored
    pub fn reset(&mut self) -> bool {
        self.snapshot = TimerSnapshot::loaded(self.snapshot.initial_duration);
        true
    }

    /// Refresh the cached remaining value while running
    pub fn tick(&mut self) -> bool {
        if !self.snapshot.is_running() {
            return false;
        }

        self.snapshot.time_remaining = self.remaining();
        true
    }
}
