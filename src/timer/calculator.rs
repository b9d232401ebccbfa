//! Remaining-time derivation
//!
//! The countdown is always recomputed from absolute timestamps rather than
//! decremented per tick, so late or missed ticks never accumulate drift.

use crate::state::{TimerSnapshot, TimerStatus};

/// Seconds remaining for `snapshot` as observed at `now_ms`.
///
/// Idle snapshots return their cached value. Paused snapshots are frozen
/// at `pausedAt`. Running snapshots are measured against `now_ms`. A
/// snapshot missing the timestamp its status needs falls back to the cache.
pub fn remaining(snapshot: &TimerSnapshot, now_ms: i64) -> i64 {
    let Some(start) = snapshot.start_time else {
        return snapshot.time_remaining;
    };

    match snapshot.status {
        TimerStatus::Idle => snapshot.time_remaining,
        TimerStatus::Paused => match snapshot.paused_at {
            Some(paused_at) => snapshot.initial_duration - elapsed_seconds(start, paused_at),
            None => snapshot.time_remaining,
        },
        TimerStatus::Running => snapshot.initial_duration - elapsed_seconds(start, now_ms),
    }
}

/// Whole seconds between two epoch-ms instants, floored toward negative
/// infinity so a clock slightly behind `from` never rounds up.
fn elapsed_seconds(from_ms: i64, to_ms: i64) -> i64 {
    (to_ms - from_ms).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(initial: i64, start: i64) -> TimerSnapshot {
        TimerSnapshot {
            status: TimerStatus::Running,
            initial_duration: initial,
            start_time: Some(start),
            paused_at: None,
            time_remaining: initial,
        }
    }

    #[test]
    fn idle_returns_cached_value() {
        let snapshot = TimerSnapshot {
            time_remaining: 42,
            ..TimerSnapshot::loaded(300)
        };
        assert_eq!(remaining(&snapshot, 9_999_999), 42);
    }

    #[test]
    fn running_counts_whole_elapsed_seconds() {
        let snapshot = running(300, 0);
        assert_eq!(remaining(&snapshot, 0), 300);
        assert_eq!(remaining(&snapshot, 999), 300);
        assert_eq!(remaining(&snapshot, 1_000), 299);
        assert_eq!(remaining(&snapshot, 120_500), 180);
    }

    #[test]
    fn running_goes_negative_without_clamping() {
        let snapshot = running(10, 0);
        assert_eq!(remaining(&snapshot, 15_000), -5);
    }

    #[test]
    fn paused_is_frozen_at_pause_instant() {
        let snapshot = TimerSnapshot {
            status: TimerStatus::Paused,
            initial_duration: 300,
            start_time: Some(0),
            paused_at: Some(120_000),
            time_remaining: 180,
        };
        assert_eq!(remaining(&snapshot, 120_000), 180);
        assert_eq!(remaining(&snapshot, 500_000), 180);
    }

    #[test]
    fn clock_behind_start_floors_downward() {
        let snapshot = running(60, 10_000);
        // -0.5s elapsed floors to -1
        assert_eq!(remaining(&snapshot, 9_500), 61);
    }

    #[test]
    fn running_is_monotonically_non_increasing() {
        let snapshot = running(30, 1_234);
        let mut previous = i64::MAX;
        for now in (0..60_000).step_by(137) {
            let value = remaining(&snapshot, now);
            assert!(value <= previous, "remaining rose at now={now}");
            previous = value;
        }
    }

    #[test]
    fn missing_timestamps_fall_back_to_cache() {
        let snapshot = TimerSnapshot {
            status: TimerStatus::Running,
            start_time: None,
            time_remaining: 7,
            ..TimerSnapshot::loaded(100)
        };
        assert_eq!(remaining(&snapshot, 50_000), 7);

        let paused = TimerSnapshot {
            status: TimerStatus::Paused,
            start_time: Some(0),
            paused_at: None,
            time_remaining: 9,
            ..TimerSnapshot::loaded(100)
        };
        assert_eq!(remaining(&paused, 50_000), 9);
    }
}
