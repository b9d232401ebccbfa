//! Controller tick background task

use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, TimerStatus};

/// Background task that ticks the controller while the timer runs.
///
/// The interval only exists while the status is `running`; any transition
/// out of running drops it, and re-entering running registers a fresh one.
pub async fn timer_tick_task(state: Arc<AppState>) {
    info!("Starting timer tick task");

    let mut status_rx = state.status_tx.subscribe();
    let period = state.tick_period;

    loop {
        let status = *status_rx.borrow_and_update();

        if status == TimerStatus::Running {
            debug!("Timer running, registering {:?} tick", period);
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = state.tick() {
                            error!("Failed to tick timer: {}", e);
                        }
                    }

                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            info!("Status channel closed, stopping tick task");
                            return;
                        }
                        // Status only changes on a transition, so even a
                        // running value here means the timer left running
                        // in between. Drop this interval either way.
                        debug!("Timer status changed, cancelling tick");
                        break;
                    }
                }
            }
        } else if status_rx.changed().await.is_err() {
            info!("Status channel closed, stopping tick task");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        sync::{Controller, DisplayContext, MemoryStore, SnapshotStore, SyncChannel},
        timer::ManualClock,
    };

    const PERIOD: Duration = Duration::from_millis(1000);

    fn cached_remaining(state: &AppState) -> i64 {
        state.get_status().unwrap().snapshot.time_remaining
    }

    #[tokio::test]
    async fn re_entering_running_registers_a_fresh_interval() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(0);
        let (_display, view) = DisplayContext::new(store.as_ref(), None, Arc::new(clock.clone()), PERIOD);
        let mut controller = Controller::new(store, SyncChannel::new(8), Arc::new(clock.clone()));
        controller.load_duration(60);
        let state = Arc::new(AppState::new(controller, view, 0, "127.0.0.1".to_string(), PERIOD));

        tokio::spawn(timer_tick_task(Arc::clone(&state)));
        state.update_timer("start", Controller::start).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        // Pause and resume with no await in between: the task only sees the
        // final running status
        clock.set(10_000);
        state.update_timer("pause", Controller::pause).unwrap();
        state.update_timer("resume", Controller::resume).unwrap();
        assert_eq!(cached_remaining(&state), 50);
        clock.set(20_000);

        // The first interval would have fired at ~1000ms; the fresh one is
        // due at ~1600ms
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(cached_remaining(&state), 50);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(cached_remaining(&state), 40);
    }
}
