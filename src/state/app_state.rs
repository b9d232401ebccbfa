//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::{Speaker, SpeakerQueue, TimerSnapshot, TimerStatus};
use crate::{
    error::{AppError, SpeakerError},
    sync::{Controller, DisplayView},
};

/// Result of a timer operation as seen by the caller
#[derive(Debug, Clone)]
pub struct TimerReport {
    /// False when the operation was a no-op for the current phase
    pub applied: bool,
    pub snapshot: TimerSnapshot,
    pub remaining: i64,
}

/// Point-in-time view of the controller for status queries
#[derive(Debug, Clone)]
pub struct ControlStatus {
    pub snapshot: TimerSnapshot,
    pub remaining: i64,
    pub current_speaker: Option<Speaker>,
    pub queue_length: usize,
}

/// State shared between the HTTP handlers and background tasks
pub struct AppState {
    /// The control context; every timer and queue mutation goes through it
    controller: Mutex<Controller>,
    /// Timer phase, watched by the tick task
    pub status_tx: watch::Sender<TimerStatus>,
    /// Latest frame from the in-process display mirror
    pub display: watch::Receiver<DisplayView>,
    pub tick_period: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        controller: Controller,
        display: watch::Receiver<DisplayView>,
        port: u16,
        host: String,
        tick_period: Duration,
    ) -> Self {
        let (status_tx, _) = watch::channel(controller.status());

        Self {
            controller: Mutex::new(controller),
            status_tx,
            display,
            tick_period,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    fn lock_controller(&self) -> Result<MutexGuard<'_, Controller>, AppError> {
        self.controller.lock().map_err(|_| AppError::Lock("controller"))
    }

    /// Run a timer operation and notify phase watchers
    pub fn update_timer<F>(&self, action: &str, op: F) -> Result<TimerReport, AppError>
    where
        F: FnOnce(&mut Controller) -> bool,
    {
        let mut controller = self.lock_controller()?;
        let applied = op(&mut controller);
        let report = TimerReport {
            applied,
            snapshot: controller.snapshot().clone(),
            remaining: controller.remaining(),
        };
        // Published under the lock so watchers see phases in commit order
        self.notify_status(report.snapshot.status);
        drop(controller);

        if applied {
            self.record_action(action);
        }
        Ok(report)
    }

    /// Run a speaker queue edit. Queue edits can reload or stop the timer,
    /// so phase watchers are notified here too.
    pub fn update_queue<T, F>(&self, action: &str, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Controller) -> Result<T, SpeakerError>,
    {
        let mut controller = self.lock_controller()?;
        let result = op(&mut controller);
        self.notify_status(controller.status());
        drop(controller);

        let value = result?;
        self.record_action(action);
        Ok(value)
    }

    /// Advance the running countdown by one tick
    pub fn tick(&self) -> Result<bool, AppError> {
        Ok(self.lock_controller()?.tick())
    }

    pub fn get_queue(&self) -> Result<SpeakerQueue, AppError> {
        Ok(self.lock_controller()?.queue().clone())
    }

    pub fn get_status(&self) -> Result<ControlStatus, AppError> {
        let controller = self.lock_controller()?;
        Ok(ControlStatus {
            snapshot: controller.snapshot().clone(),
            remaining: controller.remaining(),
            current_speaker: controller.current_speaker().cloned(),
            queue_length: controller.queue().len(),
        })
    }

    fn notify_status(&self, status: TimerStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            debug!("Timer status changed to {}", status);
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
