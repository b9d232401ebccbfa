//! Control context: the only writer of timer and queue state
//!
//! Every applied mutation is persisted to the snapshot store and published
//! as a full snapshot on the sync channel. Rejected operations touch
//! neither transport.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{
    channel::SyncChannel,
    message::SyncMessage,
    store::{self, ContextId, SnapshotStore, QUEUE_KEY, TIMER_KEY},
};
use crate::{
    error::SpeakerError,
    state::{Speaker, SpeakerInput, SpeakerPatch, SpeakerQueue, TimerSnapshot, TimerStatus},
    timer::{Clock, TimerEngine},
};

pub struct Controller {
    id: ContextId,
    engine: TimerEngine,
    queue: SpeakerQueue,
    store: Arc<dyn SnapshotStore>,
    channel: SyncChannel,
}

impl Controller {
    /// Build a controller, restoring timer and queue from the store
    pub fn new(store: Arc<dyn SnapshotStore>, channel: SyncChannel, clock: Arc<dyn Clock>) -> Self {
        let snapshot = store::load_timer_snapshot(store.as_ref());
        let queue = store::load_speaker_queue(store.as_ref());
        let id = ContextId::next();

        info!(
            "Controller {} restored: status={}, duration={}s, {} speakers",
            id,
            snapshot.status,
            snapshot.initial_duration,
            queue.len()
        );

        Self {
            id,
            engine: TimerEngine::from_snapshot(snapshot, clock),
            queue,
            store,
            channel,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    pub fn remaining(&self) -> i64 {
        self.engine.remaining()
    }

    pub fn queue(&self) -> &SpeakerQueue {
        &self.queue
    }

    pub fn current_speaker(&self) -> Option<&Speaker> {
        self.queue.current_speaker()
    }

    pub fn start(&mut self) -> bool {
        let applied = self.engine.start();
        self.after_timer_op("start", applied)
    }

    pub fn pause(&mut self) -> bool {
        let applied = self.engine.pause();
        self.after_timer_op("pause", applied)
    }

    pub fn resume(&mut self) -> bool {
        let applied = self.engine.resume();
        self.after_timer_op("resume", applied)
    }

    pub fn stop(&mut self) -> bool {
        let applied = self.engine.stop();
        self.after_timer_op("stop", applied)
    }

    pub fn reset(&mut self) -> bool {
        let applied = self.engine.reset();
        self.after_timer_op("reset", applied)
    }

    pub fn load_duration(&mut self, duration: i64) -> bool {
        let applied = self.engine.load_duration(duration);
        self.after_timer_op("load", applied)
    }

    /// Refresh the cached remaining time and republish. Runs once per tick
    /// while the timer is running.
    pub fn tick(&mut self) -> bool {
        if !self.engine.tick() {
            return false;
        }
        debug!("Tick: {}s remaining", self.engine.snapshot().time_remaining);
        self.commit_timer();
        true
    }

    pub fn add_speaker(&mut self, input: SpeakerInput) -> Result<Speaker, SpeakerError> {
        let speaker = self.edit_queue(|queue| queue.add(input))?;
        info!("Added speaker '{}' ({}s)", speaker.name, speaker.duration);
        Ok(speaker)
    }

    pub fn edit_speaker(&mut self, id: &str, patch: SpeakerPatch) -> Result<Speaker, SpeakerError> {
        let speaker = self.edit_queue(|queue| queue.edit(id, patch))?;
        info!("Edited speaker '{}'", speaker.id);
        Ok(speaker)
    }

    pub fn delete_speaker(&mut self, id: &str) -> Result<Speaker, SpeakerError> {
        let speaker = self.edit_queue(|queue| queue.delete(id))?;
        info!("Deleted speaker '{}'", speaker.name);
        Ok(speaker)
    }

    pub fn set_current_speaker(&mut self, index: Option<usize>) -> Result<(), SpeakerError> {
        self.edit_queue(|queue| queue.set_current(index))
    }

    pub fn move_speaker(&mut self, from: usize, to: usize) -> Result<(), SpeakerError> {
        self.edit_queue(|queue| queue.move_speaker(from, to))
    }

    /// Stop the timer and advance to the next speaker, loading their
    /// duration
    pub fn load_next_speaker(&mut self) -> Option<Speaker> {
        self.stop();
        let next = self.edit_queue(|queue| Ok::<_, SpeakerError>(queue.load_next().cloned()));
        match next {
            Ok(Some(speaker)) => {
                // A one-speaker queue wraps onto the same speaker; reload anyway
                if self.engine.snapshot() != &TimerSnapshot::loaded(speaker.duration) {
                    self.load_duration(speaker.duration);
                }
                info!("Loaded next speaker '{}'", speaker.name);
                Some(speaker)
            }
            _ => {
                debug!("No speakers queued");
                None
            }
        }
    }

    /// Re-send the current snapshot without mutating anything
    pub fn publish(&self) {
        self.channel.publish(self.status_message());
    }

    pub fn status_message(&self) -> SyncMessage {
        let duration = self.queue.current_speaker().map_or(0, |s| s.duration);
        SyncMessage::status_update(self.engine.snapshot().clone(), duration)
    }

    fn after_timer_op(&mut self, action: &str, applied: bool) -> bool {
        if applied {
            info!(
                "Timer {}: status={}, remaining={}s",
                action,
                self.engine.status(),
                self.engine.remaining()
            );
            self.commit_timer();
        }
        applied
    }

    /// Run a queue edit, persisting the queue on success and reloading the
    /// timer if the active speaker changed while idle
    fn edit_queue<T, F>(&mut self, edit: F) -> Result<T, SpeakerError>
    where
        F: FnOnce(&mut SpeakerQueue) -> Result<T, SpeakerError>,
    {
        let before = self.queue.current_speaker().cloned();
        let result = edit(&mut self.queue)?;
        self.commit_queue();

        let after = self.queue.current_speaker().cloned();
        if before != after {
            match after {
                Some(speaker) if self.engine.status() == TimerStatus::Idle => {
                    self.load_duration(speaker.duration);
                }
                _ => self.publish(),
            }
        }
        Ok(result)
    }

    fn commit_timer(&self) {
        if let Err(e) = store::save(self.store.as_ref(), self.id, TIMER_KEY, self.engine.snapshot()) {
            error!("Failed to persist timer snapshot: {}", e);
        }
        self.publish();
    }

    fn commit_queue(&self) {
        if let Err(e) = store::save(self.store.as_ref(), self.id, QUEUE_KEY, &self.queue) {
            error!("Failed to persist speaker queue: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sync::store::{load_speaker_queue, load_timer_snapshot, MemoryStore},
        timer::ManualClock,
    };

    fn controller() -> (Controller, Arc<MemoryStore>, SyncChannel, ManualClock) {
        let store = Arc::new(MemoryStore::new());
        let channel = SyncChannel::new(16);
        let clock = ManualClock::new(0);
        let controller = Controller::new(store.clone(), channel.clone(), Arc::new(clock.clone()));
        (controller, store, channel, clock)
    }

    fn speaker(name: &str, duration: i64) -> SpeakerInput {
        SpeakerInput {
            name: name.to_string(),
            topic: "topic".to_string(),
            duration,
        }
    }

    #[tokio::test]
    async fn mutations_are_persisted_and_published() {
        let (mut controller, store, channel, clock) = controller();
        let mut rx = channel.subscribe();

        controller.add_speaker(speaker("Ada", 300)).unwrap();
        controller.load_next_speaker();
        assert_eq!(controller.snapshot(), &TimerSnapshot::loaded(300));

        clock.set(1_000);
        assert!(controller.start());
        assert_eq!(load_timer_snapshot(store.as_ref()), *controller.snapshot());

        // Drain until the running snapshot arrives
        loop {
            let SyncMessage::StatusUpdate(update) = rx.recv().await.unwrap();
            if update.snapshot.status == TimerStatus::Running {
                assert_eq!(update.snapshot.start_time, Some(1_000));
                assert_eq!(update.duration, 300);
                break;
            }
        }
    }

    #[tokio::test]
    async fn rejected_operations_are_silent() {
        let (mut controller, _store, channel, _clock) = controller();
        let mut rx = channel.subscribe();

        assert!(!controller.start());
        assert!(!controller.pause());
        assert!(!controller.resume());
        assert!(!controller.tick());

        controller.publish();
        let SyncMessage::StatusUpdate(update) = rx.recv().await.unwrap();
        assert_eq!(update.snapshot, TimerSnapshot::default());
        assert_eq!(update.duration, 0);
    }

    #[test]
    fn selecting_a_speaker_loads_duration_only_while_idle() {
        let (mut controller, _store, _channel, _clock) = controller();
        controller.add_speaker(speaker("a", 120)).unwrap();
        controller.add_speaker(speaker("b", 45)).unwrap();

        controller.set_current_speaker(Some(0)).unwrap();
        assert_eq!(controller.snapshot().initial_duration, 120);

        controller.start();
        controller.set_current_speaker(Some(1)).unwrap();
        assert_eq!(controller.status(), TimerStatus::Running);
        assert_eq!(controller.snapshot().initial_duration, 120);
    }

    #[test]
    fn editing_current_speaker_reloads_duration() {
        let (mut controller, _store, _channel, _clock) = controller();
        let a = controller.add_speaker(speaker("a", 120)).unwrap();
        controller.load_next_speaker();

        controller
            .edit_speaker(
                &a.id,
                SpeakerPatch {
                    duration: Some(200),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(controller.snapshot().initial_duration, 200);
        assert_eq!(controller.snapshot().time_remaining, 200);
    }

    #[test]
    fn load_next_stops_running_timer() {
        let (mut controller, _store, _channel, clock) = controller();
        controller.add_speaker(speaker("a", 60)).unwrap();
        controller.add_speaker(speaker("b", 90)).unwrap();
        controller.load_next_speaker();
        controller.start();
        clock.set(10_000);

        let next = controller.load_next_speaker().unwrap();
        assert_eq!(next.name, "b");
        assert_eq!(controller.snapshot(), &TimerSnapshot::loaded(90));
    }

    #[test]
    fn single_speaker_wrap_restores_full_duration() {
        let (mut controller, _store, _channel, clock) = controller();
        controller.add_speaker(speaker("solo", 30)).unwrap();
        controller.load_next_speaker();
        controller.start();
        clock.set(12_000);

        controller.load_next_speaker();
        assert_eq!(controller.snapshot(), &TimerSnapshot::loaded(30));
    }

    #[test]
    fn invalid_speaker_leaves_queue_untouched() {
        let (mut controller, store, _channel, _clock) = controller();
        assert_eq!(
            controller.add_speaker(speaker("a", 0)),
            Err(SpeakerError::InvalidDuration(0))
        );
        assert!(controller.queue().is_empty());
        assert!(load_speaker_queue(store.as_ref()).is_empty());
    }

    #[test]
    fn restores_running_timer_from_store() {
        let (mut first, store, channel, clock) = controller();
        first.load_duration(100);
        first.start();
        clock.set(40_000);

        let second = Controller::new(store.clone(), channel, Arc::new(clock.clone()));
        assert_eq!(second.status(), TimerStatus::Running);
        assert_eq!(second.remaining(), 60);
        assert_ne!(first.id(), second.id());
    }
}
