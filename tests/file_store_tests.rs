use std::{fs, sync::Arc, time::Duration};

use speaker_timer::{
    state::{TimerSnapshot, TimerStatus},
    sync::{
        store::{load_timer_snapshot, QUEUE_KEY, TIMER_KEY},
        ContextId, Controller, DisplayContext, FileStore, SnapshotStore, SyncChannel,
    },
    tasks::display_sync_task,
    timer::ManualClock,
};
use tempfile::tempdir;
use tokio::time::timeout;

#[test]
fn test_write_then_read() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    assert_eq!(store.read(TIMER_KEY).unwrap(), None);
    store.write(ContextId::next(), TIMER_KEY, "{\"a\":1}").unwrap();
    assert_eq!(store.read(TIMER_KEY).unwrap().as_deref(), Some("{\"a\":1}"));

    let on_disk = fs::read_to_string(dir.path().join("timer-snapshot.json")).unwrap();
    assert_eq!(on_disk, "{\"a\":1}");
    assert!(!dir.path().join(".timer-snapshot.json.tmp").exists());
}

#[test]
fn test_open_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.dir(), nested.as_path());
}

#[test]
fn test_corrupt_file_recovers_to_idle() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("timer-snapshot.json"), "{\"status\": 12").unwrap();

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(load_timer_snapshot(&store), TimerSnapshot::default());
}

#[test]
fn test_controller_restores_from_disk() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(0);

    {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let mut controller = Controller::new(store, SyncChannel::new(4), Arc::new(clock.clone()));
        controller.load_duration(120);
        controller.start();
        clock.set(30_000);
        controller.pause();
    }

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let controller = Controller::new(store, SyncChannel::new(4), Arc::new(clock.clone()));
    assert_eq!(controller.status(), TimerStatus::Paused);
    assert_eq!(controller.remaining(), 90);
}

#[tokio::test]
async fn test_writes_from_another_instance_are_observed() {
    let dir = tempdir().unwrap();
    let observer = FileStore::open(dir.path()).unwrap();
    let writer = FileStore::open(dir.path()).unwrap();

    let me = ContextId::next();
    let mut changes = observer.watch(me);

    writer.write(ContextId::next(), QUEUE_KEY, "{\"speakers\":[],\"currentIndex\":null}").unwrap();

    let change = timeout(Duration::from_secs(5), changes.next())
        .await
        .expect("no notification from file watcher")
        .expect("store closed");
    assert_eq!(change.key, QUEUE_KEY);
    assert_eq!(change.writer, ContextId::EXTERNAL);
    assert!(change.value.contains("currentIndex"));
}

#[tokio::test]
async fn test_own_writes_are_not_echoed() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let me = ContextId::next();
    let mut changes = store.watch(me);

    store.write(me, TIMER_KEY, "{\"first\":true}").unwrap();

    // Give the watcher time to see our rename
    let echoed = timeout(Duration::from_millis(500), changes.next()).await;
    assert!(echoed.is_err(), "own write was reported back: {:?}", echoed);
}

#[tokio::test]
async fn test_display_in_separate_store_instance_follows_controller() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(0);

    // Separate instances stand in for separate processes sharing a directory
    let display_store = FileStore::open(dir.path()).unwrap();
    let (context, mut view) = DisplayContext::new(
        &display_store,
        None,
        Arc::new(clock.clone()),
        Duration::from_millis(10),
    );
    tokio::spawn(display_sync_task(context));

    let controller_store = Arc::new(FileStore::open(dir.path()).unwrap());
    let mut controller = Controller::new(controller_store, SyncChannel::new(4), Arc::new(clock.clone()));
    controller.load_duration(240);
    controller.start();
    clock.set(60_000);

    let frame = timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = view.borrow_and_update();
                if current.status == TimerStatus::Running && current.remaining == 180 {
                    return current.clone();
                }
            }
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("display never saw the running timer");

    assert_eq!(frame.formatted, "3:00");
    drop(display_store);
}
