//! Directory-backed snapshot store
//!
//! Each key lives in `<dir>/<key>.json`. Writes go through a temp file and a
//! rename so readers never see a torn record. A `notify` watcher on the
//! directory turns writes made by other processes into store changes, which
//! is what lets a display in a separate window follow the controller.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::store::{ChangeFeed, ContextId, SnapshotStore, StoreChange};
use crate::error::StoreError;

/// Last content this instance wrote or observed, per key
type KnownContent = Arc<Mutex<HashMap<String, String>>>;

pub struct FileStore {
    dir: PathBuf,
    known: KnownContent,
    feed: Arc<ChangeFeed>,
    _watcher: RecommendedWatcher,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir` and start watching it
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(StoreError::CreateDir)?;

        let known: KnownContent = Arc::new(Mutex::new(HashMap::new()));
        let feed = Arc::new(ChangeFeed::new());

        let mut watcher = {
            let known = Arc::clone(&known);
            let feed = Arc::clone(&feed);
            RecommendedWatcher::new(
                move |res: notify::Result<Event>| match res {
                    Ok(event) => handle_event(event, &known, &feed),
                    Err(e) => warn!("Store watch error: {}", e),
                },
                Config::default(),
            )?
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        info!("Watching snapshot store at {}", dir.display());
        Ok(Self {
            dir,
            known,
            feed,
            _watcher: watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_atomic(&self, key: &str, value: &str) -> io::Result<()> {
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path_for(key))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, writer: ContextId, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut known = self.known.lock().map_err(|_| StoreError::Poisoned)?;
            if known.get(key).map(String::as_str) == Some(value) {
                return Ok(());
            }
            // Recorded before the rename so our own file event is recognized
            let previous = known.insert(key.to_string(), value.to_string());

            if let Err(source) = self.write_atomic(key, value) {
                match previous {
                    Some(previous) => known.insert(key.to_string(), previous),
                    None => known.remove(key),
                };
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        }

        self.feed.emit(writer, key, value);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}

/// Map `<dir>/<key>.json` back to `key`, ignoring temp files
fn key_for_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    name.strip_suffix(".json").map(str::to_string)
}

fn handle_event(event: Event, known: &KnownContent, feed: &ChangeFeed) {
    if matches!(event.kind, EventKind::Access(_) | EventKind::Remove(_)) {
        return;
    }

    for path in event.paths {
        let Some(key) = key_for_path(&path) else {
            continue;
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => continue,
            Err(e) => {
                debug!("Skipping unreadable store file {}: {}", path.display(), e);
                continue;
            }
        };

        let Ok(mut known) = known.lock() else {
            warn!("Store content map poisoned, dropping change for '{}'", key);
            return;
        };
        if known.get(&key) == Some(&content) {
            continue;
        }
        known.insert(key.clone(), content.clone());
        drop(known);

        feed.emit(ContextId::EXTERNAL, &key, &content);
    }
}
