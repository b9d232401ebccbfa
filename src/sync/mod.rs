//! Cross-context synchronization
//!
//! The controller publishes full snapshots over two redundant transports:
//! the in-process [`SyncChannel`] and a [`SnapshotStore`] whose change
//! notifications also reach other processes. Displays apply whichever
//! arrives, in any order.

pub mod channel;
pub mod controller;
pub mod display;
pub mod file_store;
pub mod message;
pub mod store;

pub use channel::{SyncChannel, SyncReceiver};
pub use controller::Controller;
pub use display::{DisplayContext, DisplayMirror, DisplayView};
pub use file_store::FileStore;
pub use message::{StatusUpdate, SyncMessage};
pub use store::{ContextId, MemoryStore, SnapshotStore, StoreChange, StoreWatcher};
