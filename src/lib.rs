//! Speaker Timer - a presentation countdown kept in sync across contexts
//!
//! One control context owns the timer state machine and the speaker queue.
//! Any number of display contexts mirror it read-only, fed by an in-process
//! broadcast channel and by change notifications from a snapshot store.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod sync;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::{create_display_router, create_router};
pub use config::{Config, Mode};
pub use state::AppState;
pub use sync::{Controller, DisplayContext, FileStore, MemoryStore, SnapshotStore, SyncChannel};
pub use timer::{Clock, SystemClock, TimerEngine};
pub use utils::signals::shutdown_signal;
