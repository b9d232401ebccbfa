//! State management module
//!
//! Timer snapshot and speaker queue records, plus the shared application
//! state handed to the HTTP layer and background tasks.

pub mod app_state;
pub mod speaker_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use speaker_state::{Speaker, SpeakerInput, SpeakerPatch, SpeakerQueue};
pub use timer_state::{TimerSnapshot, TimerStatus};
