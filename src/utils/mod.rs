//! Utility functions module
//!
//! Countdown formatting and shutdown signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::{format_duration, format_time};
pub use signals::shutdown_signal;
