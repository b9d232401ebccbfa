//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod display_sync;
pub mod timer_tick;

// Re-export main functions
pub use display_sync::display_sync_task;
pub use timer_tick::timer_tick_task;
