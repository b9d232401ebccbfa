//! Countdown arithmetic and the timer state machine

pub mod calculator;
pub mod clock;
pub mod engine;

pub use calculator::remaining;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::TimerEngine;
