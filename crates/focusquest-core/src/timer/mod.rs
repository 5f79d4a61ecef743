mod engine;
mod schedule;

pub use engine::{now_ms, FocusTimer, TimerSnapshot, TimerState};
pub use schedule::{Countdown, TimerConfig, TimerMode};
