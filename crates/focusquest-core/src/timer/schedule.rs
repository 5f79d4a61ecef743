use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Break,
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerMode::Work => f.write_str("work"),
            TimerMode::Break => f.write_str("break"),
        }
    }
}

/// Session lengths for the focus cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    /// Every n-th completed work session is followed by a long break.
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    30
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl TimerConfig {
    /// Break length following the `session_count`-th completed work session.
    pub fn break_minutes_after(&self, session_count: u32) -> u32 {
        let every = self.sessions_before_long_break;
        if every > 0 && session_count > 0 && session_count % every == 0 {
            self.long_break_minutes
        } else {
            self.short_break_minutes
        }
    }

    /// Nominal length of `mode` given the number of work sessions done so far.
    pub fn minutes_for(&self, mode: TimerMode, session_count: u32) -> u32 {
        match mode {
            TimerMode::Work => self.work_minutes,
            TimerMode::Break => self.break_minutes_after(session_count),
        }
    }
}

/// Remaining time as minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes, seconds: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    pub fn total_secs(&self) -> u32 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }

    /// Take one second off, borrowing a minute when the seconds run out.
    pub fn decrement(&mut self) {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_lengths_follow_session_count() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.break_minutes_after(1), 5);
        assert_eq!(cfg.break_minutes_after(3), 5);
        assert_eq!(cfg.break_minutes_after(4), 30);
        assert_eq!(cfg.break_minutes_after(8), 30);
    }

    #[test]
    fn countdown_borrows_a_minute() {
        let mut c = Countdown::from_minutes(1);
        c.decrement();
        assert_eq!(c, Countdown { minutes: 0, seconds: 59 });
        assert_eq!(c.to_string(), "00:59");
    }

    #[test]
    fn countdown_stops_at_zero() {
        let mut c = Countdown { minutes: 0, seconds: 1 };
        c.decrement();
        assert!(c.is_zero());
        c.decrement();
        assert!(c.is_zero());
    }
}
