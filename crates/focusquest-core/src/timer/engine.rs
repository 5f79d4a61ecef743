//! Focus timer implementation.
//!
//! A countdown state machine advanced one second per `tick()`. It does not
//! use internal threads - the caller is responsible for ticking it once per
//! wall-clock second, or for calling `catch_up()` with the current time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Running        (toggle / start / pause)
//! Work --zero--> Break    (reports work minutes, stops)
//! Break --zero--> Work    (stops)
//! ```
//!
//! Pausing keeps the remaining time; only `reset()` and a completed
//! countdown restore it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::schedule::{Countdown, TimerConfig, TimerMode};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
}

/// Pomodoro-style focus timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    config: TimerConfig,
    state: TimerState,
    mode: TimerMode,
    remaining: Countdown,
    /// Completed work sessions.
    session_count: u32,
    /// Wall-clock time (ms since epoch) up to which ticks have been applied.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl FocusTimer {
    /// Idle timer in work mode with a full work session ready.
    pub fn new(config: TimerConfig) -> Self {
        let remaining = Countdown::from_minutes(config.work_minutes);
        Self {
            config,
            state: TimerState::Idle,
            mode: TimerMode::Work,
            remaining,
            session_count: 0,
            last_tick_epoch_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining(&self) -> Countdown {
        self.remaining
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// Full length of the current mode in seconds.
    pub fn nominal_secs(&self) -> u32 {
        self.config
            .minutes_for(self.mode, self.session_count)
            .saturating_mul(60)
    }

    /// 0.0 .. 1.0 progress within the current session or break.
    pub fn progress(&self) -> f64 {
        let total = self.nominal_secs();
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.remaining.total_secs());
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            mode: self.mode,
            remaining: self.remaining.to_string(),
            remaining_secs: self.remaining.total_secs(),
            progress: self.progress(),
            session_count: self.session_count,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    /// Start with an explicit wall-clock reference for `catch_up`.
    pub fn start_at(&mut self, now_epoch_ms: u64) -> Option<Event> {
        if self.state == TimerState::Running {
            return None;
        }
        self.state = TimerState::Running;
        self.last_tick_epoch_ms = Some(now_epoch_ms);
        tracing::debug!(mode = %self.mode, remaining = %self.remaining, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining.total_secs(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Idle;
        self.last_tick_epoch_ms = None;
        tracing::debug!(mode = %self.mode, remaining = %self.remaining, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.remaining.total_secs(),
        })
    }

    /// Flip between running and paused without touching the remaining time.
    pub fn toggle(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Idle => self.start(),
        }
    }

    /// Stop and restore the full length of the current mode.
    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.last_tick_epoch_ms = None;
        self.remaining =
            Countdown::from_minutes(self.config.minutes_for(self.mode, self.session_count));
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining.total_secs(),
        }
    }

    /// Replace the session lengths and reset the current mode.
    pub fn set_config(&mut self, config: TimerConfig) {
        self.config = config;
        self.reset();
    }

    /// Advance one second. Returns the completion event when the countdown
    /// reaches zero; the timer is idle afterwards.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining.decrement();
        if self.remaining.is_zero() {
            return Some(self.complete());
        }
        None
    }

    /// Apply every whole second elapsed since the last applied tick.
    ///
    /// Stops at the first completion; the remaining seconds are dropped
    /// because the timer is no longer running.
    pub fn catch_up(&mut self, now_epoch_ms: u64) -> Option<Event> {
        let last = match (self.state, self.last_tick_epoch_ms) {
            (TimerState::Running, Some(last)) => last,
            _ => return None,
        };
        let elapsed_secs = now_epoch_ms.saturating_sub(last) / 1000;
        for applied in 1..=elapsed_secs {
            if let Some(event) = self.tick() {
                return Some(event);
            }
            self.last_tick_epoch_ms = Some(last + applied * 1000);
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.last_tick_epoch_ms = None;
        match self.mode {
            TimerMode::Work => {
                self.session_count = self.session_count.saturating_add(1);
                let break_minutes = self.config.break_minutes_after(self.session_count);
                self.mode = TimerMode::Break;
                self.remaining = Countdown::from_minutes(break_minutes);
                tracing::info!(
                    sessions = self.session_count,
                    break_minutes,
                    "work session completed"
                );
                Event::WorkSessionCompleted {
                    minutes: self.config.work_minutes,
                    session_count: self.session_count,
                    break_minutes,
                    at: Utc::now(),
                }
            }
            TimerMode::Break => {
                self.mode = TimerMode::Work;
                self.remaining = Countdown::from_minutes(self.config.work_minutes);
                tracing::info!("break completed");
                Event::BreakCompleted { at: Utc::now() }
            }
        }
    }
}

/// Serializable view of the timer for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub mode: TimerMode,
    /// `MM:SS`
    pub remaining: String,
    pub remaining_secs: u32,
    pub progress: f64,
    pub session_count: u32,
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
