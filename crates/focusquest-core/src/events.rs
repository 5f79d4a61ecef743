use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::Achievement;
use crate::timer::TimerMode;

/// Every state change in the system produces an Event.
/// The UI layer turns them into notifications; the timer driver feeds
/// timer events back into the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    XpGained {
        amount: u64,
        reason: String,
        total_xp: u64,
    },
    LevelUp {
        level: u32,
    },
    AchievementUnlocked {
        achievement: Achievement,
    },
    TaskCreated {
        task_id: String,
        title: String,
    },
    TaskUpdated {
        task_id: String,
        title: String,
    },
    TaskCompleted {
        task_id: String,
        title: String,
    },
    TaskReopened {
        task_id: String,
        title: String,
    },
    TaskDeleted {
        task_id: String,
    },
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u32,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u32,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u32,
    },
    /// A work session counted down to zero. `minutes` is the nominal work length.
    WorkSessionCompleted {
        minutes: u32,
        session_count: u32,
        break_minutes: u32,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        at: DateTime<Utc>,
    },
    /// A storage collaborator call failed; `message` is the failure text verbatim.
    PersistenceFailed {
        operation: String,
        message: String,
    },
}
