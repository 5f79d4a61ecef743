//! User-facing notifications.
//!
//! Events are turned into short notices and queued in the order they were
//! produced. The UI layer drains the queue; nothing is acknowledged back.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    Info,
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub style: NotificationStyle,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        style: NotificationStyle,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            style,
        }
    }

    /// Notice shown for an event, if the event is user-visible.
    pub fn for_event(event: &Event) -> Option<Self> {
        use NotificationStyle::*;
        let n = match event {
            Event::XpGained { amount, reason, .. } => {
                Notification::new(format!("+{amount} XP"), reason.clone(), Success)
            }
            Event::LevelUp { level } => Notification::new(
                "Level up!",
                format!("You reached level {level}"),
                Success,
            ),
            Event::AchievementUnlocked { achievement } => Notification::new(
                format!("{} Achievement unlocked", achievement.icon()),
                format!("{}: {}", achievement.name(), achievement.description()),
                Success,
            ),
            Event::TaskCreated { title, .. } => {
                Notification::new("Task created", title.clone(), Info)
            }
            Event::TaskUpdated { title, .. } => {
                Notification::new("Task updated", title.clone(), Info)
            }
            Event::TaskCompleted { title, .. } => {
                Notification::new("Task completed", title.clone(), Success)
            }
            Event::TaskDeleted { .. } => {
                Notification::new("Task deleted", "The task was removed", Info)
            }
            Event::WorkSessionCompleted { break_minutes, .. } => Notification::new(
                "Focus session complete",
                format!("Time for a {break_minutes}-minute break"),
                Success,
            ),
            Event::BreakCompleted { .. } => {
                Notification::new("Break over", "Ready for the next focus session?", Info)
            }
            Event::PersistenceFailed { operation, message } => Notification::new(
                format!("Could not {operation}"),
                message.clone(),
                Destructive,
            ),
            Event::TaskReopened { .. }
            | Event::TimerStarted { .. }
            | Event::TimerPaused { .. }
            | Event::TimerReset { .. } => return None,
        };
        Some(n)
    }
}

/// FIFO of pending notifications.
#[derive(Debug)]
pub struct NotificationQueue {
    pending: VecDeque<Notification>,
    enabled: bool,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            enabled: true,
        }
    }

    /// A queue that accepts pushes but never holds anything.
    pub fn disabled() -> Self {
        Self {
            pending: VecDeque::new(),
            enabled: false,
        }
    }

    pub fn push(&mut self, notification: Notification) {
        if self.enabled {
            self.pending.push_back(notification);
        }
    }

    pub fn push_event(&mut self, event: &Event) {
        if let Some(n) = Notification::for_event(event) {
            self.push(n);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }
}
