use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::progression::Progression;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Work,
    Break,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Break => "break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(SessionType::Work),
            "break" => Some(SessionType::Break),
            _ => None,
        }
    }
}

/// A finished timer interval. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub user_id: String,
    pub duration_minutes: u32,
    pub session_type: SessionType,
    pub created_at: DateTime<Utc>,
}

impl FocusSession {
    pub fn new(user_id: impl Into<String>, duration_minutes: u32, session_type: SessionType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            duration_minutes,
            session_type,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

impl FocusStats {
    pub fn from_sessions(sessions: &[FocusSession], now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&Local).date_naive();
        let mut stats = FocusStats::default();
        for s in sessions.iter().filter(|s| s.session_type == SessionType::Work) {
            let minutes = u64::from(s.duration_minutes);
            stats.total_sessions += 1;
            stats.total_focus_min += minutes;
            if s.created_at.with_timezone(&Local).date_naive() == today {
                stats.today_sessions += 1;
                stats.today_focus_min += minutes;
            }
        }
        stats
    }
}

/// One write in an all-or-nothing batch, see [`Store::apply`].
#[derive(Debug, Clone, Copy)]
pub enum StoreWrite<'a> {
    CreateTask(&'a Task),
    UpdateTask(&'a Task),
    DeleteTask { user_id: &'a str, task_id: &'a str },
    RecordFocusSession(&'a FocusSession),
    SaveProgression(&'a Progression),
}

/// Persistence collaborator for tasks, focus sessions and progression
/// records. Every call is scoped to one user; lists come back newest first.
pub trait Store {
    /// Perform `writes` in order as a single unit. When any write fails,
    /// none of them are kept.
    fn apply(&mut self, writes: &[StoreWrite<'_>]) -> Result<(), DatabaseError>;

    fn create_task(&mut self, task: &Task) -> Result<(), DatabaseError>;

    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, DatabaseError>;

    /// Overwrite an existing task. Fails if the task does not exist.
    fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError>;

    fn delete_task(&mut self, user_id: &str, task_id: &str) -> Result<(), DatabaseError>;

    fn record_focus_session(&mut self, session: &FocusSession) -> Result<(), DatabaseError>;

    fn list_focus_sessions(&self, user_id: &str) -> Result<Vec<FocusSession>, DatabaseError>;

    fn load_progression(&self, user_id: &str) -> Result<Option<Progression>, DatabaseError>;

    fn save_progression(&mut self, progression: &Progression) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn focus_stats_ignore_breaks_and_split_today() {
        let now = Utc::now();
        let mut old = FocusSession::new("u", 25, SessionType::Work);
        old.created_at = now - Duration::days(3);
        let sessions = vec![
            FocusSession::new("u", 25, SessionType::Work),
            FocusSession::new("u", 5, SessionType::Break),
            old,
        ];
        let stats = FocusStats::from_sessions(&sessions, now);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_focus_min, 50);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.today_focus_min, 25);
    }

    #[test]
    fn session_type_parse_rejects_unknown() {
        assert_eq!(SessionType::parse("work"), Some(SessionType::Work));
        assert_eq!(SessionType::parse("break"), Some(SessionType::Break));
        assert_eq!(SessionType::parse("nap"), None);
    }
}
