//! In-process store.
//!
//! Useful for tests and for running the core without a database. Writes can
//! be made to fail to exercise the persistence-failure paths.

use std::collections::HashMap;

use super::traits::{FocusSession, Store, StoreWrite};
use crate::error::DatabaseError;
use crate::progression::Progression;
use crate::task::Task;

#[derive(Debug, Clone, Default)]
struct Data {
    tasks: Vec<Task>,
    sessions: Vec<FocusSession>,
    progressions: HashMap<String, Progression>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Data,
    failure: Option<String>,
    progression_failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `message` until `recover()`.
    pub fn fail_writes(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Make only progression saves fail, until `recover()`.
    pub fn fail_progression_saves(&mut self, message: impl Into<String>) {
        self.progression_failure = Some(message.into());
    }

    pub fn recover(&mut self) {
        self.failure = None;
        self.progression_failure = None;
    }

    fn write_one(&self, data: &mut Data, write: &StoreWrite<'_>) -> Result<(), DatabaseError> {
        if let Some(ref message) = self.failure {
            return Err(DatabaseError::QueryFailed(message.clone()));
        }
        match *write {
            StoreWrite::CreateTask(task) => {
                if data.tasks.iter().any(|t| t.id == task.id) {
                    return Err(DatabaseError::QueryFailed(format!(
                        "task {} already exists",
                        task.id
                    )));
                }
                data.tasks.push(task.clone());
            }
            StoreWrite::UpdateTask(task) => {
                let slot = data
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == task.id && t.user_id == task.user_id)
                    .ok_or_else(|| {
                        DatabaseError::QueryFailed(format!("task {} does not exist", task.id))
                    })?;
                *slot = task.clone();
            }
            StoreWrite::DeleteTask { user_id, task_id } => {
                data.tasks
                    .retain(|t| !(t.id == task_id && t.user_id == user_id));
            }
            StoreWrite::RecordFocusSession(session) => data.sessions.push(session.clone()),
            StoreWrite::SaveProgression(progression) => {
                if let Some(ref message) = self.progression_failure {
                    return Err(DatabaseError::QueryFailed(message.clone()));
                }
                data.progressions
                    .insert(progression.user_id().to_string(), progression.clone());
            }
        }
        Ok(())
    }
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T: Clone>(items: &[T], key: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut indexed: Vec<(usize, &T)> = items.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| key(b).cmp(&key(a)).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, t)| t.clone()).collect()
}

impl Store for MemoryStore {
    /// Applies the batch to a copy and swaps it in only when every write
    /// succeeded.
    fn apply(&mut self, writes: &[StoreWrite<'_>]) -> Result<(), DatabaseError> {
        let mut staged = self.data.clone();
        for write in writes {
            self.write_one(&mut staged, write)?;
        }
        self.data = staged;
        Ok(())
    }

    fn create_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        self.apply(&[StoreWrite::CreateTask(task)])
    }

    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, DatabaseError> {
        let owned: Vec<Task> = self
            .data
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |t| t.created_at))
    }

    fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        self.apply(&[StoreWrite::UpdateTask(task)])
    }

    fn delete_task(&mut self, user_id: &str, task_id: &str) -> Result<(), DatabaseError> {
        self.apply(&[StoreWrite::DeleteTask { user_id, task_id }])
    }

    fn record_focus_session(&mut self, session: &FocusSession) -> Result<(), DatabaseError> {
        self.apply(&[StoreWrite::RecordFocusSession(session)])
    }

    fn list_focus_sessions(&self, user_id: &str) -> Result<Vec<FocusSession>, DatabaseError> {
        let owned: Vec<FocusSession> = self
            .data
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |s| s.created_at))
    }

    fn load_progression(&self, user_id: &str) -> Result<Option<Progression>, DatabaseError> {
        Ok(self.data.progressions.get(user_id).cloned())
    }

    fn save_progression(&mut self, progression: &Progression) -> Result<(), DatabaseError> {
        self.apply(&[StoreWrite::SaveProgression(progression)])
    }
}
