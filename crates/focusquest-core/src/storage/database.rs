//! SQLite-backed store.
//!
//! Provides persistent storage for:
//! - Tasks and focus sessions, scoped by user
//! - One progression record per user
//! - Accounts and the signed-in session (see `accounts.rs`)
//! - Key-value store for application state

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use super::migrations;
use super::traits::{FocusSession, SessionType, Store, StoreWrite};
use crate::error::DatabaseError;
use crate::progression::{Achievement, Progression};
use crate::task::{Task, TaskCategory, TaskPriority};

// === Helper Functions ===

/// Fixed-width RFC3339 so stored timestamps sort lexically.
pub(crate) fn format_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse datetime from RFC3339 string with fallback to current time
pub(crate) fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn corrupt(table: &'static str, message: impl Into<String>) -> DatabaseError {
    DatabaseError::Corrupt {
        table,
        message: message.into(),
    }
}

fn parse_ts(table: &'static str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(table, format!("bad timestamp '{value}': {e}")))
}

fn parse_ts_opt(table: &'static str, value: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_ts(table, &v)).transpose()
}

/// Raw `tasks` row, decoded separately so bad values surface as `Corrupt`.
struct TaskRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    category: String,
    priority: String,
    due_at: Option<String>,
    completed: bool,
    created_at: String,
    completed_at: Option<String>,
}

impl TaskRow {
    fn read(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            priority: row.get(5)?,
            due_at: row.get(6)?,
            completed: row.get(7)?,
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
        })
    }

    fn decode(self) -> Result<Task, DatabaseError> {
        let category = self
            .category
            .parse::<TaskCategory>()
            .map_err(|e| corrupt("tasks", e.to_string()))?;
        let priority = self
            .priority
            .parse::<TaskPriority>()
            .map_err(|e| corrupt("tasks", e.to_string()))?;
        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            category,
            priority,
            due_at: parse_ts_opt("tasks", self.due_at)?,
            completed: self.completed,
            created_at: parse_ts("tasks", &self.created_at)?,
            completed_at: parse_ts_opt("tasks", self.completed_at)?,
        })
    }
}

type SessionRow = (String, String, u32, String, String);

fn decode_session(row: SessionRow) -> Result<FocusSession, DatabaseError> {
    let (id, user_id, duration_minutes, session_type, created_at) = row;
    let session_type = SessionType::parse(&session_type).ok_or_else(|| {
        corrupt("focus_sessions", format!("unknown session type '{session_type}'"))
    })?;
    Ok(FocusSession {
        id,
        user_id,
        duration_minutes,
        session_type,
        created_at: parse_ts("focus_sessions", &created_at)?,
    })
}

const TASK_COLUMNS: &str = "id, user_id, title, description, category, priority, due_at,
                            completed, created_at, completed_at";

// === Writes ===
//
// Shared by the single-call `Store` methods and by `apply`, which runs them
// inside one transaction.

fn insert_task(conn: &Connection, task: &Task) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO tasks (
            id, user_id, title, description, category, priority, due_at,
            completed, created_at, completed_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            task.id,
            task.user_id,
            task.title,
            task.description,
            task.category.as_str(),
            task.priority.as_str(),
            task.due_at.as_ref().map(format_ts),
            task.completed,
            format_ts(&task.created_at),
            task.completed_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(())
}

fn overwrite_task(conn: &Connection, task: &Task) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE tasks
         SET title = ?1, description = ?2, category = ?3, priority = ?4, due_at = ?5,
             completed = ?6, completed_at = ?7
         WHERE id = ?8 AND user_id = ?9",
        params![
            task.title,
            task.description,
            task.category.as_str(),
            task.priority.as_str(),
            task.due_at.as_ref().map(format_ts),
            task.completed,
            task.completed_at.as_ref().map(format_ts),
            task.id,
            task.user_id,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::QueryFailed(format!("task {} does not exist", task.id)));
    }
    Ok(())
}

fn remove_task(conn: &Connection, user_id: &str, task_id: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
        params![task_id, user_id],
    )?;
    Ok(())
}

fn insert_focus_session(conn: &Connection, session: &FocusSession) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO focus_sessions (id, user_id, duration_minutes, session_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.id,
            session.user_id,
            session.duration_minutes,
            session.session_type.as_str(),
            format_ts(&session.created_at),
        ],
    )?;
    Ok(())
}

fn upsert_progression(conn: &Connection, progression: &Progression) -> Result<(), DatabaseError> {
    let ids: Vec<&str> = progression.achievements().iter().map(|a| a.id()).collect();
    let achievements_json =
        serde_json::to_string(&ids).map_err(|e| corrupt("progressions", e.to_string()))?;
    conn.execute(
        "INSERT INTO progressions (
            user_id, total_xp, current_streak, longest_streak, tasks_completed,
            total_focus_minutes, achievements
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
            total_xp = excluded.total_xp,
            current_streak = excluded.current_streak,
            longest_streak = excluded.longest_streak,
            tasks_completed = excluded.tasks_completed,
            total_focus_minutes = excluded.total_focus_minutes,
            achievements = excluded.achievements",
        params![
            progression.user_id(),
            progression.total_xp(),
            progression.current_streak(),
            progression.longest_streak(),
            progression.tasks_completed(),
            progression.total_focus_minutes(),
            achievements_json,
        ],
    )?;
    Ok(())
}

fn write_one(conn: &Connection, write: &StoreWrite<'_>) -> Result<(), DatabaseError> {
    match *write {
        StoreWrite::CreateTask(task) => insert_task(conn, task),
        StoreWrite::UpdateTask(task) => overwrite_task(conn, task),
        StoreWrite::DeleteTask { user_id, task_id } => remove_task(conn, user_id, task_id),
        StoreWrite::RecordFocusSession(session) => insert_focus_session(conn, session),
        StoreWrite::SaveProgression(progression) => upsert_progression(conn, progression),
    }
}

/// SQLite database holding every user's data.
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open the database at `<data_dir>/focusquest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> crate::error::Result<Self> {
        let path = data_dir()?.join("focusquest.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn get_task(&self, user_id: &str, task_id: &str) -> Result<Option<Task>, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND id = ?2");
        self.conn
            .query_row(&sql, params![user_id, task_id], TaskRow::read)
            .optional()?
            .map(TaskRow::decode)
            .transpose()
    }
}

impl Store for SqliteStore {
    fn apply(&mut self, writes: &[StoreWrite<'_>]) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        for write in writes {
            write_one(&tx, write)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn create_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        insert_task(&self.conn, task)
    }

    fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id], TaskRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TaskRow::decode).collect()
    }

    fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        overwrite_task(&self.conn, task)
    }

    fn delete_task(&mut self, user_id: &str, task_id: &str) -> Result<(), DatabaseError> {
        remove_task(&self.conn, user_id, task_id)
    }

    fn record_focus_session(&mut self, session: &FocusSession) -> Result<(), DatabaseError> {
        insert_focus_session(&self.conn, session)
    }

    fn list_focus_sessions(&self, user_id: &str) -> Result<Vec<FocusSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, duration_minutes, session_type, created_at
             FROM focus_sessions WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| -> Result<SessionRow, rusqlite::Error> {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_session).collect()
    }

    fn load_progression(&self, user_id: &str) -> Result<Option<Progression>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT total_xp, current_streak, longest_streak, tasks_completed,
                        total_focus_minutes, achievements
                 FROM progressions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u64>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((xp, streak, longest, completed, focus, achievements_json)) = row else {
            return Ok(None);
        };
        let ids: Vec<String> = serde_json::from_str(&achievements_json)
            .map_err(|e| corrupt("progressions", e.to_string()))?;
        let achievements = ids.iter().filter_map(|id| {
            let found = Achievement::from_id(id);
            if found.is_none() {
                tracing::warn!(achievement = %id, "ignoring unknown achievement id");
            }
            found
        });
        Ok(Some(Progression::restore(
            user_id,
            xp,
            streak,
            longest,
            completed,
            focus,
            achievements,
        )))
    }

    fn save_progression(&mut self, progression: &Progression) -> Result<(), DatabaseError> {
        upsert_progression(&self.conn, progression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::Duration;

    fn make_test_task(user: &str, title: &str) -> Task {
        Task::from_draft(user, TaskDraft::new(title), Utc::now())
    }

    #[test]
    fn create_and_list_newest_first() {
        let mut db = SqliteStore::open_memory().unwrap();
        let mut older = make_test_task("u1", "older");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = make_test_task("u1", "newer");
        db.create_task(&older).unwrap();
        db.create_task(&newer).unwrap();
        db.create_task(&make_test_task("u2", "someone else")).unwrap();

        let tasks = db.list_tasks("u1").unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[test]
    fn update_task_round_trips_completion() {
        let mut db = SqliteStore::open_memory().unwrap();
        let mut task = make_test_task("u1", "finish");
        db.create_task(&task).unwrap();

        task.mark_completed(Utc::now());
        task.priority = TaskPriority::High;
        db.update_task(&task).unwrap();

        let stored = db.get_task("u1", &task.id).unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.completed_at, task.completed_at);
        assert_eq!(stored.priority, TaskPriority::High);
    }

    #[test]
    fn update_missing_task_fails() {
        let mut db = SqliteStore::open_memory().unwrap();
        let task = make_test_task("u1", "ghost");
        assert!(db.update_task(&task).is_err());
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let mut db = SqliteStore::open_memory().unwrap();
        let task = make_test_task("u1", "mine");
        db.create_task(&task).unwrap();
        db.delete_task("u2", &task.id).unwrap();
        assert_eq!(db.list_tasks("u1").unwrap().len(), 1);
        db.delete_task("u1", &task.id).unwrap();
        assert!(db.list_tasks("u1").unwrap().is_empty());
    }

    #[test]
    fn progression_round_trip() {
        let mut db = SqliteStore::open_memory().unwrap();
        assert!(db.load_progression("u1").unwrap().is_none());

        let mut p = Progression::new("u1");
        p.record_task_completion(1);
        p.record_focus_minutes(25, 2);
        db.save_progression(&p).unwrap();
        p.award_xp(5, "again");
        db.save_progression(&p).unwrap();

        let loaded = db.load_progression("u1").unwrap().unwrap();
        assert_eq!(loaded, p);
    }

    #[test]
    fn focus_sessions_listed_per_user() {
        let mut db = SqliteStore::open_memory().unwrap();
        db.record_focus_session(&FocusSession::new("u1", 25, SessionType::Work))
            .unwrap();
        db.record_focus_session(&FocusSession::new("u2", 25, SessionType::Work))
            .unwrap();
        let sessions = db.list_focus_sessions("u1").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 25);
    }

    #[test]
    fn failed_batch_keeps_nothing() {
        let mut db = SqliteStore::open_memory().unwrap();
        let task = make_test_task("u1", "atomic");
        let ghost = make_test_task("u1", "never stored");
        let mut p = Progression::new("u1");
        p.award_xp(5, "created");

        let err = db
            .apply(&[
                StoreWrite::CreateTask(&task),
                StoreWrite::SaveProgression(&p),
                StoreWrite::UpdateTask(&ghost),
            ])
            .unwrap_err();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
        assert!(db.list_tasks("u1").unwrap().is_empty());
        assert!(db.load_progression("u1").unwrap().is_none());

        db.apply(&[StoreWrite::CreateTask(&task), StoreWrite::SaveProgression(&p)])
            .unwrap();
        assert_eq!(db.list_tasks("u1").unwrap().len(), 1);
        assert_eq!(db.load_progression("u1").unwrap().unwrap().total_xp(), 5);
    }

    #[test]
    fn unreadable_priority_is_corrupt() {
        let mut db = SqliteStore::open_memory().unwrap();
        let task = make_test_task("u1", "tampered");
        db.create_task(&task).unwrap();
        db.conn
            .execute("UPDATE tasks SET priority = 'urgent!!' WHERE id = ?1", params![task.id])
            .unwrap();

        let err = db.list_tasks("u1").unwrap_err();
        assert!(matches!(err, DatabaseError::Corrupt { table: "tasks", .. }));
        assert!(db.get_task("u1", &task.id).is_err());
    }

    #[test]
    fn unreadable_session_type_is_corrupt() {
        let mut db = SqliteStore::open_memory().unwrap();
        let session = FocusSession::new("u1", 25, SessionType::Work);
        db.record_focus_session(&session).unwrap();
        db.conn
            .execute(
                "UPDATE focus_sessions SET session_type = 'nap' WHERE id = ?1",
                params![session.id],
            )
            .unwrap();

        let err = db.list_focus_sessions("u1").unwrap_err();
        assert!(matches!(err, DatabaseError::Corrupt { table: "focus_sessions", .. }));
    }

    #[test]
    fn kv_store() {
        let db = SqliteStore::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("hello"));
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
