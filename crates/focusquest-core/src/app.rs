//! Task lifecycle orchestration.
//!
//! [`App`] is the single mutation entry point for one signed-in user. Task
//! operations go to the [`Store`] first; local state only changes once the
//! store has accepted the write. A task or session write that also moves the
//! progression record is sent as one [`StoreWrite`] batch, so either both
//! land or neither does. Completing a task feeds the progression rules
//! synchronously with the up-to-date task list, and every produced event is
//! queued for display in order.

use chrono::{DateTime, Local, Utc};

use crate::error::{CoreError, DatabaseError, Result};
use crate::events::Event;
use crate::notify::{Notification, NotificationQueue};
use crate::progression::{Progression, XpRules};
use crate::storage::{FocusSession, FocusStats, SessionType, Store, StoreWrite};
use crate::task::{Task, TaskDraft, TaskFilter, TaskPatch, TaskStats};

pub struct App<S: Store> {
    store: S,
    user_id: String,
    /// Newest first, mirroring the store's ordering.
    tasks: Vec<Task>,
    progression: Progression,
    rules: XpRules,
    notifications: NotificationQueue,
    events: Vec<Event>,
}

impl<S: Store> App<S> {
    /// Load the user's tasks and progression record.
    ///
    /// A user without a stored record starts from a fresh one.
    pub fn load(store: S, user_id: impl Into<String>, rules: XpRules) -> Result<Self> {
        let user_id = user_id.into();
        let progression = store
            .load_progression(&user_id)?
            .unwrap_or_else(|| Progression::new(user_id.clone()));
        let tasks = store.list_tasks(&user_id)?;
        tracing::debug!(user = %user_id, tasks = tasks.len(), "app loaded");
        Ok(Self {
            store,
            user_id,
            tasks,
            progression,
            rules,
            notifications: NotificationQueue::new(),
            events: Vec::new(),
        })
    }

    pub fn with_notifications(mut self, queue: NotificationQueue) -> Self {
        self.notifications = queue;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tasks_by(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Tasks completed on the current local calendar day.
    pub fn completed_today(&self) -> usize {
        let today = Local::now().date_naive();
        self.tasks.iter().filter(|t| t.completed_on(today)).count()
    }

    pub fn task_stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks, Utc::now())
    }

    pub fn focus_stats(&self) -> Result<FocusStats> {
        let sessions = self.store.list_focus_sessions(&self.user_id)?;
        Ok(FocusStats::from_sessions(&sessions, Utc::now()))
    }

    /// Take the queued notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    /// Take the raw events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Task operations ──────────────────────────────────────────────

    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;
        let task = Task::from_draft(self.user_id.clone(), draft, Utc::now());

        if self.rules.task_created == 0 {
            self.persist("create task", |store| store.create_task(&task))?;
            self.created_locally(&task);
            return Ok(task);
        }

        let mut next = self.progression.clone();
        let events = next.award_xp(self.rules.task_created, &format!("Created \"{}\"", task.title));
        self.persist("create task", |store| {
            store.apply(&[StoreWrite::CreateTask(&task), StoreWrite::SaveProgression(&next)])
        })?;
        self.created_locally(&task);
        self.commit_progression(next, events);
        Ok(task)
    }

    /// Edit title, description, category, priority or due date.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task> {
        patch.validate()?;
        let mut updated = self.find_task(id)?.clone();
        updated.apply(patch);
        self.persist("update task", |store| store.update_task(&updated))?;

        self.replace_local(updated.clone());
        self.emit(Event::TaskUpdated {
            task_id: updated.id.clone(),
            title: updated.title.clone(),
        });
        Ok(updated)
    }

    /// Flip the completion state of a task.
    pub fn toggle_task(&mut self, id: &str) -> Result<Task> {
        let completed = self.find_task(id)?.completed;
        self.set_completed(id, !completed)
    }

    /// Mark a task complete or incomplete. Setting the current state again
    /// is a no-op.
    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<Task> {
        self.set_completed_at(id, completed, Utc::now())
    }

    pub(crate) fn set_completed_at(
        &mut self,
        id: &str,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let current = self.find_task(id)?;
        if current.completed == completed {
            return Ok(current.clone());
        }

        let mut updated = current.clone();
        if !completed {
            updated.reopen();
            self.persist("update task", |store| store.update_task(&updated))?;
            self.replace_local(updated.clone());
            self.emit(Event::TaskReopened {
                task_id: updated.id.clone(),
                title: updated.title.clone(),
            });
            return Ok(updated);
        }

        updated.mark_completed(now);
        // Notices go out as: XP, completion, then achievements.
        let mut next = self.progression.clone();
        let mut events = Vec::new();
        let xp = self.rules.for_completion(updated.priority);
        if xp > 0 {
            events.extend(next.award_xp(xp, &format!("Completed \"{}\"", updated.title)));
        }
        events.push(Event::TaskCompleted {
            task_id: updated.id.clone(),
            title: updated.title.clone(),
        });
        let today = now.with_timezone(&Local).date_naive();
        let completed_today = self
            .tasks
            .iter()
            .filter(|t| t.id != updated.id && t.completed_on(today))
            .count()
            + usize::from(updated.completed_on(today));
        events.extend(next.record_task_completion(completed_today));

        self.persist("update task", |store| {
            store.apply(&[StoreWrite::UpdateTask(&updated), StoreWrite::SaveProgression(&next)])
        })?;
        tracing::info!(task = %updated.id, priority = %updated.priority, "task completed");
        self.replace_local(updated.clone());
        self.commit_progression(next, events);
        Ok(updated)
    }

    /// Remove a task. Progression is not affected.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let task_id = self.find_task(id)?.id.clone();
        let user_id = self.user_id.clone();
        self.persist("delete task", |store| store.delete_task(&user_id, &task_id))?;

        self.tasks.retain(|t| t.id != task_id);
        tracing::info!(task = %task_id, "task deleted");
        self.emit(Event::TaskDeleted { task_id });
        Ok(())
    }

    // ── Focus sessions ───────────────────────────────────────────────

    /// Store a finished work session and credit its minutes.
    pub fn record_focus_session(&mut self, minutes: u32) -> Result<FocusSession> {
        let session = FocusSession::new(self.user_id.clone(), minutes, SessionType::Work);
        let mut next = self.progression.clone();
        let events = next.record_focus_minutes(minutes, self.rules.focus_minute);
        self.persist("save focus session", |store| {
            store.apply(&[
                StoreWrite::RecordFocusSession(&session),
                StoreWrite::SaveProgression(&next),
            ])
        })?;
        self.commit_progression(next, events);
        Ok(session)
    }

    /// Feed a timer event into the app. Only finished work sessions have an
    /// effect on stored state; other events are just queued for display.
    pub fn handle_timer_event(&mut self, event: Event) -> Result<()> {
        let minutes = match event {
            Event::WorkSessionCompleted { minutes, .. } => Some(minutes),
            _ => None,
        };
        self.emit(event);
        match minutes {
            Some(minutes) if minutes > 0 => self.record_focus_session(minutes).map(|_| ()),
            _ => Ok(()),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn find_task(&self, id: &str) -> Result<&Task> {
        self.task(id).ok_or_else(|| CoreError::NotFound {
            entity: "task",
            id: id.to_string(),
        })
    }

    fn created_locally(&mut self, task: &Task) {
        tracing::info!(task = %task.id, "task created");
        self.tasks.insert(0, task.clone());
        self.emit(Event::TaskCreated {
            task_id: task.id.clone(),
            title: task.title.clone(),
        });
    }

    fn replace_local(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn emit(&mut self, event: Event) {
        self.notifications.push_event(&event);
        self.events.push(event);
    }

    /// Run a store write; on failure queue a notice with the message verbatim.
    fn persist<F>(&mut self, operation: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut S) -> Result<(), DatabaseError>,
    {
        match write(&mut self.store) {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = CoreError::from(e);
                tracing::warn!(operation, "persistence failed: {err}");
                self.emit(Event::PersistenceFailed {
                    operation: operation.to_string(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Make an already stored `next` current and publish `events`.
    fn commit_progression(&mut self, next: Progression, events: Vec<Event>) {
        self.progression = next;
        for event in events {
            self.emit(event);
        }
    }
}
