//! Task management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use focusquest_core::{Config, TaskCategory, TaskDraft, TaskFilter, TaskPatch, TaskPriority};

use super::{flush_notifications, load_app, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// work, study, personal or urgent
        #[arg(long, default_value = "personal")]
        category: TaskCategory,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        /// Due date (RFC 3339, e.g. 2026-03-01T17:00:00Z)
        #[arg(long)]
        due: Option<DateTime<Utc>>,
    },
    /// List tasks, newest first
    List {
        #[arg(long)]
        category: Option<TaskCategory>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        /// Only incomplete tasks
        #[arg(long)]
        pending: bool,
    },
    /// Edit a task
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        category: Option<TaskCategory>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Mark a task incomplete
    Reopen {
        /// Task ID
        id: String,
    },
    /// Flip completion state
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let config = Config::load()?;
    let mut app = load_app(&config)?;

    let result = match action {
        TaskAction::Create {
            title,
            description,
            category,
            priority,
            due,
        } => {
            let mut draft = TaskDraft::new(title).category(category).priority(priority);
            if let Some(description) = description {
                draft = draft.description(description);
            }
            if let Some(due) = due {
                draft = draft.due_at(due);
            }
            app.create_task(draft).map(Some)
        }
        TaskAction::List {
            category,
            priority,
            completed,
            pending,
        } => {
            let filter = TaskFilter {
                category,
                priority,
                completed: match (completed, pending) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            print_json(&app.tasks_by(&filter))?;
            return Ok(());
        }
        TaskAction::Update {
            id,
            title,
            description,
            clear_description,
            category,
            priority,
            due,
            clear_due,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                category,
                priority,
                due_at: if clear_due { Some(None) } else { due.map(Some) },
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            app.update_task(&id, &patch).map(Some)
        }
        TaskAction::Complete { id } => app.set_completed(&id, true).map(Some),
        TaskAction::Reopen { id } => app.set_completed(&id, false).map(Some),
        TaskAction::Toggle { id } => app.toggle_task(&id).map(Some),
        TaskAction::Delete { id } => app.delete_task(&id).map(|_| None),
    };

    flush_notifications(&mut app);
    match result? {
        Some(task) => print_json(&task)?,
        None => println!("deleted"),
    }
    Ok(())
}
