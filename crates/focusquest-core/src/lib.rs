//! # FocusQuest Core Library
//!
//! Core business logic for FocusQuest, a task manager with a Pomodoro focus
//! timer and a gamified progression system. Every operation is available via
//! the standalone `focusquest` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A wall-clock-based Pomodoro state machine. The caller drives
//!   it by invoking `tick()` once per second or `catch_up()` after a gap
//! - **Progression**: XP, levels, streaks and achievements for one user
//! - **App**: Task lifecycle orchestration over a [`Store`], feeding
//!   completions and focus sessions into the progression record
//! - **Storage**: SQLite persistence with versioned migrations and a
//!   TOML-based configuration file
//!
//! ## Key Components
//!
//! - [`App`]: Single mutation entry point for a signed-in user
//! - [`FocusTimer`]: Work/break countdown state machine
//! - [`Progression`]: Per-user XP and achievement record
//! - [`SqliteStore`]: Task, session and account persistence
//! - [`Config`]: Application configuration management

pub mod app;
pub mod error;
pub mod events;
pub mod identity;
pub mod notify;
pub mod progression;
pub mod storage;
pub mod task;
pub mod timer;

pub use app::App;
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use identity::{IdentityProvider, ProfileUpdate, User};
pub use notify::{Notification, NotificationQueue, NotificationStyle};
pub use progression::{level_for_xp, Achievement, LevelProgress, Progression, XpRules};
pub use storage::{
    data_dir, Config, FocusSession, FocusStats, MemoryStore, NotificationsConfig, SessionType,
    SqliteStore, Store, StoreWrite,
};
pub use task::{Task, TaskCategory, TaskDraft, TaskFilter, TaskPatch, TaskPriority, TaskStats};
pub use timer::{Countdown, FocusTimer, TimerConfig, TimerMode, TimerSnapshot, TimerState};
