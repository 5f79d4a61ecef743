//! Integration tests for task completion feeding the progression record.
//!
//! Runs the orchestration layer against the in-memory store, including the
//! persistence-failure paths.

use focusquest_core::{
    Achievement, App, CoreError, Event, MemoryStore, NotificationQueue, NotificationStyle,
    Store, TaskDraft, TaskFilter, TaskPriority, XpRules,
};

fn load() -> App<MemoryStore> {
    App::load(MemoryStore::new(), "user-1", XpRules::default()).unwrap()
}

#[test]
fn first_task_full_lifecycle() {
    let mut app = load();
    let task = app
        .create_task(TaskDraft::new("Write report").priority(TaskPriority::Medium))
        .unwrap();
    app.set_completed(&task.id, true).unwrap();

    // 5 for creating, 20 for a medium completion, 10 First Steps bonus.
    let p = app.progression();
    assert_eq!(p.total_xp(), 35);
    assert_eq!(p.level(), 1);
    assert_eq!(p.tasks_completed(), 1);
    assert_eq!(p.current_streak(), 1);
    assert_eq!(p.achievements(), &[Achievement::FirstTask]);

    let stored = app.store().load_progression("user-1").unwrap().unwrap();
    assert_eq!(&stored, app.progression());
}

#[test]
fn deleting_a_completed_task_keeps_progress() {
    let mut app = load();
    let task = app.create_task(TaskDraft::new("Temporary")).unwrap();
    app.set_completed(&task.id, true).unwrap();
    let before = app.progression().clone();

    app.delete_task(&task.id).unwrap();
    assert!(app.tasks().is_empty());
    assert_eq!(app.progression(), &before);
    assert!(app.store().list_tasks("user-1").unwrap().is_empty());
}

#[test]
fn failed_create_shows_one_notice_and_awards_nothing() {
    let mut app = load();
    app.store_mut().fail_writes("disk full");

    let err = app.create_task(TaskDraft::new("Lost")).unwrap_err();
    assert!(err.is_persistence());
    assert!(app.tasks().is_empty());
    assert_eq!(app.progression().total_xp(), 0);

    let notes = app.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Could not create task");
    assert_eq!(notes[0].style, NotificationStyle::Destructive);
    assert_eq!(notes[0].description, "Database error: Query failed: disk full");

    app.store_mut().recover();
    app.create_task(TaskDraft::new("Found")).unwrap();
    assert_eq!(app.tasks().len(), 1);
}

#[test]
fn failed_progress_save_keeps_previous_record() {
    let mut app = load();
    let task = app.create_task(TaskDraft::new("Keep")).unwrap();
    app.drain_events();
    app.store_mut().fail_writes("offline");

    assert!(app.record_focus_session(25).is_err());
    assert_eq!(app.progression().total_focus_minutes(), 0);
    assert_eq!(app.progression().total_xp(), 5);
    let events = app.drain_events();
    assert!(matches!(events.as_slice(), [Event::PersistenceFailed { .. }]));

    app.store_mut().recover();
    app.set_completed(&task.id, true).unwrap();
    assert_eq!(app.progression().tasks_completed(), 1);
}

#[test]
fn reload_restores_tasks_newest_first() {
    let mut app = load();
    app.create_task(TaskDraft::new("older")).unwrap();
    app.create_task(TaskDraft::new("newer")).unwrap();
    let store = app.into_store();

    let app = App::load(store, "user-1", XpRules::default()).unwrap();
    let titles: Vec<_> = app.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
    assert_eq!(app.progression().total_xp(), 10);
}

#[test]
fn seventh_completion_in_a_row_crowns_consistency() {
    let mut app = load();
    let ids: Vec<String> = (0..7)
        .map(|i| {
            app.create_task(TaskDraft::new(format!("chore {i}")).priority(TaskPriority::Low))
                .unwrap()
                .id
        })
        .collect();
    for id in &ids {
        app.set_completed(id, true).unwrap();
    }
    let p = app.progression();
    assert!(p.has(Achievement::ConsistencyKing));
    assert_eq!(p.current_streak(), 7);
    assert_eq!(p.longest_streak(), 7);
    // 7 * 5 created, 7 * 10 completed, 10 + 200 bonuses.
    assert_eq!(p.total_xp(), 315);
    assert_eq!(p.level(), 4);
}

#[test]
fn other_users_tasks_are_invisible() {
    let mut app = load();
    app.create_task(TaskDraft::new("mine")).unwrap();
    let store = app.into_store();

    let mut other = App::load(store, "user-2", XpRules::default()).unwrap();
    assert!(other.tasks().is_empty());
    let id = other.store().list_tasks("user-1").unwrap()[0].id.clone();
    assert!(matches!(
        other.set_completed(&id, true),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn filters_and_stats_follow_local_list() {
    let mut app = load();
    let a = app
        .create_task(TaskDraft::new("a").priority(TaskPriority::High))
        .unwrap();
    app.create_task(TaskDraft::new("b").priority(TaskPriority::Low))
        .unwrap();
    app.set_completed(&a.id, true).unwrap();

    let open = app.tasks_by(&TaskFilter {
        completed: Some(false),
        ..TaskFilter::default()
    });
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].title, "b");

    let stats = app.task_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completed_today, 1);
}

#[test]
fn muted_queue_still_records_events() {
    let mut app = load().with_notifications(NotificationQueue::disabled());
    app.create_task(TaskDraft::new("quiet")).unwrap();
    assert!(app.drain_notifications().is_empty());
    assert_eq!(app.drain_events().len(), 2);
}
