//! End-to-end tests against an on-disk SQLite database.

use focusquest_core::{
    Achievement, App, FocusTimer, IdentityProvider, SqliteStore, Store, TaskCategory, TaskDraft,
    TaskPatch, TimerConfig, XpRules,
};

#[test]
fn progress_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusquest.db");

    let user_id = {
        let mut store = SqliteStore::open_at(&path).unwrap();
        let user = store.sign_up("ada@example.com", "secret1", "ada").unwrap();
        let mut app = App::load(store, user.id.clone(), XpRules::default()).unwrap();
        let task = app
            .create_task(TaskDraft::new("Outline thesis").category(TaskCategory::Study))
            .unwrap();
        app.set_completed(&task.id, true).unwrap();
        app.record_focus_session(25).unwrap();
        user.id
    };

    let store = SqliteStore::open_at(&path).unwrap();
    assert_eq!(
        store.current_user().unwrap().map(|u| u.id),
        Some(user_id.clone())
    );

    let app = App::load(store, user_id, XpRules::default()).unwrap();
    let p = app.progression();
    // 5 + 20 + 10 bonus + 25 minutes at 2 XP.
    assert_eq!(p.total_xp(), 85);
    assert_eq!(p.total_focus_minutes(), 25);
    assert_eq!(p.achievements(), &[Achievement::FirstTask]);

    let tasks = app.tasks();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
    assert!(tasks[0].completed_at.is_some());
    assert_eq!(tasks[0].category, TaskCategory::Study);

    let focus = app.focus_stats().unwrap();
    assert_eq!(focus.total_sessions, 1);
    assert_eq!(focus.today_focus_min, 25);
}

#[test]
fn edits_and_deletes_reach_the_database() {
    let mut store = SqliteStore::open_memory().unwrap();
    let user = store.sign_up("ada@example.com", "secret1", "ada").unwrap();
    let mut app = App::load(store, user.id.clone(), XpRules::default()).unwrap();

    let keep = app.create_task(TaskDraft::new("keep")).unwrap();
    let drop = app.create_task(TaskDraft::new("drop")).unwrap();
    app.update_task(
        &keep.id,
        &TaskPatch {
            description: Some(Some("with notes".into())),
            ..TaskPatch::default()
        },
    )
    .unwrap();
    app.delete_task(&drop.id).unwrap();

    let rows = app.store().list_tasks(&user.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description.as_deref(), Some("with notes"));
    assert!(app.store().get_task(&user.id, &drop.id).unwrap().is_none());
}

#[test]
fn timer_state_round_trips_through_kv() {
    let store = SqliteStore::open_memory().unwrap();
    let mut timer = FocusTimer::new(TimerConfig::default());
    timer.start_at(1_000);
    timer.catch_up(61_000);

    store
        .kv_set("focus_timer", &serde_json::to_string(&timer).unwrap())
        .unwrap();
    let raw = store.kv_get("focus_timer").unwrap().unwrap();
    let restored: FocusTimer = serde_json::from_str(&raw).unwrap();
    assert_eq!(restored.remaining().to_string(), "24:00");
    assert!(restored.is_running());
}
