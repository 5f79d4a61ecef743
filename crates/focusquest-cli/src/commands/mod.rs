//! Command handlers. Each `run` prints JSON on stdout; queued notifications
//! go to stderr as one JSON object per line.

pub mod auth;
pub mod config;
pub mod profile;
pub mod stats;
pub mod task;
pub mod timer;

use serde::Serialize;

use focusquest_core::{
    App, AuthError, Config, IdentityProvider, NotificationQueue, SqliteStore, Store, User,
};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn require_user(store: &SqliteStore) -> Result<User, Box<dyn std::error::Error>> {
    Ok(store.current_user()?.ok_or(AuthError::NotSignedIn)?)
}

/// Open the database and load the signed-in user's app state.
pub(crate) fn load_app(config: &Config) -> Result<App<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let user = require_user(&store)?;
    let queue = if config.notifications.enabled {
        NotificationQueue::new()
    } else {
        NotificationQueue::disabled()
    };
    Ok(App::load(store, user.id, config.xp.clone())?.with_notifications(queue))
}

/// Write pending notifications to stderr. Called before propagating an
/// error too, so failure notices are not lost.
pub(crate) fn flush_notifications<S: Store>(app: &mut App<S>) {
    for notification in app.drain_notifications() {
        match serde_json::to_string(&notification) {
            Ok(line) => eprintln!("{line}"),
            Err(e) => tracing::warn!("cannot encode notification: {e}"),
        }
    }
}
