use serde::Serialize;

use focusquest_core::{Config, FocusStats, TaskStats};

use super::{load_app, print_json, CmdResult};

#[derive(Serialize)]
struct StatsView {
    tasks: TaskStats,
    focus: FocusStats,
}

pub fn run() -> CmdResult {
    let config = Config::load()?;
    let app = load_app(&config)?;
    print_json(&StatsView {
        tasks: app.task_stats(),
        focus: app.focus_stats()?,
    })
}
