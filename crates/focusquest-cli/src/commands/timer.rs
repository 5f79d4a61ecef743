use std::time::Duration;

use clap::Subcommand;
use focusquest_core::timer::now_ms;
use focusquest_core::{App, Config, Event, FocusTimer, SqliteStore};

use super::{flush_notifications, load_app, print_json, CmdResult};

const TIMER_KEY: &str = "focus_timer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause, keeping the remaining time
    Pause,
    /// Start when paused, pause when running
    Toggle,
    /// Stop and restore the full length of the current mode
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Start if needed and stay in the foreground until the countdown ends
    Run,
}

fn load_timer(app: &App<SqliteStore>, config: &Config) -> FocusTimer {
    let stored = match app.store().kv_get(TIMER_KEY) {
        Ok(Some(json)) => serde_json::from_str::<FocusTimer>(&json).ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("cannot read timer state: {e}");
            None
        }
    };
    let mut timer = stored.unwrap_or_else(|| FocusTimer::new(config.timer.clone()));
    if timer.config() != &config.timer && !timer.is_running() {
        timer.set_config(config.timer.clone());
    }
    timer
}

fn save_timer(app: &App<SqliteStore>, timer: &FocusTimer) -> CmdResult {
    let json = serde_json::to_string(timer)?;
    app.store().kv_set(TIMER_KEY, &json)?;
    Ok(())
}

/// Bring the timer up to wall-clock time and hand a completion to the app.
fn advance(app: &mut App<SqliteStore>, timer: &mut FocusTimer) -> CmdResult {
    if let Some(event) = timer.catch_up(now_ms()) {
        print_json(&event)?;
        let result = app.handle_timer_event(event);
        flush_notifications(app);
        result?;
    }
    Ok(())
}

fn print_event(event: Option<Event>) -> CmdResult {
    if let Some(event) = event {
        print_json(&event)?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CmdResult {
    let config = Config::load()?;
    let mut app = load_app(&config)?;
    let mut timer = load_timer(&app, &config);

    // Persist what was applied even when the completion could not be saved.
    let advanced = advance(&mut app, &mut timer);
    save_timer(&app, &timer)?;
    advanced?;

    match action {
        TimerAction::Start => print_event(timer.start())?,
        TimerAction::Pause => print_event(timer.pause())?,
        TimerAction::Toggle => print_event(timer.toggle())?,
        TimerAction::Reset => print_json(&timer.reset())?,
        TimerAction::Status => {}
        TimerAction::Run => {
            timer.start();
            save_timer(&app, &timer)?;
            while timer.is_running() {
                std::thread::sleep(Duration::from_millis(250));
                let advanced = advance(&mut app, &mut timer);
                save_timer(&app, &timer)?;
                advanced?;
            }
        }
    }

    save_timer(&app, &timer)?;
    print_json(&timer.snapshot())?;
    Ok(())
}
