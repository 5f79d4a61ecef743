//! Progression and account profile commands.

use clap::Subcommand;
use serde::Serialize;

use focusquest_core::{
    Achievement, Config, IdentityProvider, LevelProgress, ProfileUpdate, SqliteStore,
};

use super::{load_app, print_json, require_user, CmdResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Level, XP, streaks and recent achievements
    Show,
    /// Every achievement and whether it is unlocked
    Achievements,
    /// Change username or email
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Serialize)]
struct ProfileView<'a> {
    username: &'a str,
    email: &'a str,
    level: u32,
    total_xp: u64,
    level_progress: LevelProgress,
    current_streak: u32,
    longest_streak: u32,
    tasks_completed: u32,
    total_focus_minutes: u64,
    recent_achievements: Vec<AchievementView>,
}

#[derive(Serialize)]
struct AchievementView {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    bonus_xp: u64,
    unlocked: bool,
}

impl AchievementView {
    fn new(achievement: Achievement, unlocked: bool) -> Self {
        Self {
            id: achievement.id(),
            name: achievement.name(),
            icon: achievement.icon(),
            description: achievement.description(),
            bonus_xp: achievement.bonus_xp(),
            unlocked,
        }
    }
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::Show => show(),
        ProfileAction::Achievements => achievements(),
        ProfileAction::Update { username, email } => update(ProfileUpdate { username, email }),
    }
}

fn show() -> CmdResult {
    let config = Config::load()?;
    let app = load_app(&config)?;
    let user = require_user(app.store())?;
    let p = app.progression();

    print_json(&ProfileView {
        username: &user.username,
        email: &user.email,
        level: p.level(),
        total_xp: p.total_xp(),
        level_progress: p.level_progress(),
        current_streak: p.current_streak(),
        longest_streak: p.longest_streak(),
        tasks_completed: p.tasks_completed(),
        total_focus_minutes: p.total_focus_minutes(),
        recent_achievements: p
            .recent_achievements(5)
            .into_iter()
            .map(|a| AchievementView::new(a, true))
            .collect(),
    })
}

fn achievements() -> CmdResult {
    let config = Config::load()?;
    let app = load_app(&config)?;
    let views: Vec<AchievementView> = Achievement::ALL
        .into_iter()
        .map(|a| AchievementView::new(a, app.progression().has(a)))
        .collect();
    print_json(&views)
}

fn update(update: ProfileUpdate) -> CmdResult {
    if update.username.is_none() && update.email.is_none() {
        return Err("nothing to update".into());
    }
    let mut store = SqliteStore::open()?;
    let user = store.update_profile(&update)?;
    print_json(&user)
}
