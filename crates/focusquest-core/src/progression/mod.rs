//! Gamification rules: XP, levels, streaks and achievements.
//!
//! A [`Progression`] is one user's record. Every mutating call returns the
//! events it produced, in the order the UI should show them.
//!
//! ## Invariants
//!
//! - `level == total_xp / 100 + 1`
//! - `longest_streak >= current_streak`
//! - each achievement appears at most once in `achievements`
//!
//! The streak counts completion events. It is never reset by a missed day,
//! a deletion, or a task being reopened.

mod achievement;

pub use achievement::Achievement;

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::task::TaskPriority;

pub const XP_PER_LEVEL: u64 = 100;
pub const TASK_MASTER_DAILY_TASKS: usize = 10;
pub const CONSISTENCY_KING_STREAK: u32 = 7;

/// Level reached with `xp` total experience.
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// XP amounts granted for task and focus activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRules {
    #[serde(default = "default_task_created")]
    pub task_created: u64,
    #[serde(default = "default_complete_low")]
    pub complete_low: u64,
    #[serde(default = "default_complete_medium")]
    pub complete_medium: u64,
    #[serde(default = "default_complete_high")]
    pub complete_high: u64,
    /// XP per focused minute.
    #[serde(default = "default_focus_minute")]
    pub focus_minute: u64,
}

fn default_task_created() -> u64 {
    5
}
fn default_complete_low() -> u64 {
    10
}
fn default_complete_medium() -> u64 {
    20
}
fn default_complete_high() -> u64 {
    30
}
fn default_focus_minute() -> u64 {
    2
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            task_created: default_task_created(),
            complete_low: default_complete_low(),
            complete_medium: default_complete_medium(),
            complete_high: default_complete_high(),
            focus_minute: default_focus_minute(),
        }
    }
}

impl XpRules {
    pub fn for_completion(&self, priority: TaskPriority) -> u64 {
        match priority {
            TaskPriority::Low => self.complete_low,
            TaskPriority::Medium => self.complete_medium,
            TaskPriority::High => self.complete_high,
        }
    }
}

/// Position within the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_to_next_level: u64,
    /// 0.0 .. 1.0
    pub fraction: f64,
}

/// Per-user progression record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub(crate) user_id: String,
    pub(crate) total_xp: u64,
    pub(crate) level: u32,
    pub(crate) current_streak: u32,
    pub(crate) longest_streak: u32,
    pub(crate) tasks_completed: u32,
    pub(crate) total_focus_minutes: u64,
    /// Unlock order, oldest first.
    pub(crate) achievements: Vec<Achievement>,
}

impl Progression {
    /// Fresh record for a new account.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            tasks_completed: 0,
            total_focus_minutes: 0,
            achievements: Vec::new(),
        }
    }

    /// Rebuild a record from stored counters, re-establishing the invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        user_id: impl Into<String>,
        total_xp: u64,
        current_streak: u32,
        longest_streak: u32,
        tasks_completed: u32,
        total_focus_minutes: u64,
        achievements: impl IntoIterator<Item = Achievement>,
    ) -> Self {
        let mut unique: Vec<Achievement> = Vec::new();
        for a in achievements {
            if !unique.contains(&a) {
                unique.push(a);
            }
        }
        Self {
            user_id: user_id.into(),
            total_xp,
            level: level_for_xp(total_xp),
            current_streak,
            longest_streak: longest_streak.max(current_streak),
            tasks_completed,
            total_focus_minutes,
            achievements: unique,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    pub fn total_focus_minutes(&self) -> u64 {
        self.total_focus_minutes
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn has(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }

    /// Most recently unlocked first.
    pub fn recent_achievements(&self, n: usize) -> Vec<Achievement> {
        self.achievements.iter().rev().take(n).copied().collect()
    }

    pub fn level_progress(&self) -> LevelProgress {
        let xp_into_level = self.total_xp % XP_PER_LEVEL;
        LevelProgress {
            level: self.level,
            xp_into_level,
            xp_to_next_level: XP_PER_LEVEL - xp_into_level,
            fraction: xp_into_level as f64 / XP_PER_LEVEL as f64,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Add XP and recompute the level.
    ///
    /// Always yields `XpGained`; yields `LevelUp` as well when the level rose.
    /// `amount` must be positive.
    pub fn award_xp(&mut self, amount: u64, reason: &str) -> Vec<Event> {
        debug_assert!(amount > 0, "XP awards must be positive");
        let previous_level = self.level;
        self.total_xp = self.total_xp.saturating_add(amount);
        self.level = level_for_xp(self.total_xp);

        let mut events = vec![Event::XpGained {
            amount,
            reason: reason.to_string(),
            total_xp: self.total_xp,
        }];
        if self.level > previous_level {
            tracing::info!(user = %self.user_id, level = self.level, "level up");
            events.push(Event::LevelUp { level: self.level });
        }
        events
    }

    /// Count one incomplete→complete transition.
    ///
    /// `completed_today` is the number of the user's tasks whose completion
    /// falls on the current calendar day, including this one.
    pub fn record_task_completion(&mut self, completed_today: usize) -> Vec<Event> {
        self.tasks_completed = self.tasks_completed.saturating_add(1);
        self.current_streak = self.current_streak.saturating_add(1);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        tracing::debug!(
            user = %self.user_id,
            tasks_completed = self.tasks_completed,
            streak = self.current_streak,
            "task completion recorded"
        );

        let unlocked = self.evaluate_achievements(self.tasks_completed, completed_today);
        self.unlock(&unlocked)
    }

    /// Credit a finished focus session.
    pub fn record_focus_minutes(&mut self, minutes: u32, xp_per_minute: u64) -> Vec<Event> {
        debug_assert!(minutes > 0, "focus minutes must be positive");
        self.total_focus_minutes = self.total_focus_minutes.saturating_add(u64::from(minutes));
        let amount = u64::from(minutes).saturating_mul(xp_per_minute);
        if amount == 0 {
            return Vec::new();
        }
        self.award_xp(amount, &format!("Focused for {minutes} minutes"))
    }

    /// Achievements whose condition holds and that are still locked, in
    /// catalog order. Does not modify the record.
    pub fn evaluate_achievements(
        &self,
        tasks_completed_so_far: u32,
        completed_today: usize,
    ) -> Vec<Achievement> {
        Achievement::ALL
            .into_iter()
            .filter(|a| !self.has(*a))
            .filter(|a| match a {
                Achievement::FirstTask => tasks_completed_so_far == 1,
                Achievement::TaskMaster => completed_today >= TASK_MASTER_DAILY_TASKS,
                Achievement::ConsistencyKing => self.current_streak >= CONSISTENCY_KING_STREAK,
            })
            .collect()
    }

    /// Record newly unlocked achievements and grant their summed bonus once.
    ///
    /// Already-unlocked entries are skipped, so calling this twice with the
    /// same list is a no-op the second time.
    pub fn unlock(&mut self, achievements: &[Achievement]) -> Vec<Event> {
        let mut fresh: Vec<Achievement> = achievements
            .iter()
            .copied()
            .filter(|a| !self.has(*a))
            .collect();
        fresh.sort();
        fresh.dedup();
        if fresh.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(fresh.len() + 2);
        let mut bonus = 0u64;
        for a in &fresh {
            tracing::info!(user = %self.user_id, achievement = a.id(), "achievement unlocked");
            self.achievements.push(*a);
            bonus += a.bonus_xp();
            events.push(Event::AchievementUnlocked { achievement: *a });
        }
        events.extend(self.award_xp(bonus, "Achievement bonus"));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xp_of(events: &[Event]) -> u64 {
        events
            .iter()
            .map(|e| match e {
                Event::XpGained { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn level_formula() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
    }

    #[test]
    fn award_without_level_change_emits_only_xp_notice() {
        let mut p = Progression::new("u");
        let events = p.award_xp(40, "test");
        assert_eq!(events.len(), 1);
        assert_eq!(p.level(), 1);
    }

    #[test]
    fn award_crossing_boundary_emits_level_up() {
        let mut p = Progression::new("u");
        p.award_xp(95, "a");
        let events = p.award_xp(10, "b");
        assert_eq!(p.total_xp(), 105);
        assert_eq!(p.level(), 2);
        assert_eq!(events.last(), Some(&Event::LevelUp { level: 2 }));
    }

    #[test]
    fn first_completion_unlocks_first_task() {
        let mut p = Progression::new("u");
        let events = p.record_task_completion(1);
        assert_eq!(p.tasks_completed(), 1);
        assert!(p.has(Achievement::FirstTask));
        assert_eq!(xp_of(&events), 10);
        assert_eq!(p.total_xp(), 10);
    }

    #[test]
    fn streak_of_seven_unlocks_consistency_king_once() {
        let mut p = Progression::new("u");
        for _ in 0..6 {
            p.record_task_completion(1);
        }
        assert!(!p.has(Achievement::ConsistencyKing));
        let events = p.record_task_completion(1);
        assert!(p.has(Achievement::ConsistencyKing));
        assert_eq!(xp_of(&events), 200);

        let events = p.record_task_completion(1);
        assert_eq!(xp_of(&events), 0);
        assert_eq!(p.achievements().len(), 2);
    }

    #[test]
    fn ten_today_unlocks_task_master() {
        let mut p = Progression::new("u");
        for n in 1..=9 {
            p.record_task_completion(n);
        }
        assert!(!p.has(Achievement::TaskMaster));
        p.record_task_completion(10);
        assert!(p.has(Achievement::TaskMaster));
    }

    #[test]
    fn simultaneous_unlocks_follow_catalog_order_and_share_one_award() {
        let mut p = Progression::new("u");
        p.current_streak = 6;
        p.longest_streak = 6;
        // Tenth completion today, seventh in a row, and the first ever.
        let events = p.record_task_completion(10);
        let unlocked: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::AchievementUnlocked { achievement } => Some(*achievement),
                _ => None,
            })
            .collect();
        assert_eq!(unlocked, Achievement::ALL.to_vec());
        let xp_events = events
            .iter()
            .filter(|e| matches!(e, Event::XpGained { .. }))
            .count();
        assert_eq!(xp_events, 1);
        assert_eq!(p.total_xp(), 310);
    }

    #[test]
    fn evaluate_is_pure() {
        let p = Progression::new("u");
        let found = p.evaluate_achievements(1, 1);
        assert_eq!(found, vec![Achievement::FirstTask]);
        assert!(p.achievements().is_empty());
        assert_eq!(p.total_xp(), 0);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut p = Progression::new("u");
        p.unlock(&[Achievement::FirstTask]);
        let events = p.unlock(&[Achievement::FirstTask]);
        assert!(events.is_empty());
        assert_eq!(p.total_xp(), 10);
    }

    #[test]
    fn focus_minutes_award_double_xp() {
        let mut p = Progression::new("u");
        p.record_focus_minutes(25, XpRules::default().focus_minute);
        assert_eq!(p.total_focus_minutes(), 25);
        assert_eq!(p.total_xp(), 50);
    }

    #[test]
    fn restore_repairs_invariants() {
        let p = Progression::restore(
            "u",
            350,
            5,
            2,
            9,
            0,
            [Achievement::FirstTask, Achievement::FirstTask],
        );
        assert_eq!(p.level(), 4);
        assert_eq!(p.longest_streak(), 5);
        assert_eq!(p.achievements(), &[Achievement::FirstTask]);
    }

    #[test]
    fn recent_achievements_newest_first() {
        let mut p = Progression::new("u");
        p.unlock(&[Achievement::ConsistencyKing]);
        p.unlock(&[Achievement::FirstTask]);
        assert_eq!(
            p.recent_achievements(5),
            vec![Achievement::FirstTask, Achievement::ConsistencyKing]
        );
    }

    #[test]
    fn level_progress_within_level() {
        let mut p = Progression::new("u");
        p.award_xp(130, "x");
        let lp = p.level_progress();
        assert_eq!(lp.level, 2);
        assert_eq!(lp.xp_into_level, 30);
        assert_eq!(lp.xp_to_next_level, 70);
    }

    #[test]
    fn completion_xp_by_priority() {
        let rules = XpRules::default();
        assert_eq!(rules.for_completion(TaskPriority::Low), 10);
        assert_eq!(rules.for_completion(TaskPriority::Medium), 20);
        assert_eq!(rules.for_completion(TaskPriority::High), 30);
    }
}
