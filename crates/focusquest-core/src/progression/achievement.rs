//! Static achievement catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unlockable badge. Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// First completed task
    FirstTask,
    /// Ten tasks completed on the same day
    TaskMaster,
    /// Streak of seven
    ConsistencyKing,
}

impl Achievement {
    pub const ALL: [Achievement; 3] = [
        Achievement::FirstTask,
        Achievement::TaskMaster,
        Achievement::ConsistencyKing,
    ];

    /// Stable identifier used in storage.
    pub fn id(&self) -> &'static str {
        match self {
            Achievement::FirstTask => "first_task",
            Achievement::TaskMaster => "task_master",
            Achievement::ConsistencyKing => "consistency_king",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstTask => "First Steps",
            Achievement::TaskMaster => "Task Master",
            Achievement::ConsistencyKing => "Consistency King",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Achievement::FirstTask => "🎯",
            Achievement::TaskMaster => "🏆",
            Achievement::ConsistencyKing => "👑",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstTask => "Complete your first task",
            Achievement::TaskMaster => "Complete 10 tasks in a single day",
            Achievement::ConsistencyKing => "Reach a 7-task completion streak",
        }
    }

    /// One-time XP bonus granted on unlock.
    pub fn bonus_xp(&self) -> u64 {
        match self {
            Achievement::FirstTask => 10,
            Achievement::TaskMaster => 100,
            Achievement::ConsistencyKing => 200,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_matches_ord() {
        let mut sorted = Achievement::ALL;
        sorted.sort();
        assert_eq!(sorted, Achievement::ALL);
    }

    #[test]
    fn ids_round_trip() {
        for a in Achievement::ALL {
            assert_eq!(Achievement::from_id(a.id()), Some(a));
        }
        assert_eq!(Achievement::from_id("speed_demon"), None);
    }

    #[test]
    fn bonuses() {
        assert_eq!(Achievement::FirstTask.bonus_xp(), 10);
        assert_eq!(Achievement::TaskMaster.bonus_xp(), 100);
        assert_eq!(Achievement::ConsistencyKing.bonus_xp(), 200);
    }

    #[test]
    fn serializes_as_snake_case_id() {
        let json = serde_json::to_string(&Achievement::ConsistencyKing).unwrap();
        assert_eq!(json, "\"consistency_king\"");
    }
}
