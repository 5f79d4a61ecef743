//! Property tests for the XP and level rules.

use focusquest_core::{level_for_xp, Event, Progression};
use proptest::prelude::*;

proptest! {
    #[test]
    fn level_matches_hundred_xp_bands(xp in 0u64..10_000_000) {
        let level = level_for_xp(xp);
        prop_assert_eq!(u64::from(level), xp / 100 + 1);
    }

    #[test]
    fn awards_accumulate_and_level_only_rises(amounts in prop::collection::vec(1u64..500, 1..40)) {
        let mut p = Progression::new("u");
        let mut total = 0u64;
        let mut previous_level = p.level();
        for amount in amounts {
            let events = p.award_xp(amount, "prop");
            total += amount;
            prop_assert_eq!(p.total_xp(), total);
            prop_assert_eq!(p.level(), level_for_xp(total));
            prop_assert!(p.level() >= previous_level);

            let leveled = events.iter().any(|e| matches!(e, Event::LevelUp { .. }));
            prop_assert_eq!(leveled, p.level() > previous_level);
            previous_level = p.level();
        }
    }

    #[test]
    fn streak_never_exceeds_longest(completions in 1usize..30) {
        let mut p = Progression::new("u");
        for n in 1..=completions {
            p.record_task_completion(n);
            prop_assert!(p.longest_streak() >= p.current_streak());
            prop_assert_eq!(p.achievements().len(), {
                let mut seen = p.achievements().to_vec();
                seen.sort();
                seen.dedup();
                seen.len()
            });
        }
    }
}
