//! Skill level-up cost curve.

/// Points needed to reach `level`: `round(level² / 2) + 1`, halves rounding up.
pub fn skill_cost_for_level(level: u32) -> u32 {
    let squared = level.saturating_mul(level);
    squared / 2 + squared % 2 + 1
}

/// Whether `available_points` cover the next level.
pub fn can_level_skill(current_level: u32, available_points: u32) -> bool {
    available_points >= skill_cost_for_level(current_level.saturating_add(1))
}

/// Spend points on one level. Returns the new level and the points left over.
pub fn level_up(current_level: u32, available_points: u32) -> Option<(u32, u32)> {
    let next_level = current_level.checked_add(1)?;
    let cost = skill_cost_for_level(next_level);
    let remaining = available_points.checked_sub(cost)?;
    Some((next_level, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_costs() {
        assert_eq!(skill_cost_for_level(0), 1);
        assert_eq!(skill_cost_for_level(1), 2);
        assert_eq!(skill_cost_for_level(2), 3);
        assert_eq!(skill_cost_for_level(3), 6);
        assert_eq!(skill_cost_for_level(4), 9);
    }

    #[test]
    fn level_gate_uses_next_level_cost() {
        assert!(!can_level_skill(0, 1));
        assert!(can_level_skill(0, 2));
        assert!(!can_level_skill(2, 5));
        assert!(can_level_skill(2, 6));
    }

    #[test]
    fn level_up_spends_points() {
        assert_eq!(level_up(0, 5), Some((1, 3)));
        assert_eq!(level_up(2, 5), None);
        assert_eq!(level_up(u32::MAX, u32::MAX), None);
    }

    proptest! {
        #[test]
        fn cost_is_monotonic(level in 0u32..10_000) {
            prop_assert!(skill_cost_for_level(level + 1) > skill_cost_for_level(level));
        }

        #[test]
        fn level_up_agrees_with_gate(level in 0u32..1_000, points in 0u32..1_000_000) {
            prop_assert_eq!(level_up(level, points).is_some(), can_level_skill(level, points));
        }
    }
}
