//! Derived character points.
//!
//! A character's four point pools are a pure function of age and
//! reputation and are recomputed on every read:
//!
//! | Pool | Formula |
//! |------|---------|
//! | implant | reputation tier table (7..=16) |
//! | special implant | reputation tier table (0..=4) |
//! | battle | age base (13/15/17) + reputation / 10 − 4 |
//! | civil | 13 + reputation / 10 − 4 |
//!
//! Division truncates toward zero, so a reputation of −15 contributes −1.
//! Negative reputation never fails; it lands in the lowest tier.
//!
//! ```
//! use nightcity_logic::stats::derive_stats;
//!
//! let stats = derive_stats(30, 45);
//! assert_eq!(stats.implant_points, 10);
//! assert_eq!(stats.battle_points, 15 + 4 - 4);
//! assert_eq!(stats.civil_points, 13 + 4 - 4);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Character;
use crate::config::RulesConfig;
use crate::error::PointPool;

/// The four spendable pools of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub implant_points: i32,
    pub special_implant_points: i32,
    pub battle_points: i32,
    pub civil_points: i32,
}

impl DerivedStats {
    pub fn pool(&self, pool: PointPool) -> i32 {
        match pool {
            PointPool::Implant => self.implant_points,
            PointPool::SpecialImplant => self.special_implant_points,
            PointPool::Battle => self.battle_points,
            PointPool::Civil => self.civil_points,
        }
    }
}

/// Derive stats with the canonical tables.
pub fn derive_stats(age: u32, reputation: i32) -> DerivedStats {
    derive_stats_with(age, reputation, &RulesConfig::default())
}

/// Derive stats with campaign-specific rules.
pub fn derive_stats_with(age: u32, reputation: i32, rules: &RulesConfig) -> DerivedStats {
    DerivedStats {
        implant_points: rules.implant_points.lookup(reputation),
        special_implant_points: rules.special_implant_points.lookup(reputation),
        battle_points: battle_points(age, reputation, rules),
        civil_points: civil_points(reputation, rules),
    }
}

fn reputation_share(reputation: i32, rules: &RulesConfig) -> i32 {
    // Truncating division; the divisor is validated positive on load.
    reputation / rules.reputation_divisor.max(1)
}

pub fn battle_points(age: u32, reputation: i32, rules: &RulesConfig) -> i32 {
    let age = i32::try_from(age).unwrap_or(i32::MAX);
    rules.battle_base_by_age.lookup(age) + reputation_share(reputation, rules) - rules.compensation
}

pub fn civil_points(reputation: i32, rules: &RulesConfig) -> i32 {
    rules.civil_base + reputation_share(reputation, rules) - rules.compensation
}

/// Class-specific implant bonus shown on the character sheet.
pub fn class_implant_bonus(character_class: &str, reputation: i32, rules: &RulesConfig) -> i32 {
    if rules.class_bonus.applies_to(character_class) {
        rules.class_bonus.tiers.lookup(reputation)
    } else {
        0
    }
}

/// Read model of a character: identity plus freshly derived points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub age: u32,
    pub reputation: i32,
    pub character_class: String,
    pub stats: DerivedStats,
    /// Implant points including the class bonus. Budget checks use
    /// `stats.implant_points`, not this.
    pub displayed_implant_points: i32,
}

pub fn character_sheet(character: &Character, rules: &RulesConfig) -> CharacterSheet {
    let stats = derive_stats_with(character.age, character.reputation, rules);
    let bonus = class_implant_bonus(&character.character_class, character.reputation, rules);
    CharacterSheet {
        id: character.id,
        owner_id: character.owner_id,
        name: character.name.clone(),
        age: character.age,
        reputation: character.reputation,
        character_class: character.character_class.clone(),
        stats,
        displayed_implant_points: stats.implant_points + bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implant_point_boundaries() {
        let expected = [
            (19, 7),
            (20, 8),
            (29, 8),
            (30, 9),
            (39, 9),
            (40, 10),
            (59, 10),
            (60, 11),
            (99, 11),
            (100, 13),
            (149, 13),
            (150, 15),
            (169, 15),
            (170, 16),
            (500, 16),
        ];
        for (rep, points) in expected {
            assert_eq!(
                derive_stats(20, rep).implant_points,
                points,
                "reputation {rep}"
            );
        }
    }

    #[test]
    fn special_implant_point_boundaries() {
        let expected = [
            (89, 0),
            (90, 1),
            (119, 1),
            (120, 2),
            (159, 2),
            (160, 3),
            (179, 3),
            (180, 4),
        ];
        for (rep, points) in expected {
            assert_eq!(derive_stats(20, rep).special_implant_points, points);
        }
    }

    #[test]
    fn implant_points_monotonic() {
        let mut last = i32::MIN;
        for rep in -50..400 {
            let p = derive_stats(20, rep).implant_points;
            assert!(p >= last, "dropped at reputation {rep}");
            last = p;
        }
    }

    #[test]
    fn negative_reputation_uses_lowest_tier() {
        let s = derive_stats(20, -35);
        assert_eq!(s.implant_points, 7);
        assert_eq!(s.special_implant_points, 0);
        // -35 / 10 truncates to -3
        assert_eq!(s.battle_points, 13 - 3 - 4);
        assert_eq!(s.civil_points, 13 - 3 - 4);
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(derive_stats(20, -15).civil_points, 13 - 1 - 4);
        assert_eq!(derive_stats(20, -9).civil_points, 13 - 4);
        assert_eq!(derive_stats(20, 19).civil_points, 13 + 1 - 4);
    }

    #[test]
    fn battle_base_by_age() {
        for rep in [0, 37, 120] {
            let young = derive_stats(25, rep).battle_points;
            let mid = derive_stats(26, rep).battle_points;
            let mid_top = derive_stats(40, rep).battle_points;
            let old = derive_stats(41, rep).battle_points;
            assert_eq!(mid - young, 2);
            assert_eq!(mid_top, mid);
            assert_eq!(old - young, 4);
            assert_eq!(young, 13 + rep / 10 - 4);
        }
    }

    #[test]
    fn civil_ignores_age() {
        assert_eq!(
            derive_stats(18, 55).civil_points,
            derive_stats(80, 55).civil_points
        );
    }

    #[test]
    fn derivation_is_idempotent() {
        assert_eq!(derive_stats(33, 77), derive_stats(33, 77));
    }

    #[test]
    fn pool_accessor() {
        let s = derive_stats(30, 100);
        assert_eq!(s.pool(PointPool::Implant), 13);
        assert_eq!(s.pool(PointPool::SpecialImplant), 1);
        assert_eq!(s.pool(PointPool::Battle), 15 + 10 - 4);
        assert_eq!(s.pool(PointPool::Civil), 13 + 10 - 4);
    }

    #[test]
    fn solo_bonus_only_on_sheet() {
        let rules = RulesConfig::default();
        let mut c = Character {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Rogue".into(),
            age: 50,
            reputation: 50,
            character_class: "Solo".into(),
        };
        assert_eq!(character_sheet(&c, &rules).displayed_implant_points, 10);

        c.reputation = 51;
        let sheet = character_sheet(&c, &rules);
        assert_eq!(sheet.stats.implant_points, 10);
        assert_eq!(sheet.displayed_implant_points, 11);

        c.reputation = 81;
        assert_eq!(character_sheet(&c, &rules).displayed_implant_points, 11 + 2);

        c.character_class = "Fixer".into();
        assert_eq!(character_sheet(&c, &rules).displayed_implant_points, 11);
    }
}
