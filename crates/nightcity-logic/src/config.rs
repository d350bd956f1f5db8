//! Rules configuration: every numeric balance policy in one place.
//!
//! [`RulesConfig::default`] carries the canonical Night City tables. A
//! campaign can ship its own JSON and load it with
//! [`RulesConfig::from_json`]; loading validates that tables are sorted
//! and that the skill level table covers exactly levels 1..=10.

use serde::{Deserialize, Serialize};

use crate::tiers::TierTable;

/// Lowest and highest skill level.
pub const MIN_SKILL_LEVEL: i32 = 1;
pub const MAX_SKILL_LEVEL: i32 = 10;

/// Reputation → implant points.
pub const IMPLANT_POINT_TIERS: &[(i32, i32)] = &[
    (i32::MIN, 7),
    (20, 8),
    (30, 9),
    (40, 10),
    (60, 11),
    (100, 13),
    (150, 15),
    (170, 16),
];

/// Reputation → special implant points.
pub const SPECIAL_IMPLANT_POINT_TIERS: &[(i32, i32)] =
    &[(i32::MIN, 0), (90, 1), (120, 2), (160, 3), (180, 4)];

/// Age → battle point base. Ages up to 25 give 13, up to 40 give 15.
pub const BATTLE_BASE_AGE_TIERS: &[(i32, i32)] = &[(i32::MIN, 13), (26, 15), (41, 17)];

/// Cost and reputation gate of one skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCost {
    pub level: i32,
    pub cost: i32,
    pub reputation_requirement: i32,
}

const fn level(level: i32, cost: i32, reputation_requirement: i32) -> LevelCost {
    LevelCost {
        level,
        cost,
        reputation_requirement,
    }
}

/// Canonical level → (cost, reputation) table.
pub const SKILL_LEVEL_COSTS: [LevelCost; 10] = [
    level(1, 1, 0),
    level(2, 2, 0),
    level(3, 3, 0),
    level(4, 4, 0),
    level(5, 5, 0),
    level(6, 7, 70),
    level(7, 9, 100),
    level(8, 12, 130),
    level(9, 16, 160),
    level(10, 21, 200),
];

/// Limits checked when a character is first registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationLimits {
    pub max_age: u32,
    pub max_starting_reputation: i32,
}

impl Default for CreationLimits {
    fn default() -> Self {
        Self {
            max_age: 100,
            max_starting_reputation: 40,
        }
    }
}

/// Extra implant points shown for a character class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassBonus {
    /// Class names (case-insensitive) the bonus applies to.
    pub classes: Vec<String>,
    /// Reputation → bonus. Brackets start one above the published
    /// "more than N" thresholds.
    pub tiers: TierTable,
}

impl ClassBonus {
    pub fn applies_to(&self, class: &str) -> bool {
        let class = class.trim();
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(class))
    }
}

impl Default for ClassBonus {
    fn default() -> Self {
        Self {
            classes: vec!["Соло".to_string(), "Solo".to_string()],
            tiers: tier_table(&[(i32::MIN, 0), (51, 1), (81, 2)]),
        }
    }
}

/// All balance numbers used by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub implant_points: TierTable,
    pub special_implant_points: TierTable,
    pub battle_base_by_age: TierTable,
    /// Base of the civil pool, independent of age.
    pub civil_base: i32,
    /// Reputation is divided by this and added to both skill pools.
    pub reputation_divisor: i32,
    /// Flat amount subtracted from both skill pools.
    pub compensation: i32,
    pub skill_levels: Vec<LevelCost>,
    #[serde(default)]
    pub creation: CreationLimits,
    #[serde(default)]
    pub class_bonus: ClassBonus,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            implant_points: tier_table(IMPLANT_POINT_TIERS),
            special_implant_points: tier_table(SPECIAL_IMPLANT_POINT_TIERS),
            battle_base_by_age: tier_table(BATTLE_BASE_AGE_TIERS),
            civil_base: 13,
            reputation_divisor: 10,
            compensation: 4,
            skill_levels: SKILL_LEVEL_COSTS.to_vec(),
            creation: CreationLimits::default(),
            class_bonus: ClassBonus::default(),
        }
    }
}

fn tier_table(pairs: &[(i32, i32)]) -> TierTable {
    TierTable::from_sorted_pairs(pairs)
}

/// Problem found in a rules file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("reputation divisor must be positive, got {0}")]
    InvalidDivisor(i32),
    #[error("skill level table must list levels 1..=10 in order, found level {found} at position {position}")]
    SkillLevels { position: usize, found: i32 },
    #[error("skill level {level} has negative cost or reputation requirement")]
    NegativeLevelCost { level: i32 },
}

impl RulesConfig {
    /// Parse and validate a rules file.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!(
            "loaded rules: {} implant tiers, {} skill levels",
            config.implant_points.tiers().len(),
            config.skill_levels.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Cross-field checks that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reputation_divisor <= 0 {
            return Err(ConfigError::InvalidDivisor(self.reputation_divisor));
        }
        let expected_len = (MAX_SKILL_LEVEL - MIN_SKILL_LEVEL + 1) as usize;
        for (position, entry) in self.skill_levels.iter().enumerate() {
            if entry.level != MIN_SKILL_LEVEL + position as i32 {
                return Err(ConfigError::SkillLevels {
                    position,
                    found: entry.level,
                });
            }
            if entry.cost < 0 || entry.reputation_requirement < 0 {
                return Err(ConfigError::NegativeLevelCost { level: entry.level });
            }
        }
        if self.skill_levels.len() != expected_len {
            return Err(ConfigError::SkillLevels {
                position: self.skill_levels.len(),
                found: self.skill_levels.last().map_or(0, |l| l.level),
            });
        }
        Ok(())
    }

    /// Cost row for a level, if the level is in range.
    pub fn level_cost(&self, level: i32) -> Option<&LevelCost> {
        if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level) {
            return None;
        }
        self.skill_levels.get((level - MIN_SKILL_LEVEL) as usize)
    }
}
