//! Skill cost calculation and skill family construction.
//!
//! A skill family ("Handguns", "Streetwise") exists as ten separate skill
//! records, one per level. Each level's point cost and reputation gate
//! come from a level table:
//!
//! | Level | Cost | Reputation |
//! |-------|------|------------|
//! | 1–5 | = level | 0 |
//! | 6 | 7 | 70 |
//! | 7 | 9 | 100 |
//! | 8 | 12 | 130 |
//! | 9 | 16 | 160 |
//! | 10 | 21 | 200 |
//!
//! The cost is charged to the battle pool for battle skills and to the
//! civil pool otherwise; the other cost is always zero.
//!
//! ```
//! use nightcity_logic::catalog::SkillKind;
//! use nightcity_logic::skills::compute_skill_cost;
//!
//! let cost = compute_skill_cost(6, SkillKind::Battle).unwrap();
//! assert_eq!((cost.battle_cost, cost.civil_cost, cost.reputation_requirement), (7, 0, 70));
//! assert!(compute_skill_cost(11, SkillKind::Civil).is_err());
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Skill, SkillKind};
use crate::config::{RulesConfig, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::error::{RuleError, RuleResult};

/// Point cost and reputation gate of one skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCost {
    pub battle_cost: i32,
    pub civil_cost: i32,
    pub reputation_requirement: i32,
}

impl SkillCost {
    /// The non-zero side of the cost.
    pub fn cost(&self) -> i32 {
        self.battle_cost + self.civil_cost
    }
}

/// Cost of a level with the canonical table.
pub fn compute_skill_cost(level: i32, kind: SkillKind) -> RuleResult<SkillCost> {
    compute_skill_cost_with(level, kind, &RulesConfig::default())
}

pub fn compute_skill_cost_with(
    level: i32,
    kind: SkillKind,
    rules: &RulesConfig,
) -> RuleResult<SkillCost> {
    let row = rules
        .level_cost(level)
        .ok_or(RuleError::InvalidLevel { level })?;
    let (battle_cost, civil_cost) = match kind {
        SkillKind::Battle => (row.cost, 0),
        SkillKind::Civil => (0, row.cost),
    };
    Ok(SkillCost {
        battle_cost,
        civil_cost,
        reputation_requirement: row.reputation_requirement,
    })
}

/// Admin request describing a whole skill family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFamilyDraft {
    pub family: String,
    pub name: String,
    pub description: String,
    pub skill_class: String,
    pub kind: SkillKind,
}

/// Build a single level of a family.
pub fn build_skill(
    draft: &SkillFamilyDraft,
    level: i32,
    id: Uuid,
    rules: &RulesConfig,
) -> RuleResult<Skill> {
    let cost = compute_skill_cost_with(level, draft.kind, rules)?;
    Ok(Skill {
        id,
        family: draft.family.clone(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        skill_class: draft.skill_class.clone(),
        kind: draft.kind,
        level,
        battle_cost: cost.battle_cost,
        civil_cost: cost.civil_cost,
        reputation_requirement: cost.reputation_requirement,
    })
}

fn require_names(draft: &SkillFamilyDraft) -> RuleResult<()> {
    if draft.name.trim().is_empty() {
        return Err(RuleError::EmptyName {
            field: "skill name",
        });
    }
    if draft.family.trim().is_empty() {
        return Err(RuleError::EmptyName {
            field: "skill family",
        });
    }
    Ok(())
}

/// Build all ten levels of a family. `next_id` supplies an identity per level.
pub fn build_skill_family(
    draft: &SkillFamilyDraft,
    rules: &RulesConfig,
    mut next_id: impl FnMut() -> Uuid,
) -> RuleResult<Vec<Skill>> {
    require_names(draft)?;
    (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL)
        .map(|level| build_skill(draft, level, next_id(), rules))
        .collect()
}

/// Rewrite the descriptive fields of an existing family, keeping ids,
/// levels and costs derived from the (possibly changed) kind.
pub fn apply_family_update(
    skills: &[Skill],
    draft: &SkillFamilyDraft,
    rules: &RulesConfig,
) -> RuleResult<Vec<Skill>> {
    require_names(draft)?;
    skills
        .iter()
        .map(|s| build_skill(draft, s.level, s.id, rules))
        .collect()
}

/// Find the skill one level above `current` within its family.
pub fn next_level_of<'a>(current: &Skill, family: &'a [Skill]) -> RuleResult<&'a Skill> {
    if current.level >= MAX_SKILL_LEVEL {
        return Err(RuleError::MaxLevelReached {
            item: current.item_ref(),
        });
    }
    let next = current.level + 1;
    family
        .iter()
        .find(|s| s.family == current.family && s.level == next)
        .ok_or_else(|| {
            RuleError::not_found(
                crate::error::EntityKind::SkillFamily,
                format!("{} level {next}", current.family),
            )
        })
}

/// One entry per family: its lowest level present. Used for catalog
/// listings that show each family once.
pub fn unique_families(skills: &[Skill]) -> Vec<&Skill> {
    let mut out: Vec<&Skill> = Vec::new();
    for skill in skills {
        match out
            .iter_mut()
            .find(|s| s.family == skill.family && s.name == skill.name)
        {
            Some(existing) if skill.level < existing.level => *existing = skill,
            Some(_) => {}
            None => out.push(skill),
        }
    }
    out
}
