//! Reputation and point-budget gating of skill, implant and weapon
//! assignment.
//!
//! # Algorithm
//!
//! 1. **Reputation gate**: every candidate whose reputation requirement
//!    exceeds the character's reputation is rejected.
//! 2. **Target set**: the relation set after the change, either the
//!    candidates alone ([`AssignmentMode::Replace`]) or current ∪ candidates
//!    ([`AssignmentMode::Merge`]). Duplicates collapse, so applying the
//!    same request twice gives the same set.
//! 3. **Slot limits**: implants per body slot are capped.
//! 4. **Budget gate**: for each pool the item kind draws on, the cost of
//!    the whole target set must fit the pool derived from the character
//!    snapshot taken before the change. Costs are summed once; they are
//!    never checked one at a time against a shrinking budget.
//!
//! Nothing is written here. A rejection leaves no trace; an acceptance
//! returns the [`AssignmentResult`] for the store to commit.
//!
//! ```
//! use nightcity_logic::budget::{validate_assignment, AssignmentMode};
//! use nightcity_logic::catalog::{Character, Implant, ImplantSlot};
//! use nightcity_logic::config::RulesConfig;
//! use nightcity_logic::error::ErrorKind;
//! use uuid::Uuid;
//!
//! let character = Character {
//!     id: Uuid::new_v4(),
//!     owner_id: Uuid::new_v4(),
//!     name: "Dex".into(),
//!     age: 35,
//!     reputation: 10,
//!     character_class: String::new(),
//! };
//! let implant = Implant {
//!     id: Uuid::new_v4(),
//!     name: "Sandevistan".into(),
//!     slot: ImplantSlot::OperatingSystem,
//!     description: "Time dilation".into(),
//!     reputation_requirement: 0,
//!     implant_points_cost: 100,
//!     special_implant_points_cost: 0,
//! };
//! let err = validate_assignment(
//!     &character,
//!     &[],
//!     &[implant],
//!     AssignmentMode::Merge,
//!     &RulesConfig::default(),
//! )
//! .unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InsufficientPoints);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{AssignedItems, Character, Implant, ImplantSlot, Skill, SkillKind, Weapon};
use crate::config::{RulesConfig, MIN_SKILL_LEVEL};
use crate::error::{EntityKind, ItemRef, PointPool, RuleError, RuleResult};
use crate::ports::Catalog;
use crate::skills::next_level_of;
use crate::stats::{derive_stats_with, DerivedStats};

/// Which relation of a character an assignment touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentKind {
    Skills,
    Implants,
    Weapons,
}

impl AssignmentKind {
    /// Skills and implants are only ever added to; weapon loadouts are
    /// swapped as a whole.
    pub fn default_mode(self) -> AssignmentMode {
        match self {
            AssignmentKind::Skills | AssignmentKind::Implants => AssignmentMode::Merge,
            AssignmentKind::Weapons => AssignmentMode::Replace,
        }
    }
}

/// How candidates combine with what the character already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentMode {
    /// Target set is exactly the candidates.
    Replace,
    /// Target set is current ∪ candidates.
    Merge,
}

/// Points a target set consumes from one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpend {
    pub pool: PointPool,
    pub spent: i64,
    pub available: i64,
}

impl PoolSpend {
    pub fn remaining(&self) -> i64 {
        self.available - self.spent
    }
}

/// Accepted assignment: the relation set to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub kind: AssignmentKind,
    /// Full relation set after the change, current items first.
    pub target: Vec<Uuid>,
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    pub spend: Vec<PoolSpend>,
}

impl AssignmentResult {
    /// True when committing would not change the stored relation.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Something a character can acquire.
pub trait Assignable {
    const KIND: AssignmentKind;
    /// Pools the item kind draws on, in check order.
    const POOLS: &'static [PointPool];

    fn id(&self) -> Uuid;
    fn item_ref(&self) -> ItemRef;
    fn reputation_requirement(&self) -> i32;
    fn cost_in(&self, pool: PointPool) -> i32;

    fn slot(&self) -> Option<ImplantSlot> {
        None
    }
}

impl Assignable for Skill {
    const KIND: AssignmentKind = AssignmentKind::Skills;
    const POOLS: &'static [PointPool] = &[PointPool::Battle, PointPool::Civil];

    fn id(&self) -> Uuid {
        self.id
    }

    fn item_ref(&self) -> ItemRef {
        ItemRef::Skill(self.id)
    }

    fn reputation_requirement(&self) -> i32 {
        self.reputation_requirement
    }

    fn cost_in(&self, pool: PointPool) -> i32 {
        match (pool, self.kind) {
            (PointPool::Battle, SkillKind::Battle) => self.battle_cost,
            (PointPool::Civil, SkillKind::Civil) => self.civil_cost,
            _ => 0,
        }
    }
}

impl Assignable for Implant {
    const KIND: AssignmentKind = AssignmentKind::Implants;
    const POOLS: &'static [PointPool] = &[PointPool::Implant, PointPool::SpecialImplant];

    fn id(&self) -> Uuid {
        self.id
    }

    fn item_ref(&self) -> ItemRef {
        ItemRef::Implant(self.id)
    }

    fn reputation_requirement(&self) -> i32 {
        self.reputation_requirement
    }

    fn cost_in(&self, pool: PointPool) -> i32 {
        match pool {
            PointPool::Implant => self.implant_points_cost,
            PointPool::SpecialImplant => self.special_implant_points_cost,
            _ => 0,
        }
    }

    fn slot(&self) -> Option<ImplantSlot> {
        Some(self.slot)
    }
}

impl Assignable for Weapon {
    const KIND: AssignmentKind = AssignmentKind::Weapons;
    const POOLS: &'static [PointPool] = &[];

    fn id(&self) -> Uuid {
        self.id
    }

    fn item_ref(&self) -> ItemRef {
        ItemRef::Weapon(self.id)
    }

    fn reputation_requirement(&self) -> i32 {
        self.reputation_requirement
    }

    fn cost_in(&self, _pool: PointPool) -> i32 {
        0
    }
}

fn check_reputation<T: Assignable>(character: &Character, item: &T) -> RuleResult<()> {
    let required = item.reputation_requirement();
    if character.reputation < required {
        return Err(RuleError::InsufficientReputation {
            item: item.item_ref(),
            required,
            actual: character.reputation,
        });
    }
    Ok(())
}

fn build_target<'a, T: Assignable>(
    current: &'a [T],
    candidates: &'a [T],
    mode: AssignmentMode,
) -> Vec<&'a T> {
    let base = match mode {
        AssignmentMode::Replace => &current[..0],
        AssignmentMode::Merge => current,
    };
    let mut seen = HashSet::new();
    base.iter()
        .chain(candidates)
        .filter(|item| seen.insert(item.id()))
        .collect()
}

fn check_slots<T: Assignable>(target: &[&T]) -> RuleResult<()> {
    let mut counts: BTreeMap<ImplantSlot, u32> = BTreeMap::new();
    for slot in target.iter().filter_map(|item| item.slot()) {
        *counts.entry(slot).or_default() += 1;
    }
    for (slot, requested) in counts {
        if let Some(limit) = slot.limit() {
            if requested > limit {
                return Err(RuleError::SlotLimitExceeded {
                    slot,
                    limit,
                    requested,
                });
            }
        }
    }
    Ok(())
}

/// Sum target costs per pool against the pre-change snapshot.
///
/// Sums are kept in `i64`: costs are only bounded below, and a target set
/// of `i32`-sized costs cannot overflow it.
fn check_budget<T: Assignable>(stats: &DerivedStats, target: &[&T]) -> RuleResult<Vec<PoolSpend>> {
    let mut spend = Vec::with_capacity(T::POOLS.len());
    for &pool in T::POOLS {
        let available = i64::from(stats.pool(pool));
        let mut spent: i64 = 0;
        let mut first_over = None;
        for item in target {
            spent = spent.saturating_add(i64::from(item.cost_in(pool)));
            if spent > available && first_over.is_none() {
                first_over = Some(item.item_ref());
            }
        }
        if let Some(item) = first_over {
            return Err(RuleError::InsufficientPoints {
                item,
                pool,
                required: spent,
                available,
                shortfall: spent.saturating_sub(available),
            });
        }
        spend.push(PoolSpend {
            pool,
            spent,
            available,
        });
    }
    Ok(spend)
}

fn build_result<T: Assignable>(
    current: &[T],
    target: &[&T],
    spend: Vec<PoolSpend>,
) -> AssignmentResult {
    let current_ids: HashSet<Uuid> = current.iter().map(Assignable::id).collect();
    let target_ids: Vec<Uuid> = target.iter().map(|item| item.id()).collect();
    let target_set: HashSet<Uuid> = target_ids.iter().copied().collect();
    AssignmentResult {
        kind: T::KIND,
        added: target_ids
            .iter()
            .copied()
            .filter(|id| !current_ids.contains(id))
            .collect(),
        removed: current
            .iter()
            .map(Assignable::id)
            .filter(|id| !target_set.contains(id))
            .collect(),
        target: target_ids,
        spend,
    }
}

/// Decide whether `candidates` may be attached to `character`.
pub fn validate_assignment<T: Assignable>(
    character: &Character,
    current: &[T],
    candidates: &[T],
    mode: AssignmentMode,
    rules: &RulesConfig,
) -> RuleResult<AssignmentResult> {
    for item in candidates {
        check_reputation(character, item)?;
    }
    let target = build_target(current, candidates, mode);
    check_slots(&target)?;
    let stats = derive_stats_with(character.age, character.reputation, rules);
    let spend = check_budget(&stats, &target)?;
    let result = build_result(current, &target, spend);
    log::debug!(
        "character {}: {:?} accepted, {} added, {} removed",
        character.id,
        result.kind,
        result.added.len(),
        result.removed.len()
    );
    Ok(result)
}

/// Candidate ids for one relation, as submitted by a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub kind: AssignmentKind,
    pub ids: Vec<Uuid>,
    /// Defaults to [`AssignmentKind::default_mode`].
    #[serde(default)]
    pub mode: Option<AssignmentMode>,
}

impl AssignmentRequest {
    pub fn new(kind: AssignmentKind, ids: Vec<Uuid>) -> Self {
        Self {
            kind,
            ids,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: AssignmentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn effective_mode(&self) -> AssignmentMode {
        self.mode.unwrap_or_else(|| self.kind.default_mode())
    }
}

fn resolve<T>(
    ids: &[Uuid],
    entity: EntityKind,
    lookup: impl Fn(Uuid) -> Option<T>,
) -> RuleResult<Vec<T>> {
    ids.iter()
        .map(|&id| lookup(id).ok_or_else(|| RuleError::not_found(entity, id)))
        .collect()
}

/// Resolve candidate ids through the catalog, then validate.
///
/// All ids are resolved before any gate runs, so an unknown id is
/// reported as `NotFound` regardless of its position.
pub fn validate_and_build_assignment<C: Catalog + ?Sized>(
    character: &Character,
    current: &AssignedItems,
    request: &AssignmentRequest,
    catalog: &C,
    rules: &RulesConfig,
) -> RuleResult<AssignmentResult> {
    let mode = request.effective_mode();
    match request.kind {
        AssignmentKind::Skills => {
            let candidates = resolve(&request.ids, EntityKind::Skill, |id| catalog.skill(id))?;
            validate_assignment(character, &current.skills, &candidates, mode, rules)
        }
        AssignmentKind::Implants => {
            let candidates =
                resolve(&request.ids, EntityKind::Implant, |id| catalog.implant(id))?;
            validate_assignment(character, &current.implants, &candidates, mode, rules)
        }
        AssignmentKind::Weapons => {
            let candidates = resolve(&request.ids, EntityKind::Weapon, |id| catalog.weapon(id))?;
            validate_assignment(character, &current.weapons, &candidates, mode, rules)
        }
    }
}

/// First skill pick for a fresh character: level 1 only, once.
pub fn plan_initial_skills(
    character: &Character,
    current: &[Skill],
    candidates: &[Skill],
    rules: &RulesConfig,
) -> RuleResult<AssignmentResult> {
    if !current.is_empty() {
        return Err(RuleError::SkillsAlreadyChosen);
    }
    if let Some(skill) = candidates.iter().find(|s| s.level != MIN_SKILL_LEVEL) {
        return Err(RuleError::NotInitialLevel {
            item: skill.item_ref(),
            level: skill.level,
        });
    }
    validate_assignment(character, current, candidates, AssignmentMode::Merge, rules)
}

/// Swap each listed skill for the next level of its family.
///
/// The budget is checked over the whole resulting skill set, so the
/// upgrade is charged the difference between the two levels.
pub fn plan_skill_upgrade<C: Catalog + ?Sized>(
    character: &Character,
    current: &[Skill],
    skill_ids: &[Uuid],
    catalog: &C,
    rules: &RulesConfig,
) -> RuleResult<AssignmentResult> {
    let mut upgraded: Vec<Skill> = current.to_vec();
    for &id in skill_ids {
        let Some(pos) = upgraded.iter().position(|s| s.id == id) else {
            return Err(match catalog.skill(id) {
                Some(_) => RuleError::SkillNotAssigned {
                    item: ItemRef::Skill(id),
                },
                None => RuleError::not_found(EntityKind::Skill, id),
            });
        };
        let family = catalog.skill_family(&upgraded[pos].family);
        let next = next_level_of(&upgraded[pos], &family)?.clone();
        check_reputation(character, &next)?;
        upgraded[pos] = next;
    }

    let target: Vec<&Skill> = upgraded.iter().collect();
    let stats = derive_stats_with(character.age, character.reputation, rules);
    let spend = check_budget(&stats, &target)?;
    Ok(build_result(current, &target, spend))
}
