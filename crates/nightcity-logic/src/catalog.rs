//! Characters and the items they can acquire.
//!
//! These are value snapshots handed to the engine by the store. The
//! engine never mutates them in place; derived points are computed on
//! read by [`crate::stats`] and are deliberately absent from
//! [`Character`].
//!
//! The `validate_*` functions check admin and player input before the
//! store writes anything. Each returns the first problem found.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RulesConfig;
use crate::error::{ItemRef, RuleError, RuleResult};

/// Body slot an implant occupies, with a per-character limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplantSlot {
    FrontalLobe,
    OpticalSystem,
    CirculatorySystem,
    ImmuneSystem,
    NervousSystem,
    OperatingSystem,
    Skin,
    Skeleton,
    Palms,
    Arms,
    Legs,
    Other,
}

impl ImplantSlot {
    pub const ALL: [ImplantSlot; 12] = [
        ImplantSlot::FrontalLobe,
        ImplantSlot::OpticalSystem,
        ImplantSlot::CirculatorySystem,
        ImplantSlot::ImmuneSystem,
        ImplantSlot::NervousSystem,
        ImplantSlot::OperatingSystem,
        ImplantSlot::Skin,
        ImplantSlot::Skeleton,
        ImplantSlot::Palms,
        ImplantSlot::Arms,
        ImplantSlot::Legs,
        ImplantSlot::Other,
    ];

    /// Most implants of this slot one character may carry.
    /// `None` means unlimited.
    pub fn limit(self) -> Option<u32> {
        match self {
            ImplantSlot::FrontalLobe => Some(3),
            ImplantSlot::OpticalSystem => Some(1),
            ImplantSlot::CirculatorySystem => Some(3),
            ImplantSlot::ImmuneSystem => Some(2),
            ImplantSlot::NervousSystem => Some(2),
            ImplantSlot::OperatingSystem => Some(1),
            ImplantSlot::Skin => Some(3),
            ImplantSlot::Skeleton => Some(2),
            ImplantSlot::Palms => Some(2),
            ImplantSlot::Arms => Some(1),
            ImplantSlot::Legs => Some(1),
            ImplantSlot::Other => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ImplantSlot::FrontalLobe => "Frontal lobe",
            ImplantSlot::OpticalSystem => "Optical system",
            ImplantSlot::CirculatorySystem => "Circulatory system",
            ImplantSlot::ImmuneSystem => "Immune system",
            ImplantSlot::NervousSystem => "Nervous system",
            ImplantSlot::OperatingSystem => "Operating system",
            ImplantSlot::Skin => "Skin",
            ImplantSlot::Skeleton => "Skeleton",
            ImplantSlot::Palms => "Palms",
            ImplantSlot::Arms => "Arms",
            ImplantSlot::Legs => "Legs",
            ImplantSlot::Other => "Other",
        }
    }
}

impl fmt::Display for ImplantSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A player character. Points are not stored here; see [`crate::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub age: u32,
    pub reputation: i32,
    #[serde(default)]
    pub character_class: String,
}

/// Whether a skill draws from the battle or the civil pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Battle,
    Civil,
}

impl SkillKind {
    pub fn from_battle_flag(is_battle: bool) -> Self {
        if is_battle {
            SkillKind::Battle
        } else {
            SkillKind::Civil
        }
    }

    pub fn is_battle(self) -> bool {
        self == SkillKind::Battle
    }
}

/// One level of a skill family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub family: String,
    pub name: String,
    pub description: String,
    pub skill_class: String,
    pub kind: SkillKind,
    pub level: i32,
    pub battle_cost: i32,
    pub civil_cost: i32,
    pub reputation_requirement: i32,
}

impl Skill {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Skill(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implant {
    pub id: Uuid,
    pub name: String,
    pub slot: ImplantSlot,
    pub description: String,
    pub reputation_requirement: i32,
    pub implant_points_cost: i32,
    pub special_implant_points_cost: i32,
}

impl Implant {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Implant(self.id)
    }

    /// Implants that draw on the special pool.
    pub fn is_special(&self) -> bool {
        self.special_implant_points_cost > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: Uuid,
    pub is_melee: bool,
    pub name: String,
    pub weapon_type: String,
    pub penetration: i32,
    pub reputation_requirement: i32,
}

impl Weapon {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Weapon(self.id)
    }
}

/// Everything currently attached to one character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedItems {
    pub skills: Vec<Skill>,
    pub implants: Vec<Implant>,
    pub weapons: Vec<Weapon>,
}

impl AssignedItems {
    pub fn skill_ids(&self) -> BTreeSet<Uuid> {
        self.skills.iter().map(|s| s.id).collect()
    }

    pub fn implant_ids(&self) -> BTreeSet<Uuid> {
        self.implants.iter().map(|i| i.id).collect()
    }

    pub fn weapon_ids(&self) -> BTreeSet<Uuid> {
        self.weapons.iter().map(|w| w.id).collect()
    }
}

// ── Input validation ───────────────────────────────────────────────────

/// Fields a player submits to register a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub age: u32,
    pub reputation: i32,
    #[serde(default)]
    pub character_class: String,
}

/// Fields an admin may change on an existing character. Reputation is
/// only changed through a grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterUpdate {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub character_class: String,
}

/// Fields an admin submits to create or update an implant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplantDraft {
    pub name: String,
    pub slot: ImplantSlot,
    pub description: String,
    pub reputation_requirement: i32,
    pub implant_points_cost: i32,
    pub special_implant_points_cost: i32,
}

/// Fields an admin submits to create or update a weapon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDraft {
    pub name: String,
    pub is_melee: bool,
    pub weapon_type: String,
    pub penetration: i32,
    pub reputation_requirement: i32,
}

fn require_name(field: &'static str, value: &str) -> RuleResult<()> {
    if value.trim().is_empty() {
        return Err(RuleError::EmptyName { field });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: i32) -> RuleResult<()> {
    if value < 0 {
        return Err(RuleError::InvalidNegativeValue {
            field,
            value: value.into(),
        });
    }
    Ok(())
}

/// Check a new character against the creation limits.
///
/// Name uniqueness needs the store and is checked by
/// [`crate::service::ProgressionService::create_character`].
pub fn validate_new_character(req: &NewCharacter, rules: &RulesConfig) -> RuleResult<()> {
    require_name("character name", &req.name)?;
    check_age(req.age, rules)?;
    require_non_negative("reputation", req.reputation)?;
    if req.reputation > rules.creation.max_starting_reputation {
        return Err(RuleError::ReputationAboveStartingCap {
            reputation: req.reputation,
            max: rules.creation.max_starting_reputation,
        });
    }
    Ok(())
}

fn check_age(age: u32, rules: &RulesConfig) -> RuleResult<()> {
    if age == 0 || age > rules.creation.max_age {
        return Err(RuleError::InvalidAge {
            age,
            max: rules.creation.max_age,
        });
    }
    Ok(())
}

/// Name and age checks for an admin edit. Uniqueness is checked by
/// [`crate::service::ProgressionService::update_character`].
pub fn validate_character_update(req: &CharacterUpdate, rules: &RulesConfig) -> RuleResult<()> {
    require_name("character name", &req.name)?;
    check_age(req.age, rules)
}

pub fn validate_implant(draft: &ImplantDraft) -> RuleResult<()> {
    require_name("implant name", &draft.name)?;
    require_name("implant description", &draft.description)?;
    require_non_negative("reputation requirement", draft.reputation_requirement)?;
    require_non_negative("implant points cost", draft.implant_points_cost)?;
    require_non_negative(
        "special implant points cost",
        draft.special_implant_points_cost,
    )?;
    Ok(())
}

pub fn validate_weapon(draft: &WeaponDraft) -> RuleResult<()> {
    require_name("weapon name", &draft.name)?;
    require_name("weapon type", &draft.weapon_type)?;
    require_non_negative("penetration", draft.penetration)?;
    require_non_negative("reputation requirement", draft.reputation_requirement)?;
    Ok(())
}

impl ImplantDraft {
    /// Validate and give the draft an identity.
    pub fn into_implant(self, id: Uuid) -> RuleResult<Implant> {
        validate_implant(&self)?;
        Ok(Implant {
            id,
            name: self.name,
            slot: self.slot,
            description: self.description,
            reputation_requirement: self.reputation_requirement,
            implant_points_cost: self.implant_points_cost,
            special_implant_points_cost: self.special_implant_points_cost,
        })
    }
}

impl WeaponDraft {
    pub fn into_weapon(self, id: Uuid) -> RuleResult<Weapon> {
        validate_weapon(&self)?;
        Ok(Weapon {
            id,
            is_melee: self.is_melee,
            name: self.name,
            weapon_type: self.weapon_type,
            penetration: self.penetration,
            reputation_requirement: self.reputation_requirement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_character() -> NewCharacter {
        NewCharacter {
            name: "Jackie Welles".into(),
            age: 30,
            reputation: 10,
            character_class: "Solo".into(),
        }
    }

    fn implant_draft() -> ImplantDraft {
        ImplantDraft {
            name: "Kiroshi Optics".into(),
            slot: ImplantSlot::OpticalSystem,
            description: "Zoom and threat scanning".into(),
            reputation_requirement: 0,
            implant_points_cost: 2,
            special_implant_points_cost: 0,
        }
    }

    fn weapon_draft() -> WeaponDraft {
        WeaponDraft {
            name: "Malorian Arms 3516".into(),
            is_melee: false,
            weapon_type: "Power pistol".into(),
            penetration: 6,
            reputation_requirement: 50,
        }
    }

    #[test]
    fn character_update_checks_name_and_age() {
        let rules = RulesConfig::default();
        let mut req = CharacterUpdate {
            name: "Jackie Welles".into(),
            age: 100,
            character_class: "Solo".into(),
        };
        assert!(validate_character_update(&req, &rules).is_ok());
        req.age = 101;
        assert_eq!(
            validate_character_update(&req, &rules).unwrap_err(),
            RuleError::InvalidAge { age: 101, max: 100 }
        );
        req.age = 30;
        req.name = String::new();
        assert_eq!(
            validate_character_update(&req, &rules).unwrap_err().kind(),
            crate::error::ErrorKind::EmptyName
        );
    }

    #[test]
    fn slot_limits() {
        assert_eq!(ImplantSlot::OpticalSystem.limit(), Some(1));
        assert_eq!(ImplantSlot::FrontalLobe.limit(), Some(3));
        assert_eq!(ImplantSlot::Other.limit(), None);
        assert_eq!(ImplantSlot::ALL.len(), 12);
    }

    #[test]
    fn slot_serde_name() {
        let json = serde_json::to_string(&ImplantSlot::FrontalLobe).unwrap();
        assert_eq!(json, "\"FRONTAL_LOBE\"");
    }

    #[test]
    fn valid_character_passes() {
        validate_new_character(&new_character(), &RulesConfig::default()).unwrap();
    }

    #[test]
    fn character_age_bounds() {
        let rules = RulesConfig::default();
        let mut req = new_character();
        req.age = 0;
        assert_eq!(
            validate_new_character(&req, &rules).unwrap_err(),
            RuleError::InvalidAge { age: 0, max: 100 }
        );
        req.age = 101;
        assert!(matches!(
            validate_new_character(&req, &rules),
            Err(RuleError::InvalidAge { age: 101, .. })
        ));
        req.age = 100;
        assert!(validate_new_character(&req, &rules).is_ok());
    }

    #[test]
    fn character_reputation_bounds() {
        let rules = RulesConfig::default();
        let mut req = new_character();
        req.reputation = -1;
        assert!(matches!(
            validate_new_character(&req, &rules),
            Err(RuleError::InvalidNegativeValue { value: -1, .. })
        ));
        req.reputation = 41;
        assert!(matches!(
            validate_new_character(&req, &rules),
            Err(RuleError::ReputationAboveStartingCap { .. })
        ));
        req.reputation = 40;
        assert!(validate_new_character(&req, &rules).is_ok());
    }

    #[test]
    fn blank_character_name_rejected() {
        let mut req = new_character();
        req.name = "   ".into();
        assert!(matches!(
            validate_new_character(&req, &RulesConfig::default()),
            Err(RuleError::EmptyName { .. })
        ));
    }

    #[test]
    fn implant_validation() {
        assert!(validate_implant(&implant_draft()).is_ok());

        let mut d = implant_draft();
        d.name = String::new();
        assert!(matches!(
            validate_implant(&d),
            Err(RuleError::EmptyName {
                field: "implant name"
            })
        ));

        let mut d = implant_draft();
        d.special_implant_points_cost = -2;
        assert!(matches!(
            validate_implant(&d),
            Err(RuleError::InvalidNegativeValue { value: -2, .. })
        ));
    }

    #[test]
    fn weapon_validation() {
        assert!(validate_weapon(&weapon_draft()).is_ok());

        let mut d = weapon_draft();
        d.penetration = -1;
        assert!(matches!(
            validate_weapon(&d),
            Err(RuleError::InvalidNegativeValue {
                field: "penetration",
                ..
            })
        ));
    }

    #[test]
    fn draft_into_entity_keeps_fields() {
        let id = Uuid::new_v4();
        let implant = implant_draft().into_implant(id).unwrap();
        assert_eq!(implant.id, id);
        assert_eq!(implant.slot, ImplantSlot::OpticalSystem);
        assert!(!implant.is_special());

        let weapon = weapon_draft().into_weapon(id).unwrap();
        assert_eq!(weapon.penetration, 6);
        assert_eq!(weapon.item_ref(), ItemRef::Weapon(id));
    }

    #[test]
    fn skill_kind_flag() {
        assert_eq!(SkillKind::from_battle_flag(true), SkillKind::Battle);
        assert!(!SkillKind::from_battle_flag(false).is_battle());
    }
}
