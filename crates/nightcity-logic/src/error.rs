//! Rule violations raised by the progression engine.
//!
//! Every rejection carries enough structured detail (item, shortfall,
//! thresholds) for a transport layer to build a user-facing message.
//! [`RuleError::kind`] collapses a rejection into a fieldless [`ErrorKind`]
//! for status-code mapping.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a catalog item taking part in a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemRef {
    Skill(Uuid),
    Implant(Uuid),
    Weapon(Uuid),
}

impl ItemRef {
    pub fn id(&self) -> Uuid {
        match self {
            ItemRef::Skill(id) | ItemRef::Implant(id) | ItemRef::Weapon(id) => *id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Skill(id) => write!(f, "skill {id}"),
            ItemRef::Implant(id) => write!(f, "implant {id}"),
            ItemRef::Weapon(id) => write!(f, "weapon {id}"),
        }
    }
}

/// A spendable point pool on a character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointPool {
    Implant,
    SpecialImplant,
    Battle,
    Civil,
}

impl fmt::Display for PointPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointPool::Implant => "implant points",
            PointPool::SpecialImplant => "special implant points",
            PointPool::Battle => "battle points",
            PointPool::Civil => "civil points",
        };
        f.write_str(name)
    }
}

/// Kind of entity a lookup was performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Skill,
    SkillFamily,
    Implant,
    Weapon,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Character => "character",
            EntityKind::Skill => "skill",
            EntityKind::SkillFamily => "skill family",
            EntityKind::Implant => "implant",
            EntityKind::Weapon => "weapon",
        };
        f.write_str(name)
    }
}

/// Why the engine refused a request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("skill level must be between 1 and 10, got {level}")]
    InvalidLevel { level: i32 },
    #[error("{field} must not be negative, got {value}")]
    InvalidNegativeValue { field: &'static str, value: i64 },
    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },
    #[error("age must be between 1 and {max}, got {age}")]
    InvalidAge { age: u32, max: u32 },
    #[error("starting reputation may not exceed {max}, got {reputation}")]
    ReputationAboveStartingCap { reputation: i32, max: i32 },
    #[error("a character named {name:?} already exists")]
    DuplicateName { name: String },
    #[error("{item} requires reputation {required}, character has {actual}")]
    InsufficientReputation {
        item: ItemRef,
        required: i32,
        actual: i32,
    },
    #[error("not enough {pool} for {item}: need {required}, have {available} (short by {shortfall})")]
    InsufficientPoints {
        item: ItemRef,
        pool: PointPool,
        required: i64,
        available: i64,
        shortfall: i64,
    },
    #[error("{slot} slot holds at most {limit} implants, requested {requested}")]
    SlotLimitExceeded {
        slot: crate::catalog::ImplantSlot,
        limit: u32,
        requested: u32,
    },
    #[error("starting skills have already been chosen")]
    SkillsAlreadyChosen,
    #[error("only level 1 skills may be chosen at start, {item} is level {level}")]
    NotInitialLevel { item: ItemRef, level: i32 },
    #[error("{item} is already at the maximum level")]
    MaxLevelReached { item: ItemRef },
    #[error("character does not have {item}")]
    SkillNotAssigned { item: ItemRef },
    #[error("actor {actor} may not modify character {character}")]
    Unauthorized { actor: Uuid, character: Uuid },
    #[error("actor {actor} is not an administrator")]
    AdminRequired { actor: Uuid },
    #[error("{item} is still used by {references} character(s)")]
    InUse { item: ItemRef, references: usize },
    #[error("{entity} {key} not found")]
    NotFound { entity: EntityKind, key: String },
    #[error("assignments of character {character} changed since they were read")]
    ConcurrentModification { character: Uuid },
}

impl RuleError {
    pub fn not_found(entity: EntityKind, key: impl fmt::Display) -> Self {
        RuleError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Fieldless category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleError::InvalidLevel { .. } => ErrorKind::InvalidLevel,
            RuleError::InvalidNegativeValue { .. } => ErrorKind::InvalidNegativeValue,
            RuleError::EmptyName { .. } => ErrorKind::EmptyName,
            RuleError::InvalidAge { .. } => ErrorKind::InvalidAge,
            RuleError::ReputationAboveStartingCap { .. } => ErrorKind::ReputationAboveStartingCap,
            RuleError::DuplicateName { .. } => ErrorKind::DuplicateName,
            RuleError::InsufficientReputation { .. } => ErrorKind::InsufficientReputation,
            RuleError::InsufficientPoints { .. } => ErrorKind::InsufficientPoints,
            RuleError::SlotLimitExceeded { .. } => ErrorKind::SlotLimitExceeded,
            RuleError::SkillsAlreadyChosen => ErrorKind::SkillsAlreadyChosen,
            RuleError::NotInitialLevel { .. } => ErrorKind::NotInitialLevel,
            RuleError::MaxLevelReached { .. } => ErrorKind::MaxLevelReached,
            RuleError::SkillNotAssigned { .. } => ErrorKind::SkillNotAssigned,
            RuleError::Unauthorized { .. } | RuleError::AdminRequired { .. } => {
                ErrorKind::Unauthorized
            }
            RuleError::InUse { .. } => ErrorKind::InUse,
            RuleError::NotFound { .. } => ErrorKind::NotFound,
            RuleError::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
        }
    }
}

/// Stable, fieldless error tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidLevel,
    InvalidNegativeValue,
    EmptyName,
    InvalidAge,
    ReputationAboveStartingCap,
    DuplicateName,
    InsufficientReputation,
    InsufficientPoints,
    SlotLimitExceeded,
    SkillsAlreadyChosen,
    NotInitialLevel,
    MaxLevelReached,
    SkillNotAssigned,
    Unauthorized,
    InUse,
    NotFound,
    ConcurrentModification,
}

impl ErrorKind {
    /// HTTP status a transport layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::ConcurrentModification => 409,
            ErrorKind::InUse | ErrorKind::DuplicateName => 422,
            _ => 400,
        }
    }
}

pub type RuleResult<T> = Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorKind::InvalidLevel.http_status(), 400);
        assert_eq!(ErrorKind::InsufficientPoints.http_status(), 400);
        assert_eq!(ErrorKind::Unauthorized.http_status(), 403);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::InUse.http_status(), 422);
    }

    #[test]
    fn admin_required_maps_to_unauthorized() {
        let err = RuleError::AdminRequired { actor: Uuid::nil() };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn points_message_names_shortfall() {
        let err = RuleError::InsufficientPoints {
            item: ItemRef::Implant(Uuid::nil()),
            pool: PointPool::Implant,
            required: 100,
            available: 7,
            shortfall: 93,
        };
        let msg = err.to_string();
        assert!(msg.contains("implant points"), "{msg}");
        assert!(msg.contains("short by 93"), "{msg}");
    }
}
