//! Ownership and referential guards.
//!
//! Who may change what:
//!
//! | Action | Allowed for |
//! |--------|-------------|
//! | Mutate a character (skills, implants, weapons, delete) | Owner, admin |
//! | Create / update / delete catalog items | Admin |
//! | Grant reputation | Admin |
//!
//! The acting user is passed in explicitly as an [`Actor`]; nothing here
//! looks at ambient request state.
//!
//! Catalog items can only be deleted once no character references them.
//! The guard only blocks: it never unlinks characters and never
//! soft-deletes.
//!
//! ```
//! use nightcity_logic::access::{authorize_deletion, Actor};
//! use nightcity_logic::error::{ErrorKind, ItemRef};
//! use uuid::Uuid;
//!
//! let implant = ItemRef::Implant(Uuid::new_v4());
//! assert!(authorize_deletion(implant, 0).is_ok());
//! assert_eq!(authorize_deletion(implant, 1).unwrap_err().kind(), ErrorKind::InUse);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Character;
use crate::error::{ItemRef, RuleError, RuleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    Admin,
}

/// The authenticated user performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn player(id: Uuid) -> Self {
        Self {
            id,
            roles: BTreeSet::from([Role::Player]),
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            roles: BTreeSet::from([Role::Player, Role::Admin]),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Owner or admin may mutate a character.
pub fn authorize_mutation(actor: &Actor, character: &Character) -> RuleResult<()> {
    if actor.id == character.owner_id || actor.is_admin() {
        return Ok(());
    }
    Err(RuleError::Unauthorized {
        actor: actor.id,
        character: character.id,
    })
}

/// Catalog and reputation changes are admin-only.
pub fn authorize_admin(actor: &Actor) -> RuleResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(RuleError::AdminRequired { actor: actor.id })
    }
}

/// An item may be deleted only when nothing references it.
pub fn authorize_deletion(item: ItemRef, referencing_count: usize) -> RuleResult<()> {
    if referencing_count > 0 {
        return Err(RuleError::InUse {
            item,
            references: referencing_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn character_owned_by(owner: Uuid) -> Character {
        Character {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "V".into(),
            age: 22,
            reputation: 0,
            character_class: String::new(),
        }
    }

    #[test]
    fn owner_may_mutate() {
        let owner = Uuid::new_v4();
        let c = character_owned_by(owner);
        assert!(authorize_mutation(&Actor::player(owner), &c).is_ok());
    }

    #[test]
    fn stranger_may_not_mutate() {
        let a = Actor::player(Uuid::new_v4());
        let c = character_owned_by(Uuid::new_v4());
        let err = authorize_mutation(&a, &c).unwrap_err();
        assert_eq!(
            err,
            RuleError::Unauthorized {
                actor: a.id,
                character: c.id
            }
        );
        assert_eq!(err.kind().http_status(), 403);
    }

    #[test]
    fn admin_may_mutate_any_character() {
        let c = character_owned_by(Uuid::new_v4());
        assert!(authorize_mutation(&Actor::admin(Uuid::new_v4()), &c).is_ok());
    }

    #[test]
    fn admin_gate() {
        assert!(authorize_admin(&Actor::admin(Uuid::new_v4())).is_ok());
        let err = authorize_admin(&Actor::player(Uuid::new_v4())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn referenced_item_cannot_be_deleted() {
        let item = ItemRef::Weapon(Uuid::new_v4());
        assert_eq!(
            authorize_deletion(item, 3),
            Err(RuleError::InUse {
                item,
                references: 3
            })
        );
        assert!(authorize_deletion(item, 0).is_ok());
    }
}
