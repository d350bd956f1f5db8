//! Boundaries to the collaborators the engine does not own.
//!
//! Persistence and authentication live outside this crate. The engine
//! reaches them only through these traits, which keeps every rule
//! testable against [`crate::memory::InMemoryStore`].

use uuid::Uuid;

use crate::access::Actor;
use crate::budget::AssignmentResult;
use crate::catalog::{AssignedItems, Character, Implant, Skill, Weapon};
use crate::error::{ItemRef, RuleResult};

/// Read access to skills, implants and weapons.
pub trait Catalog {
    fn skill(&self, id: Uuid) -> Option<Skill>;
    fn implant(&self, id: Uuid) -> Option<Implant>;
    fn weapon(&self, id: Uuid) -> Option<Weapon>;

    /// Every level of a family, in any order.
    fn skill_family(&self, family: &str) -> Vec<Skill>;

    /// Number of characters holding `item`.
    fn referencing_count(&self, item: ItemRef) -> usize;
}

/// Admin-side writes to the catalog.
pub trait CatalogStore: Catalog {
    fn save_skill(&mut self, skill: Skill) -> RuleResult<()>;
    fn save_implant(&mut self, implant: Implant) -> RuleResult<()>;
    fn save_weapon(&mut self, weapon: Weapon) -> RuleResult<()>;
    fn delete_item(&mut self, item: ItemRef) -> RuleResult<()>;
}

/// Character persistence.
pub trait CharacterStore {
    /// Fails with `NotFound` for an unknown id.
    fn load_character(&self, id: Uuid) -> RuleResult<Character>;

    fn load_assigned_items(&self, id: Uuid) -> RuleResult<AssignedItems>;

    fn name_taken(&self, name: &str) -> bool;

    fn save_character(&mut self, character: Character) -> RuleResult<()>;

    fn delete_character(&mut self, id: Uuid) -> RuleResult<()>;

    /// Replace one relation set of a character.
    ///
    /// `expected` is the id set the decision was validated against. The
    /// store must compare it with its current state and apply `result`
    /// in the same atomic step, failing with `ConcurrentModification` if
    /// another writer got there first.
    fn commit_assignment(
        &mut self,
        character_id: Uuid,
        expected: &[Uuid],
        result: &AssignmentResult,
    ) -> RuleResult<()>;
}

/// Resolves the authenticated user of the current request.
pub trait ActorSource {
    fn current_actor(&self) -> Actor;
}
