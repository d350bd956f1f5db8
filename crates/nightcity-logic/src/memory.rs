//! In-process store implementing every port.
//!
//! Backs the unit/integration tests and the headless harness. Each
//! `&mut self` call is atomic by construction, which is the guarantee a
//! real database must provide for [`CharacterStore::commit_assignment`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::{AssignmentKind, AssignmentResult};
use crate::catalog::{AssignedItems, Character, Implant, Skill, Weapon};
use crate::error::{EntityKind, ItemRef, RuleError, RuleResult};
use crate::ports::{Catalog, CatalogStore, CharacterStore};

/// Serializable catalog contents, e.g. a seed data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub implants: Vec<Implant>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
}

#[derive(Debug, Clone, Default)]
struct Relations {
    skills: Vec<Uuid>,
    implants: Vec<Uuid>,
    weapons: Vec<Uuid>,
}

impl Relations {
    fn get(&self, kind: AssignmentKind) -> &Vec<Uuid> {
        match kind {
            AssignmentKind::Skills => &self.skills,
            AssignmentKind::Implants => &self.implants,
            AssignmentKind::Weapons => &self.weapons,
        }
    }

    fn get_mut(&mut self, kind: AssignmentKind) -> &mut Vec<Uuid> {
        match kind {
            AssignmentKind::Skills => &mut self.skills,
            AssignmentKind::Implants => &mut self.implants,
            AssignmentKind::Weapons => &mut self.weapons,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    characters: HashMap<Uuid, Character>,
    relations: HashMap<Uuid, Relations>,
    skills: HashMap<Uuid, Skill>,
    implants: HashMap<Uuid, Implant>,
    weapons: HashMap<Uuid, Weapon>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut store = Self::new();
        store.skills = snapshot.skills.into_iter().map(|s| (s.id, s)).collect();
        store.implants = snapshot.implants.into_iter().map(|i| (i.id, i)).collect();
        store.weapons = snapshot.weapons.into_iter().map(|w| (w.id, w)).collect();
        store
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn implants(&self) -> impl Iterator<Item = &Implant> {
        self.implants.values()
    }

    pub fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.values()
    }

    /// Stored relation ids of one character.
    pub fn relation_ids(&self, character_id: Uuid, kind: AssignmentKind) -> Vec<Uuid> {
        self.relations
            .get(&character_id)
            .map(|r| r.get(kind).clone())
            .unwrap_or_default()
    }
}

impl Catalog for InMemoryStore {
    fn skill(&self, id: Uuid) -> Option<Skill> {
        self.skills.get(&id).cloned()
    }

    fn implant(&self, id: Uuid) -> Option<Implant> {
        self.implants.get(&id).cloned()
    }

    fn weapon(&self, id: Uuid) -> Option<Weapon> {
        self.weapons.get(&id).cloned()
    }

    fn skill_family(&self, family: &str) -> Vec<Skill> {
        let mut skills: Vec<Skill> = self
            .skills
            .values()
            .filter(|s| s.family == family)
            .cloned()
            .collect();
        skills.sort_by_key(|s| s.level);
        skills
    }

    fn referencing_count(&self, item: ItemRef) -> usize {
        let (kind, id) = match item {
            ItemRef::Skill(id) => (AssignmentKind::Skills, id),
            ItemRef::Implant(id) => (AssignmentKind::Implants, id),
            ItemRef::Weapon(id) => (AssignmentKind::Weapons, id),
        };
        self.relations
            .values()
            .filter(|r| r.get(kind).contains(&id))
            .count()
    }
}

impl CatalogStore for InMemoryStore {
    fn save_skill(&mut self, skill: Skill) -> RuleResult<()> {
        self.skills.insert(skill.id, skill);
        Ok(())
    }

    fn save_implant(&mut self, implant: Implant) -> RuleResult<()> {
        self.implants.insert(implant.id, implant);
        Ok(())
    }

    fn save_weapon(&mut self, weapon: Weapon) -> RuleResult<()> {
        self.weapons.insert(weapon.id, weapon);
        Ok(())
    }

    fn delete_item(&mut self, item: ItemRef) -> RuleResult<()> {
        let removed = match item {
            ItemRef::Skill(id) => self.skills.remove(&id).is_some(),
            ItemRef::Implant(id) => self.implants.remove(&id).is_some(),
            ItemRef::Weapon(id) => self.weapons.remove(&id).is_some(),
        };
        if !removed {
            let entity = match item {
                ItemRef::Skill(_) => EntityKind::Skill,
                ItemRef::Implant(_) => EntityKind::Implant,
                ItemRef::Weapon(_) => EntityKind::Weapon,
            };
            return Err(RuleError::not_found(entity, item.id()));
        }
        Ok(())
    }
}

impl CharacterStore for InMemoryStore {
    fn load_character(&self, id: Uuid) -> RuleResult<Character> {
        self.characters
            .get(&id)
            .cloned()
            .ok_or_else(|| RuleError::not_found(EntityKind::Character, id))
    }

    fn load_assigned_items(&self, id: Uuid) -> RuleResult<AssignedItems> {
        if !self.characters.contains_key(&id) {
            return Err(RuleError::not_found(EntityKind::Character, id));
        }
        let Some(rel) = self.relations.get(&id) else {
            return Ok(AssignedItems::default());
        };
        Ok(AssignedItems {
            skills: rel
                .skills
                .iter()
                .filter_map(|id| self.skills.get(id).cloned())
                .collect(),
            implants: rel
                .implants
                .iter()
                .filter_map(|id| self.implants.get(id).cloned())
                .collect(),
            weapons: rel
                .weapons
                .iter()
                .filter_map(|id| self.weapons.get(id).cloned())
                .collect(),
        })
    }

    fn name_taken(&self, name: &str) -> bool {
        self.characters.values().any(|c| c.name == name)
    }

    fn save_character(&mut self, character: Character) -> RuleResult<()> {
        self.characters.insert(character.id, character);
        Ok(())
    }

    fn delete_character(&mut self, id: Uuid) -> RuleResult<()> {
        if self.characters.remove(&id).is_none() {
            return Err(RuleError::not_found(EntityKind::Character, id));
        }
        self.relations.remove(&id);
        Ok(())
    }

    fn commit_assignment(
        &mut self,
        character_id: Uuid,
        expected: &[Uuid],
        result: &AssignmentResult,
    ) -> RuleResult<()> {
        if !self.characters.contains_key(&character_id) {
            return Err(RuleError::not_found(EntityKind::Character, character_id));
        }
        let rel = self.relations.entry(character_id).or_default();
        let stored: BTreeSet<&Uuid> = rel.get(result.kind).iter().collect();
        let seen: BTreeSet<&Uuid> = expected.iter().collect();
        if stored != seen {
            return Err(RuleError::ConcurrentModification {
                character: character_id,
            });
        }
        *rel.get_mut(result.kind) = result.target.clone();
        Ok(())
    }
}
