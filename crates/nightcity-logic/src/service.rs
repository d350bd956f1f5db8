//! Request-level orchestration over the ports.
//!
//! Each method follows the same shape: load snapshots, authorize the
//! actor, validate, and only then write. Every check runs before the
//! first write, so a rejected request never leaves a partial change.

use uuid::Uuid;

use crate::access::{authorize_admin, authorize_deletion, authorize_mutation, Actor};
use crate::budget::{
    plan_initial_skills, plan_skill_upgrade, validate_and_build_assignment, AssignmentKind,
    AssignmentRequest, AssignmentResult,
};
use crate::catalog::{
    validate_character_update, validate_new_character, Character, CharacterUpdate, ImplantDraft,
    NewCharacter, WeaponDraft,
};
use crate::config::RulesConfig;
use crate::error::{EntityKind, ItemRef, RuleError, RuleResult};
use crate::ports::{CatalogStore, CharacterStore};
use crate::skills::{apply_family_update, build_skill_family, SkillFamilyDraft};
use crate::stats::{character_sheet, CharacterSheet};

pub struct ProgressionService<S> {
    store: S,
    rules: RulesConfig,
}

impl<S> ProgressionService<S>
where
    S: CharacterStore + CatalogStore,
{
    pub fn new(store: S, rules: RulesConfig) -> Self {
        Self { store, rules }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ── Characters ─────────────────────────────────────────────────────

    pub fn create_character(&mut self, actor: &Actor, req: NewCharacter) -> RuleResult<Uuid> {
        validate_new_character(&req, &self.rules)?;
        if self.store.name_taken(&req.name) {
            return Err(RuleError::DuplicateName { name: req.name });
        }
        let character = Character {
            id: Uuid::new_v4(),
            owner_id: actor.id,
            name: req.name,
            age: req.age,
            reputation: req.reputation,
            character_class: req.character_class,
        };
        let id = character.id;
        self.store.save_character(character)?;
        log::info!("character {} created by {}", id, actor.id);
        Ok(id)
    }

    pub fn character_sheet(&self, id: Uuid) -> RuleResult<CharacterSheet> {
        let character = self.store.load_character(id)?;
        Ok(character_sheet(&character, &self.rules))
    }

    /// Admin edit of name, age and class. Stored reputation is kept;
    /// points follow the new age on the next read.
    pub fn update_character(
        &mut self,
        actor: &Actor,
        id: Uuid,
        update: CharacterUpdate,
    ) -> RuleResult<CharacterSheet> {
        authorize_admin(actor)?;
        let mut character = self.store.load_character(id)?;
        validate_character_update(&update, &self.rules)?;
        if update.name != character.name && self.store.name_taken(&update.name) {
            return Err(RuleError::DuplicateName { name: update.name });
        }
        character.name = update.name;
        character.age = update.age;
        character.character_class = update.character_class;
        let sheet = character_sheet(&character, &self.rules);
        self.store.save_character(character)?;
        log::info!("character {} updated by {}", id, actor.id);
        Ok(sheet)
    }

    /// Admin reward. The resulting reputation may not drop below zero.
    pub fn grant_reputation(&mut self, actor: &Actor, id: Uuid, amount: i32) -> RuleResult<i32> {
        authorize_admin(actor)?;
        let mut character = self.store.load_character(id)?;
        let reputation = character.reputation.saturating_add(amount);
        if reputation < 0 {
            return Err(RuleError::InvalidNegativeValue {
                field: "reputation",
                value: reputation.into(),
            });
        }
        character.reputation = reputation;
        self.store.save_character(character)?;
        log::info!("{} granted {} reputation to character {}", actor.id, amount, id);
        Ok(reputation)
    }

    pub fn delete_character(&mut self, actor: &Actor, id: Uuid) -> RuleResult<()> {
        let character = self.store.load_character(id)?;
        authorize_mutation(actor, &character)?;
        self.store.delete_character(id)?;
        log::info!("character {} deleted by {}", id, actor.id);
        Ok(())
    }

    // ── Assignments ────────────────────────────────────────────────────

    /// Validate a candidate set and, when accepted, commit it.
    pub fn assign(
        &mut self,
        actor: &Actor,
        character_id: Uuid,
        request: &AssignmentRequest,
    ) -> RuleResult<AssignmentResult> {
        let character = self.store.load_character(character_id)?;
        authorize_mutation(actor, &character)?;
        let current = self.store.load_assigned_items(character_id)?;
        let result =
            validate_and_build_assignment(&character, &current, request, &self.store, &self.rules)
                .inspect_err(|e| log::warn!("character {character_id}: {e}"))?;
        let expected = match request.kind {
            AssignmentKind::Skills => current.skill_ids(),
            AssignmentKind::Implants => current.implant_ids(),
            AssignmentKind::Weapons => current.weapon_ids(),
        };
        self.commit(character_id, expected.into_iter().collect(), result)
    }

    pub fn select_initial_skills(
        &mut self,
        actor: &Actor,
        character_id: Uuid,
        skill_ids: &[Uuid],
    ) -> RuleResult<AssignmentResult> {
        let character = self.store.load_character(character_id)?;
        authorize_mutation(actor, &character)?;
        let current = self.store.load_assigned_items(character_id)?;
        let candidates = skill_ids
            .iter()
            .map(|&id| {
                self.store
                    .skill(id)
                    .ok_or_else(|| RuleError::not_found(EntityKind::Skill, id))
            })
            .collect::<RuleResult<Vec<_>>>()?;
        let result = plan_initial_skills(&character, &current.skills, &candidates, &self.rules)
            .inspect_err(|e| log::warn!("character {character_id}: {e}"))?;
        self.commit(character_id, current.skill_ids().into_iter().collect(), result)
    }

    pub fn upgrade_skills(
        &mut self,
        actor: &Actor,
        character_id: Uuid,
        skill_ids: &[Uuid],
    ) -> RuleResult<AssignmentResult> {
        let character = self.store.load_character(character_id)?;
        authorize_mutation(actor, &character)?;
        let current = self.store.load_assigned_items(character_id)?;
        let result = plan_skill_upgrade(
            &character,
            &current.skills,
            skill_ids,
            &self.store,
            &self.rules,
        )
        .inspect_err(|e| log::warn!("character {character_id}: {e}"))?;
        self.commit(character_id, current.skill_ids().into_iter().collect(), result)
    }

    fn commit(
        &mut self,
        character_id: Uuid,
        expected: Vec<Uuid>,
        result: AssignmentResult,
    ) -> RuleResult<AssignmentResult> {
        if !result.is_noop() {
            self.store
                .commit_assignment(character_id, &expected, &result)?;
            log::info!(
                "character {}: {:?} now {} item(s)",
                character_id,
                result.kind,
                result.target.len()
            );
        }
        Ok(result)
    }

    // ── Catalog (admin) ────────────────────────────────────────────────

    pub fn create_skill_family(
        &mut self,
        actor: &Actor,
        draft: &SkillFamilyDraft,
    ) -> RuleResult<Vec<Uuid>> {
        authorize_admin(actor)?;
        let skills = build_skill_family(draft, &self.rules, Uuid::new_v4)?;
        let ids = skills.iter().map(|s| s.id).collect();
        for skill in skills {
            self.store.save_skill(skill)?;
        }
        log::info!("skill family {} created", draft.family);
        Ok(ids)
    }

    /// Rewrite every level of `family` from `draft`.
    pub fn update_skill_family(
        &mut self,
        actor: &Actor,
        family: &str,
        draft: &SkillFamilyDraft,
    ) -> RuleResult<()> {
        authorize_admin(actor)?;
        let existing = self.store.skill_family(family);
        if existing.is_empty() {
            return Err(RuleError::not_found(EntityKind::SkillFamily, family));
        }
        for skill in apply_family_update(&existing, draft, &self.rules)? {
            self.store.save_skill(skill)?;
        }
        log::info!("skill family {} updated", family);
        Ok(())
    }

    /// Delete every level of a family; refused if any level is in use.
    pub fn delete_skill_family(&mut self, actor: &Actor, family: &str) -> RuleResult<()> {
        authorize_admin(actor)?;
        let skills = self.store.skill_family(family);
        if skills.is_empty() {
            return Err(RuleError::not_found(EntityKind::SkillFamily, family));
        }
        for skill in &skills {
            let item = skill.item_ref();
            authorize_deletion(item, self.store.referencing_count(item))?;
        }
        for skill in skills {
            self.store.delete_item(skill.item_ref())?;
        }
        log::info!("skill family {} deleted", family);
        Ok(())
    }

    pub fn create_implant(&mut self, actor: &Actor, draft: ImplantDraft) -> RuleResult<Uuid> {
        authorize_admin(actor)?;
        let implant = draft.into_implant(Uuid::new_v4())?;
        let id = implant.id;
        self.store.save_implant(implant)?;
        log::info!("implant {} created", id);
        Ok(id)
    }

    pub fn update_implant(
        &mut self,
        actor: &Actor,
        id: Uuid,
        draft: ImplantDraft,
    ) -> RuleResult<()> {
        authorize_admin(actor)?;
        if self.store.implant(id).is_none() {
            return Err(RuleError::not_found(EntityKind::Implant, id));
        }
        self.store.save_implant(draft.into_implant(id)?)?;
        log::info!("implant {} updated", id);
        Ok(())
    }

    pub fn create_weapon(&mut self, actor: &Actor, draft: WeaponDraft) -> RuleResult<Uuid> {
        authorize_admin(actor)?;
        let weapon = draft.into_weapon(Uuid::new_v4())?;
        let id = weapon.id;
        self.store.save_weapon(weapon)?;
        log::info!("weapon {} created", id);
        Ok(id)
    }

    pub fn update_weapon(&mut self, actor: &Actor, id: Uuid, draft: WeaponDraft) -> RuleResult<()> {
        authorize_admin(actor)?;
        if self.store.weapon(id).is_none() {
            return Err(RuleError::not_found(EntityKind::Weapon, id));
        }
        self.store.save_weapon(draft.into_weapon(id)?)?;
        log::info!("weapon {} updated", id);
        Ok(())
    }

    /// Delete an implant or weapon that no character holds.
    pub fn delete_item(&mut self, actor: &Actor, item: ItemRef) -> RuleResult<()> {
        authorize_admin(actor)?;
        let exists = match item {
            ItemRef::Skill(id) => self.store.skill(id).is_some(),
            ItemRef::Implant(id) => self.store.implant(id).is_some(),
            ItemRef::Weapon(id) => self.store.weapon(id).is_some(),
        };
        if !exists {
            let entity = match item {
                ItemRef::Skill(_) => EntityKind::Skill,
                ItemRef::Implant(_) => EntityKind::Implant,
                ItemRef::Weapon(_) => EntityKind::Weapon,
            };
            return Err(RuleError::not_found(entity, item.id()));
        }
        authorize_deletion(item, self.store.referencing_count(item))
            .inspect_err(|e| log::warn!("refused delete: {e}"))?;
        self.store.delete_item(item)?;
        log::info!("{} deleted by {}", item, actor.id);
        Ok(())
    }
}
