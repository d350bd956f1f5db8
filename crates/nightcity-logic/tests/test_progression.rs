//! Integration tests for the progression service.
//!
//! Exercises: character creation → stat derivation → assignment gates →
//! skill upgrades → referential deletion guard, all over the in-memory
//! store.

use nightcity_logic::access::Actor;
use nightcity_logic::budget::{AssignmentKind, AssignmentMode, AssignmentRequest};
use nightcity_logic::catalog::{
    CharacterUpdate, ImplantDraft, ImplantSlot, NewCharacter, SkillKind, WeaponDraft,
};
use nightcity_logic::config::RulesConfig;
use nightcity_logic::error::{ErrorKind, ItemRef, PointPool, RuleError};
use nightcity_logic::memory::InMemoryStore;
use nightcity_logic::ports::{Catalog, CharacterStore};
use nightcity_logic::skills::SkillFamilyDraft;
use nightcity_logic::ProgressionService;
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────────────

struct World {
    service: ProgressionService<InMemoryStore>,
    admin: Actor,
    player: Actor,
}

fn world() -> World {
    World {
        service: ProgressionService::new(InMemoryStore::new(), RulesConfig::default()),
        admin: Actor::admin(Uuid::new_v4()),
        player: Actor::player(Uuid::new_v4()),
    }
}

fn new_character(name: &str, age: u32, reputation: i32) -> NewCharacter {
    NewCharacter {
        name: name.into(),
        age,
        reputation,
        character_class: "Netrunner".into(),
    }
}

fn implant_draft(slot: ImplantSlot, cost: i32, rep: i32) -> ImplantDraft {
    ImplantDraft {
        name: format!("{slot} implant"),
        slot,
        description: "Street-grade chrome".into(),
        reputation_requirement: rep,
        implant_points_cost: cost,
        special_implant_points_cost: 0,
    }
}

fn weapon_draft(rep: i32) -> WeaponDraft {
    WeaponDraft {
        name: "Mantis Blades".into(),
        is_melee: true,
        weapon_type: "Blade".into(),
        penetration: 3,
        reputation_requirement: rep,
    }
}

fn family_draft(family: &str, kind: SkillKind) -> SkillFamilyDraft {
    SkillFamilyDraft {
        family: family.into(),
        name: family.into(),
        description: "test".into(),
        skill_class: "Reflex".into(),
        kind,
    }
}

impl World {
    fn character(&mut self, name: &str, age: u32, reputation: i32) -> Uuid {
        self.service
            .create_character(&self.player, new_character(name, age, reputation))
            .unwrap()
    }

    fn implant(&mut self, slot: ImplantSlot, cost: i32, rep: i32) -> Uuid {
        self.service
            .create_implant(&self.admin, implant_draft(slot, cost, rep))
            .unwrap()
    }

    fn implants_of(&self, character: Uuid) -> Vec<Uuid> {
        self.service
            .store()
            .load_assigned_items(character)
            .unwrap()
            .implants
            .iter()
            .map(|i| i.id)
            .collect()
    }
}

fn implants(ids: Vec<Uuid>) -> AssignmentRequest {
    AssignmentRequest::new(AssignmentKind::Implants, ids)
}

// ── Creation ───────────────────────────────────────────────────────────

#[test]
fn created_character_is_owned_by_actor() {
    let mut w = world();
    let id = w.character("V", 22, 10);
    let sheet = w.service.character_sheet(id).unwrap();
    assert_eq!(sheet.owner_id, w.player.id);
    assert_eq!(sheet.stats.implant_points, 7);
    assert_eq!(sheet.stats.battle_points, 13 + 1 - 4);
    assert_eq!(sheet.stats.civil_points, 13 + 1 - 4);
}

#[test]
fn duplicate_name_rejected() {
    let mut w = world();
    w.character("Judy", 25, 0);
    let err = w
        .service
        .create_character(&w.player, new_character("Judy", 30, 0))
        .unwrap_err();
    assert_eq!(err, RuleError::DuplicateName { name: "Judy".into() });
    assert_eq!(err.kind().http_status(), 422);
}

#[test]
fn creation_limits_enforced() {
    let mut w = world();
    let cases = [
        (new_character("A", 0, 0), ErrorKind::InvalidAge),
        (new_character("B", 101, 0), ErrorKind::InvalidAge),
        (new_character("C", 20, -1), ErrorKind::InvalidNegativeValue),
        (new_character("D", 20, 41), ErrorKind::ReputationAboveStartingCap),
        (new_character("  ", 20, 0), ErrorKind::EmptyName),
    ];
    for (req, kind) in cases {
        let err = w.service.create_character(&w.player, req).unwrap_err();
        assert_eq!(err.kind(), kind);
    }
    assert_eq!(w.service.store().character_count(), 0);
}

#[test]
fn solo_bonus_only_on_sheet() {
    let mut w = world();
    let id = w
        .service
        .create_character(
            &w.player,
            NewCharacter {
                character_class: "Solo".into(),
                ..new_character("Jackie", 30, 40)
            },
        )
        .unwrap();
    w.service.grant_reputation(&w.admin, id, 20).unwrap();
    let sheet = w.service.character_sheet(id).unwrap();
    assert_eq!(sheet.stats.implant_points, 11);
    assert_eq!(sheet.displayed_implant_points, 12);
}

#[test]
fn admin_age_edit_moves_battle_base() {
    let mut w = world();
    let id = w.character("Mox", 25, 20);
    let before = w.service.character_sheet(id).unwrap();

    let update = CharacterUpdate {
        name: "Mox".into(),
        age: 26,
        character_class: "Fixer".into(),
    };
    let after = w.service.update_character(&w.admin, id, update).unwrap();
    assert_eq!(after.stats.battle_points, before.stats.battle_points + 2);
    assert_eq!(after.stats.civil_points, before.stats.civil_points);
    assert_eq!(after.reputation, 20);
    assert_eq!(w.service.character_sheet(id).unwrap(), after);
}

#[test]
fn character_update_rules() {
    let mut w = world();
    let id = w.character("Lizzy", 30, 10);
    w.character("Wissler", 40, 0);
    let update = |name: &str, age| CharacterUpdate {
        name: name.into(),
        age,
        character_class: String::new(),
    };

    let err = w
        .service
        .update_character(&w.player, id, update("Lizzy", 31))
        .unwrap_err();
    assert_eq!(err, RuleError::AdminRequired { actor: w.player.id });
    assert_eq!(
        w.service
            .update_character(&w.admin, id, update("Lizzy", 0))
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidAge
    );
    assert_eq!(
        w.service
            .update_character(&w.admin, id, update("Wissler", 31))
            .unwrap_err(),
        RuleError::DuplicateName {
            name: "Wissler".into()
        }
    );
    // Keeping its own name is not a clash.
    assert!(w
        .service
        .update_character(&w.admin, id, update("Lizzy", 31))
        .is_ok());
    assert_eq!(w.service.character_sheet(id).unwrap().age, 31);
}

// ── Reputation ─────────────────────────────────────────────────────────

#[test]
fn reputation_grant_is_admin_only() {
    let mut w = world();
    let id = w.character("Kerry", 50, 30);
    let err = w
        .service
        .grant_reputation(&w.player, id, 10)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(w.service.grant_reputation(&w.admin, id, 10), Ok(40));
    assert_eq!(w.service.character_sheet(id).unwrap().stats.implant_points, 10);
}

#[test]
fn reputation_cannot_drop_below_zero() {
    let mut w = world();
    let id = w.character("Rogue", 60, 10);
    let err = w
        .service
        .grant_reputation(&w.admin, id, -11)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidNegativeValue);
    assert_eq!(w.service.character_sheet(id).unwrap().reputation, 10);
}

// ── Assignment gates ───────────────────────────────────────────────────

#[test]
fn implant_over_budget_rejected_without_change() {
    let mut w = world();
    let c = w.character("Dex", 35, 10);
    let big = w.implant(ImplantSlot::OperatingSystem, 100, 0);

    let err = w.service.assign(&w.player, c, &implants(vec![big])).unwrap_err();
    assert_eq!(
        err,
        RuleError::InsufficientPoints {
            item: ItemRef::Implant(big),
            pool: PointPool::Implant,
            required: 100,
            available: 7,
            shortfall: 93,
        }
    );
    assert!(w.implants_of(c).is_empty());
}

#[test]
fn reputation_below_requirement_rejected() {
    let mut w = world();
    let c = w.character("Evelyn", 24, 5);
    let gated = w.implant(ImplantSlot::Skin, 1, 10);

    let err = w.service.assign(&w.player, c, &implants(vec![gated])).unwrap_err();
    assert_eq!(
        err,
        RuleError::InsufficientReputation {
            item: ItemRef::Implant(gated),
            required: 10,
            actual: 5
        }
    );
}

#[test]
fn batch_is_all_or_nothing() {
    let mut w = world();
    let c = w.character("Panam", 27, 0);
    let a = w.implant(ImplantSlot::Skin, 4, 0);
    let b = w.implant(ImplantSlot::Palms, 4, 0);

    let err = w
        .service
        .assign(&w.player, c, &implants(vec![a, b]))
        .unwrap_err();
    assert!(matches!(
        err,
        RuleError::InsufficientPoints { item: ItemRef::Implant(id), .. } if id == b
    ));
    assert!(w.implants_of(c).is_empty());

    w.service.assign(&w.player, c, &implants(vec![a])).unwrap();
    assert_eq!(w.implants_of(c), vec![a]);
}

#[test]
fn unknown_candidate_is_not_found() {
    let mut w = world();
    let c = w.character("Saul", 45, 0);
    let err = w
        .service
        .assign(&w.player, c, &implants(vec![Uuid::new_v4()]))
        .unwrap_err();
    assert_eq!(err.kind().http_status(), 404);
}

#[test]
fn repeating_a_request_is_idempotent() {
    let mut w = world();
    let c = w.character("Misty", 28, 20);
    let a = w.implant(ImplantSlot::FrontalLobe, 3, 0);

    let first = w.service.assign(&w.player, c, &implants(vec![a])).unwrap();
    let second = w.service.assign(&w.player, c, &implants(vec![a])).unwrap();
    assert_eq!(first.target, second.target);
    assert!(second.is_noop());
    assert_eq!(w.implants_of(c), vec![a]);
}

#[test]
fn weapons_replace_loadout() {
    let mut w = world();
    let c = w.character("Goro", 40, 30);
    let katana = w.service.create_weapon(&w.admin, weapon_draft(0)).unwrap();
    let pistol = w.service.create_weapon(&w.admin, weapon_draft(20)).unwrap();
    let weapons = |ids| AssignmentRequest::new(AssignmentKind::Weapons, ids);

    w.service.assign(&w.player, c, &weapons(vec![katana])).unwrap();
    let result = w.service.assign(&w.player, c, &weapons(vec![pistol])).unwrap();
    assert_eq!(result.target, vec![pistol]);
    assert_eq!(result.removed, vec![katana]);
}

#[test]
fn stranger_cannot_assign() {
    let mut w = world();
    let c = w.character("Claire", 38, 0);
    let a = w.implant(ImplantSlot::Skin, 1, 0);
    let stranger = Actor::player(Uuid::new_v4());

    let err = w.service.assign(&stranger, c, &implants(vec![a])).unwrap_err();
    assert_eq!(
        err,
        RuleError::Unauthorized {
            actor: stranger.id,
            character: c
        }
    );
    assert!(w.implants_of(c).is_empty());

    // Admins act on anyone's character.
    assert!(w.service.assign(&w.admin, c, &implants(vec![a])).is_ok());
}

#[test]
fn stale_snapshot_is_a_conflict() {
    let mut w = world();
    let c = w.character("River", 42, 20);
    let a = w.implant(ImplantSlot::Skin, 2, 0);
    let b = w.implant(ImplantSlot::Palms, 2, 0);

    let character = w.service.store().load_character(c).unwrap();
    let stale = w.service.store().load_assigned_items(c).unwrap();
    let plan = nightcity_logic::budget::validate_and_build_assignment(
        &character,
        &stale,
        &implants(vec![b]),
        w.service.store(),
        w.service.rules(),
    )
    .unwrap();

    w.service.assign(&w.player, c, &implants(vec![a])).unwrap();

    let mut store = w.service.into_store();
    let err = store.commit_assignment(c, &[], &plan).unwrap_err();
    assert_eq!(err.kind().http_status(), 409);
    assert_eq!(store.relation_ids(c, AssignmentKind::Implants), vec![a]);
}

// ── Skills ─────────────────────────────────────────────────────────────

#[test]
fn initial_pick_then_upgrade() {
    let mut w = world();
    let c = w.character("Jackie", 20, 0); // battle 9, civil 9
    let blades = w
        .service
        .create_skill_family(&w.admin, &family_draft("Blades", SkillKind::Battle))
        .unwrap();
    let talk = w
        .service
        .create_skill_family(&w.admin, &family_draft("Persuasion", SkillKind::Civil))
        .unwrap();

    let picked = w
        .service
        .select_initial_skills(&w.player, c, &[blades[0], talk[0]])
        .unwrap();
    assert_eq!(picked.target, vec![blades[0], talk[0]]);

    let again = w
        .service
        .select_initial_skills(&w.player, c, &[blades[0]])
        .unwrap_err();
    assert_eq!(again, RuleError::SkillsAlreadyChosen);

    let up = w.service.upgrade_skills(&w.player, c, &[blades[0]]).unwrap();
    assert_eq!(up.added, vec![blades[1]]);
    assert_eq!(up.removed, vec![blades[0]]);
    assert_eq!(up.spend[0].pool, PointPool::Battle);
    assert_eq!(up.spend[0].spent, 2);
}

#[test]
fn initial_pick_must_be_level_one() {
    let mut w = world();
    let c = w.character("Viktor", 55, 0);
    let fam = w
        .service
        .create_skill_family(&w.admin, &family_draft("Medtech", SkillKind::Civil))
        .unwrap();
    let err = w
        .service
        .select_initial_skills(&w.player, c, &[fam[2]])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialLevel);
}

#[test]
fn upgrade_past_reputation_gate_rejected() {
    let mut w = world();
    let c = w.character("Rogue", 60, 40); // battle 17
    let fam = w
        .service
        .create_skill_family(&w.admin, &family_draft("Handguns", SkillKind::Battle))
        .unwrap();
    w.service.select_initial_skills(&w.player, c, &[fam[0]]).unwrap();
    for _ in 0..4 {
        let current = w.service.store().relation_ids(c, AssignmentKind::Skills);
        w.service.upgrade_skills(&w.player, c, &current).unwrap();
    }
    assert_eq!(
        w.service.store().relation_ids(c, AssignmentKind::Skills),
        vec![fam[4]]
    );

    // Level 6 needs reputation 70.
    let err = w
        .service
        .upgrade_skills(&w.player, c, &[fam[4]])
        .unwrap_err();
    assert!(matches!(
        err,
        RuleError::InsufficientReputation { required: 70, actual: 40, .. }
    ));
}

#[test]
fn upgrade_of_unheld_skill_rejected() {
    let mut w = world();
    let c = w.character("Takemura", 45, 0);
    let fam = w
        .service
        .create_skill_family(&w.admin, &family_draft("Stealth", SkillKind::Battle))
        .unwrap();
    let err = w
        .service
        .upgrade_skills(&w.player, c, &[fam[0]])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SkillNotAssigned);
}

#[test]
fn family_update_recomputes_costs() {
    let mut w = world();
    let fam = w
        .service
        .create_skill_family(&w.admin, &family_draft("Tech", SkillKind::Battle))
        .unwrap();
    w.service
        .update_skill_family(&w.admin, "Tech", &family_draft("Tech", SkillKind::Civil))
        .unwrap();
    let top = w.service.store().skill(fam[9]).unwrap();
    assert_eq!(top.kind, SkillKind::Civil);
    assert_eq!((top.battle_cost, top.civil_cost), (0, 21));
    assert_eq!(top.reputation_requirement, 200);
}

// ── Catalog administration ─────────────────────────────────────────────

#[test]
fn players_cannot_edit_catalog() {
    let mut w = world();
    let err = w
        .service
        .create_implant(&w.player, implant_draft(ImplantSlot::Arms, 2, 0))
        .unwrap_err();
    assert_eq!(err, RuleError::AdminRequired { actor: w.player.id });
    assert_eq!(w.service.store().implants().count(), 0);
}

#[test]
fn negative_cost_rejected() {
    let mut w = world();
    let err = w
        .service
        .create_implant(&w.admin, implant_draft(ImplantSlot::Arms, -1, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidNegativeValue);
}

#[test]
fn referenced_implant_cannot_be_deleted() {
    let mut w = world();
    let c = w.character("Brigitte", 33, 10);
    let a = w.implant(ImplantSlot::Skin, 2, 0);
    w.service.assign(&w.player, c, &implants(vec![a])).unwrap();

    let err = w
        .service
        .delete_item(&w.admin, ItemRef::Implant(a))
        .unwrap_err();
    assert_eq!(
        err,
        RuleError::InUse {
            item: ItemRef::Implant(a),
            references: 1
        }
    );
    assert!(w.service.store().implant(a).is_some());

    let clear = implants(vec![]).with_mode(AssignmentMode::Replace);
    w.service.assign(&w.player, c, &clear).unwrap();
    w.service.delete_item(&w.admin, ItemRef::Implant(a)).unwrap();
    assert!(w.service.store().implant(a).is_none());
}

#[test]
fn deleting_character_releases_references() {
    let mut w = world();
    let c = w.character("Nix", 29, 10);
    let a = w.implant(ImplantSlot::Skin, 2, 0);
    w.service.assign(&w.player, c, &implants(vec![a])).unwrap();

    w.service.delete_character(&w.player, c).unwrap();
    assert_eq!(
        w.service.character_sheet(c).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(w.service.delete_item(&w.admin, ItemRef::Implant(a)).is_ok());
}

#[test]
fn skill_family_in_use_cannot_be_deleted() {
    let mut w = world();
    let c = w.character("Delamain", 90, 0);
    let fam = w
        .service
        .create_skill_family(&w.admin, &family_draft("Driving", SkillKind::Civil))
        .unwrap();
    w.service.select_initial_skills(&w.player, c, &[fam[0]]).unwrap();

    let err = w
        .service
        .delete_skill_family(&w.admin, "Driving")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InUse);
    assert_eq!(w.service.store().skill_family("Driving").len(), 10);

    w.service.delete_character(&w.admin, c).unwrap();
    w.service.delete_skill_family(&w.admin, "Driving").unwrap();
    assert!(w.service.store().skill_family("Driving").is_empty());
}

#[test]
fn deleting_missing_item_is_not_found() {
    let mut w = world();
    let err = w
        .service
        .delete_item(&w.admin, ItemRef::Weapon(Uuid::new_v4()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
