//! Night City Headless Rules Harness
//!
//! Validates the progression rules and the shipped data files without a
//! database. Runs entirely in-process against the in-memory store.
//!
//! Usage:
//!   cargo run -p nightcity-simtest
//!   cargo run -p nightcity-simtest -- --verbose
//!   RUST_LOG=nightcity_logic=debug cargo run -p nightcity-simtest

use std::collections::{BTreeMap, HashSet};

use nightcity_logic::access::{authorize_deletion, Actor};
use nightcity_logic::budget::{AssignmentKind, AssignmentMode, AssignmentRequest};
use nightcity_logic::catalog::{ImplantSlot, NewCharacter, Skill};
use nightcity_logic::config::{RulesConfig, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use nightcity_logic::error::{ErrorKind, ItemRef};
use nightcity_logic::memory::{CatalogSnapshot, InMemoryStore};
use nightcity_logic::ports::{ActorSource, Catalog, CharacterStore};
use nightcity_logic::skills::{compute_skill_cost_with, unique_families};
use nightcity_logic::stats::derive_stats_with;
use nightcity_logic::ProgressionService;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

// ── Data files (same JSON a deployment seeds from) ──────────────────────
const RULES_JSON: &str = include_str!("../../../data/rules.json");
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

const SEED: u64 = 2077;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Fixed actor standing in for an authenticated request.
struct HarnessSession {
    actor: Actor,
}

impl ActorSource for HarnessSession {
    fn current_actor(&self) -> Actor {
        self.actor.clone()
    }
}

fn main() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Night City Rules Harness ===\n");

    let mut results = Vec::new();

    // 1. Rules file
    let rules = match RulesConfig::from_json(RULES_JSON) {
        Ok(rules) => rules,
        Err(e) => {
            println!("  ✗ rules_parse: {}", e);
            std::process::exit(1);
        }
    };
    results.extend(validate_rules_file(&rules, verbose));

    // 2. Catalog file
    let catalog: CatalogSnapshot = match serde_json::from_str(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ catalog_parse: {}", e);
            std::process::exit(1);
        }
    };
    results.extend(validate_catalog(&catalog, &rules, verbose));

    // 3. Stat derivation sweep
    results.extend(validate_stat_sweep(&rules, verbose));

    // 4. Randomized assignment sweep
    results.extend(validate_assignment_sweep(&catalog, &rules, verbose));

    // 5. Skill progression ladder
    results.extend(validate_skill_ladder(&catalog, &rules, verbose));

    // 6. Referential guard
    results.extend(validate_deletion_guard(&catalog, &rules));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Rules File ───────────────────────────────────────────────────────

fn validate_rules_file(rules: &RulesConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Rules File ---");
    let mut results = Vec::new();
    let canonical = RulesConfig::default();

    results.push(TestResult {
        name: "rules_match_canonical_tables".into(),
        passed: rules.implant_points == canonical.implant_points
            && rules.special_implant_points == canonical.special_implant_points
            && rules.battle_base_by_age == canonical.battle_base_by_age
            && rules.skill_levels == canonical.skill_levels,
        detail: "data/rules.json carries the published tables".into(),
    });

    for (name, table) in [
        ("implant", &rules.implant_points),
        ("special_implant", &rules.special_implant_points),
        ("battle_base", &rules.battle_base_by_age),
    ] {
        results.push(TestResult {
            name: format!("rules_{}_non_decreasing", name),
            passed: table.is_non_decreasing(),
            detail: format!("{} tiers", table.tiers().len()),
        });
    }

    // Reputation gates never fall as levels rise
    let gates_rise = rules
        .skill_levels
        .windows(2)
        .all(|w| {
            w[1].reputation_requirement >= w[0].reputation_requirement && w[1].cost > w[0].cost
        });
    results.push(TestResult {
        name: "rules_level_costs_increase".into(),
        passed: gates_rise,
        detail: format!("{} levels", rules.skill_levels.len()),
    });

    if verbose {
        for tier in rules.implant_points.tiers() {
            println!("    implant tier from {:>11}: {}", tier.from, tier.value);
        }
    }

    results
}

// ── 2. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(
    catalog: &CatalogSnapshot,
    rules: &RulesConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    let mut ids = HashSet::new();
    let all_ids = catalog
        .skills
        .iter()
        .map(|s| s.id)
        .chain(catalog.implants.iter().map(|i| i.id))
        .chain(catalog.weapons.iter().map(|w| w.id));
    let duplicates = all_ids.filter(|id| !ids.insert(*id)).count();
    results.push(TestResult {
        name: "catalog_unique_ids".into(),
        passed: duplicates == 0,
        detail: format!("{} ids, {} duplicates", ids.len(), duplicates),
    });

    // Every family has exactly levels 1..=10
    let mut families: BTreeMap<&str, Vec<&Skill>> = BTreeMap::new();
    for skill in &catalog.skills {
        families.entry(skill.family.as_str()).or_default().push(skill);
    }
    for (family, skills) in &families {
        let mut levels: Vec<i32> = skills.iter().map(|s| s.level).collect();
        levels.sort_unstable();
        let expected: Vec<i32> = (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).collect();
        results.push(TestResult {
            name: format!("catalog_family_{}_complete", family),
            passed: levels == expected,
            detail: format!("levels {:?}", levels),
        });
    }

    // Stored costs match the level table
    let mismatched: Vec<String> = catalog
        .skills
        .iter()
        .filter(|s| {
            compute_skill_cost_with(s.level, s.kind, rules).map_or(true, |c| {
                c.battle_cost != s.battle_cost
                    || c.civil_cost != s.civil_cost
                    || c.reputation_requirement != s.reputation_requirement
            })
        })
        .map(|s| format!("{} L{}", s.family, s.level))
        .collect();
    results.push(TestResult {
        name: "catalog_skill_costs_match_table".into(),
        passed: mismatched.is_empty(),
        detail: if mismatched.is_empty() {
            format!("{} skills checked", catalog.skills.len())
        } else {
            format!("mismatched: {}", mismatched.join(", "))
        },
    });

    results.push(TestResult {
        name: "catalog_unique_family_listing".into(),
        passed: unique_families(&catalog.skills).len() == families.len(),
        detail: format!("{} families", families.len()),
    });

    let negative = catalog
        .implants
        .iter()
        .filter(|i| {
            i.implant_points_cost < 0
                || i.special_implant_points_cost < 0
                || i.reputation_requirement < 0
        })
        .count()
        + catalog
            .weapons
            .iter()
            .filter(|w| w.penetration < 0 || w.reputation_requirement < 0)
            .count();
    results.push(TestResult {
        name: "catalog_no_negative_values".into(),
        passed: negative == 0,
        detail: format!(
            "{} implants, {} weapons",
            catalog.implants.len(),
            catalog.weapons.len()
        ),
    });

    if verbose {
        let mut per_slot: BTreeMap<ImplantSlot, usize> = BTreeMap::new();
        for implant in &catalog.implants {
            *per_slot.entry(implant.slot).or_default() += 1;
        }
        for (slot, count) in per_slot {
            println!(
                "    {:<20} {} implant(s), limit {:?}",
                slot.display_name(),
                count,
                slot.limit()
            );
        }
    }

    results
}

// ── 3. Stat Derivation ──────────────────────────────────────────────────

fn age_base(age: u32) -> i32 {
    match age {
        0..=25 => 13,
        26..=40 => 15,
        _ => 17,
    }
}

fn validate_stat_sweep(rules: &RulesConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Stat Derivation ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(SEED);

    let mut monotonic_failures = 0;
    let mut age_failures = 0;
    let samples = 2000;
    for _ in 0..samples {
        let age: u32 = rng.gen_range(1..=120);
        let rep: i32 = rng.gen_range(-500..=500);
        let here = derive_stats_with(age, rep, rules);
        let next = derive_stats_with(age, rep + 1, rules);
        if next.implant_points < here.implant_points
            || next.special_implant_points < here.special_implant_points
            || next.battle_points < here.battle_points
            || next.civil_points < here.civil_points
        {
            monotonic_failures += 1;
        }
        if here.battle_points - here.civil_points != age_base(age) - rules.civil_base {
            age_failures += 1;
        }
    }
    results.push(TestResult {
        name: "stats_monotonic_in_reputation".into(),
        passed: monotonic_failures == 0,
        detail: format!("{} samples, {} regressions", samples, monotonic_failures),
    });
    results.push(TestResult {
        name: "stats_battle_minus_civil_is_age_base".into(),
        passed: age_failures == 0,
        detail: format!("{} samples, {} mismatches", samples, age_failures),
    });

    // Published reference values
    let checks = [
        ((25, 0), (7, 0, 9, 9)),
        ((26, 0), (7, 0, 11, 9)),
        ((41, 59), (10, 0, 18, 14)),
        ((30, -15), (7, 0, 10, 8)),
        ((60, 180), (16, 4, 31, 27)),
    ];
    for ((age, rep), (imp, special, battle, civil)) in checks {
        let s = derive_stats_with(age, rep, rules);
        let got = (
            s.implant_points,
            s.special_implant_points,
            s.battle_points,
            s.civil_points,
        );
        results.push(TestResult {
            name: format!("stats_age{}_rep{}", age, rep),
            passed: got == (imp, special, battle, civil),
            detail: format!("got {:?}", got),
        });
    }

    if verbose {
        for rep in [0, 20, 60, 100, 200] {
            let s = derive_stats_with(30, rep, rules);
            println!("    age 30 rep {:>3}: {:?}", rep, s);
        }
    }

    results
}

// ── 4. Assignment Sweep ─────────────────────────────────────────────────

fn validate_assignment_sweep(
    catalog: &CatalogSnapshot,
    rules: &RulesConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Assignment Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(SEED + 1);

    let admin = HarnessSession {
        actor: Actor::admin(Uuid::new_v4()),
    };
    let player = HarnessSession {
        actor: Actor::player(Uuid::new_v4()),
    };
    let mut service = ProgressionService::new(
        InMemoryStore::from_snapshot(catalog.clone()),
        rules.clone(),
    );
    let implant_ids: Vec<Uuid> = catalog.implants.iter().map(|i| i.id).collect();

    let mut accepted = 0;
    let mut rejections: BTreeMap<ErrorKind, usize> = BTreeMap::new();
    let mut overspent = 0;
    let mut leaked = 0;
    let mut unexpected = Vec::new();

    for i in 0..300 {
        let req = NewCharacter {
            name: format!("edgerunner-{}", i),
            age: rng.gen_range(1..=100),
            reputation: rng.gen_range(0..=40),
            character_class: String::new(),
        };
        let actor = player.current_actor();
        let Ok(id) = service.create_character(&actor, req) else {
            unexpected.push(format!("create #{}", i));
            continue;
        };
        let bonus = rng.gen_range(0..=200);
        if service
            .grant_reputation(&admin.current_actor(), id, bonus)
            .is_err()
        {
            unexpected.push(format!("grant #{}", i));
            continue;
        }

        let count = rng.gen_range(1..=5);
        let picks: Vec<Uuid> = implant_ids
            .choose_multiple(&mut rng, count)
            .copied()
            .collect();
        let request = AssignmentRequest::new(AssignmentKind::Implants, picks)
            .with_mode(AssignmentMode::Replace);

        match service.assign(&actor, id, &request) {
            Ok(result) => {
                accepted += 1;
                if result.spend.iter().any(|s| s.spent > s.available) {
                    overspent += 1;
                }
            }
            Err(e) => {
                *rejections.entry(e.kind()).or_default() += 1;
                if !matches!(
                    e.kind(),
                    ErrorKind::InsufficientPoints
                        | ErrorKind::InsufficientReputation
                        | ErrorKind::SlotLimitExceeded
                ) {
                    unexpected.push(e.to_string());
                }
                let stored = service
                    .store()
                    .load_assigned_items(id)
                    .map(|items| items.implants.len())
                    .unwrap_or(usize::MAX);
                if stored != 0 {
                    leaked += 1;
                }
            }
        }
    }

    results.push(TestResult {
        name: "sweep_accepted_within_budget".into(),
        passed: overspent == 0 && accepted > 0,
        detail: format!("{} accepted, {} overspent", accepted, overspent),
    });
    results.push(TestResult {
        name: "sweep_rejections_leave_no_trace".into(),
        passed: leaked == 0,
        detail: format!(
            "{} rejected, {} left partial state",
            rejections.values().sum::<usize>(),
            leaked
        ),
    });
    results.push(TestResult {
        name: "sweep_only_rule_rejections".into(),
        passed: unexpected.is_empty(),
        detail: if unexpected.is_empty() {
            "every rejection was a budget, reputation or slot rule".into()
        } else {
            unexpected.join("; ")
        },
    });

    if verbose {
        for (kind, n) in &rejections {
            println!("    {:?}: {}", kind, n);
        }
    }

    results
}

// ── 5. Skill Ladder ─────────────────────────────────────────────────────

fn validate_skill_ladder(
    catalog: &CatalogSnapshot,
    rules: &RulesConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Skill Ladder ---");
    let mut results = Vec::new();

    let session = HarnessSession {
        actor: Actor::admin(Uuid::new_v4()),
    };
    let actor = session.current_actor();
    let mut service = ProgressionService::new(
        InMemoryStore::from_snapshot(catalog.clone()),
        rules.clone(),
    );

    let Some(start) = catalog
        .skills
        .iter()
        .find(|s| s.kind.is_battle() && s.level == MIN_SKILL_LEVEL)
    else {
        results.push(TestResult {
            name: "ladder_has_battle_family".into(),
            passed: false,
            detail: "no level 1 battle skill in catalog".into(),
        });
        return results;
    };

    let new = NewCharacter {
        name: "Adam Smasher".into(),
        age: 80,
        reputation: 40,
        character_class: "Solo".into(),
    };
    let Ok(id) = service.create_character(&actor, new) else {
        results.push(TestResult {
            name: "ladder_character_created".into(),
            passed: false,
            detail: "character creation failed".into(),
        });
        return results;
    };
    let _ = service.grant_reputation(&actor, id, 500);

    let mut current = start.id;
    let mut steps = Vec::new();
    let mut outcome = service
        .select_initial_skills(&actor, id, &[current])
        .map(|_| ());
    while outcome.is_ok() {
        match service.upgrade_skills(&actor, id, &[current]) {
            Ok(result) => {
                let spent = result.spend.first().map_or(0, |s| s.spent);
                steps.push(spent);
                match result.added.first() {
                    Some(&next) => current = next,
                    None => break,
                }
            }
            Err(e) => outcome = Err(e),
        }
    }
    let top = service.store().skill(current).map_or(0, |s| s.level);
    let stopped_at_max = matches!(&outcome, Err(e) if e.kind() == ErrorKind::MaxLevelReached);
    let stopped_for_points = matches!(&outcome, Err(e) if e.kind() == ErrorKind::InsufficientPoints);

    results.push(TestResult {
        name: "ladder_stops_on_rule".into(),
        passed: stopped_at_max || stopped_for_points,
        detail: format!("reached level {}, stop: {:?}", top, outcome.err()),
    });
    results.push(TestResult {
        name: "ladder_spend_is_level_cost".into(),
        passed: steps.iter().enumerate().all(|(i, &spent)| {
            rules
                .level_cost(MIN_SKILL_LEVEL + 1 + i as i32)
                .is_some_and(|row| i64::from(row.cost) == spent)
        }),
        detail: format!("spend per step {:?}", steps),
    });

    if verbose {
        if let Ok(sheet) = service.character_sheet(id) {
            println!("    {:?}", sheet.stats);
        }
    }

    results
}

// ── 6. Deletion Guard ───────────────────────────────────────────────────

fn validate_deletion_guard(catalog: &CatalogSnapshot, rules: &RulesConfig) -> Vec<TestResult> {
    println!("--- Deletion Guard ---");
    let mut results = Vec::new();

    let session = HarnessSession {
        actor: Actor::admin(Uuid::new_v4()),
    };
    let actor = session.current_actor();
    let mut service = ProgressionService::new(
        InMemoryStore::from_snapshot(catalog.clone()),
        rules.clone(),
    );

    let Some(weapon) = catalog.weapons.iter().find(|w| w.reputation_requirement == 0) else {
        return results;
    };
    let item = ItemRef::Weapon(weapon.id);

    let created = service.create_character(
        &actor,
        NewCharacter {
            name: "Rogue Amendiares".into(),
            age: 70,
            reputation: 40,
            character_class: String::new(),
        },
    );
    let Ok(id) = created else {
        return results;
    };
    let assigned = service
        .assign(
            &actor,
            id,
            &AssignmentRequest::new(AssignmentKind::Weapons, vec![weapon.id]),
        )
        .is_ok();
    let references = service.store().referencing_count(item);
    let blocked = matches!(
        service.delete_item(&actor, item),
        Err(e) if e.kind() == ErrorKind::InUse
    );
    results.push(TestResult {
        name: "guard_blocks_referenced_delete".into(),
        passed: assigned && blocked && authorize_deletion(item, references).is_err(),
        detail: format!("{} reference(s)", references),
    });

    let released = service.delete_character(&actor, id).is_ok();
    let deleted = service.delete_item(&actor, item).is_ok();
    results.push(TestResult {
        name: "guard_allows_unreferenced_delete".into(),
        passed: released && deleted && service.store().weapon(weapon.id).is_none(),
        detail: "weapon removed after its holder was deleted".into(),
    });

    results
}
