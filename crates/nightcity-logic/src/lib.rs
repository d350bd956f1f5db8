//! Character progression rules for the Night City tabletop RPG.
//!
//! This crate holds every rule that decides what a character may acquire:
//! point pools derived from age and reputation, skill level costs, the
//! reputation and budget gates on assignment, and the ownership and
//! referential guards around mutation and deletion. Functions take plain
//! data and return results; persistence and authentication are reached
//! only through the traits in [`ports`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`access`] | Owner/admin authorization and in-use deletion guard |
//! | [`budget`] | Reputation, slot and point-budget gating of assignments |
//! | [`catalog`] | Characters, skills, implants, weapons and their validation |
//! | [`config`] | Tier tables, level costs and creation limits (`RulesConfig`) |
//! | [`error`] | Rule error taxonomy and its HTTP status mapping |
//! | [`memory`] | In-process store implementing every port |
//! | [`ports`] | Catalog, character store and actor traits |
//! | [`service`] | Request orchestration: load, authorize, validate, commit |
//! | [`skills`] | Skill level costs and skill family construction |
//! | [`stats`] | Implant, special implant, battle and civil point derivation |
//! | [`tiers`] | Step-function lookup tables |

pub mod access;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod skills;
pub mod stats;
pub mod tiers;

pub use error::{ErrorKind, RuleError, RuleResult};
pub use service::ProgressionService;
