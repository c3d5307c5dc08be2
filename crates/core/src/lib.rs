//! Domain layer of the catalog edit engine.
//!
//! Everything here is pure: entity models, the per-kind edit diff payloads
//! and their translators, precondition validators, the vote closing policy,
//! and the narrow repository traits ([`store`]) that persistence backends
//! implement. No module in this crate performs I/O.

#[macro_use]
mod macros;

pub mod attributes;
pub mod diff;
pub mod edit;
pub mod error;
pub mod fuzzy_date;
pub mod notification;
pub mod notify;
pub mod performer;
pub mod query;
pub mod redirect;
pub mod relations;
pub mod roles;
pub mod scene;
pub mod store;
pub mod studio;
pub mod tag;
pub mod types;
pub mod validation;
pub mod voting;
