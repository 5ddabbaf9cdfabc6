//! Storage Layer - SQLite-backed persistence
//!
//! System of record is one SQLite file with prefixed tables:
//! - molecules(id, MoleculeUpacName, SMILES)
//! - inventory(id, MoleculeUpacName, amount, unit)
//! - project(id, name) / task(id, project_id, description, content)
//! - reactions(ReactionID, ...) / reactionparticipants(ReactionID, MoleculeID, Role, ...)
//! - experiments / samples / measurements
//! - time_series(series_id, experiment_id, parameter_name, time_step, value, ...)

mod inventory;
mod lims;
mod molecules;
mod projects;
mod reactions;
pub mod schema;
pub mod seed;
pub mod sqlite;
mod timeseries;

pub use schema::DEFAULT_PREFIX;
pub use seed::SeedSummary;
pub use sqlite::{DbStats, SqliteStore, TableCount};
