//! Database schema definitions
//!
//! Statements are templates: `{p}` is replaced by the configured table prefix.

use crate::{Error, Result};

pub const DEFAULT_PREFIX: &str = "cheminf3_";

/// Unprefixed table names, parents before children.
pub const TABLES: &[&str] = &[
    "molecules",
    "inventory",
    "project",
    "task",
    "reactions",
    "reactionparticipants",
    "experiments",
    "samples",
    "measurements",
    "time_series",
];

/// SQL to create the molecules table
pub const CREATE_MOLECULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}molecules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    MoleculeUpacName TEXT NOT NULL,
    SMILES TEXT
)
"#;

/// SQL to create the inventory table
pub const CREATE_INVENTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    MoleculeUpacName TEXT NOT NULL UNIQUE,
    amount INTEGER NOT NULL CHECK (amount >= 0),
    unit TEXT
)
"#;

pub const CREATE_PROJECT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}project (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

pub const CREATE_TASK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}task (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    content TEXT,
    FOREIGN KEY (project_id) REFERENCES {p}project(id) ON DELETE CASCADE
)
"#;

pub const CREATE_REACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}reactions (
    ReactionID INTEGER PRIMARY KEY AUTOINCREMENT,
    ReactionName TEXT,
    ReactionDescription TEXT
)
"#;

/// SQL to create the reaction participants table
/// One row per (reaction, molecule, role)
pub const CREATE_REACTION_PARTICIPANTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}reactionparticipants (
    ReactionID INTEGER NOT NULL,
    MoleculeID INTEGER NOT NULL,
    Role TEXT NOT NULL,
    StoichiometricCoefficient REAL NOT NULL DEFAULT 1.0,
    PRIMARY KEY (ReactionID, MoleculeID, Role),
    FOREIGN KEY (ReactionID) REFERENCES {p}reactions(ReactionID),
    FOREIGN KEY (MoleculeID) REFERENCES {p}molecules(id)
)
"#;

pub const CREATE_EXPERIMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}experiments (
    experiment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    experiment_name TEXT NOT NULL,
    description TEXT,
    start_date TEXT,
    end_date TEXT
)
"#;

pub const CREATE_SAMPLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}samples (
    sample_id INTEGER PRIMARY KEY AUTOINCREMENT,
    experiment_id INTEGER,
    sample_code TEXT UNIQUE NOT NULL,
    sample_type TEXT,
    collection_date TEXT,
    FOREIGN KEY (experiment_id) REFERENCES {p}experiments(experiment_id) ON DELETE CASCADE
)
"#;

pub const CREATE_MEASUREMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}measurements (
    measurement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sample_id INTEGER,
    parameter TEXT NOT NULL,
    value REAL NOT NULL,
    unit TEXT,
    measurement_date TEXT,
    FOREIGN KEY (sample_id) REFERENCES {p}samples(sample_id) ON DELETE CASCADE
)
"#;

/// SQL to create the time series table
/// Points of a series share experiment, parameter and unit
pub const CREATE_TIME_SERIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {p}time_series (
    series_id INTEGER PRIMARY KEY AUTOINCREMENT,
    experiment_id INTEGER NOT NULL,
    series_name TEXT,
    parameter_name TEXT NOT NULL,
    time_step INTEGER NOT NULL,
    timestamp TEXT,
    value REAL NOT NULL,
    unit TEXT,
    notes TEXT,
    FOREIGN KEY (experiment_id) REFERENCES {p}experiments(experiment_id) ON DELETE CASCADE
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_{p}task_project ON {p}task(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_{p}participants_molecule ON {p}reactionparticipants(MoleculeID)",
    "CREATE INDEX IF NOT EXISTS idx_{p}samples_experiment ON {p}samples(experiment_id)",
    "CREATE INDEX IF NOT EXISTS idx_{p}measurements_sample ON {p}measurements(sample_id)",
    "CREATE INDEX IF NOT EXISTS idx_{p}time_series_lookup ON {p}time_series(experiment_id, parameter_name, time_step)",
];

/// All schema creation statements for `prefix`
pub fn all_schema_statements(prefix: &str) -> Vec<String> {
    let tables = [
        CREATE_MOLECULES_TABLE,
        CREATE_INVENTORY_TABLE,
        CREATE_PROJECT_TABLE,
        CREATE_TASK_TABLE,
        CREATE_REACTIONS_TABLE,
        CREATE_REACTION_PARTICIPANTS_TABLE,
        CREATE_EXPERIMENTS_TABLE,
        CREATE_SAMPLES_TABLE,
        CREATE_MEASUREMENTS_TABLE,
        CREATE_TIME_SERIES_TABLE,
    ];
    tables
        .iter()
        .chain(CREATE_INDEXES.iter())
        .map(|stmt| stmt.replace("{p}", prefix))
        .collect()
}

/// Table prefixes are spliced into SQL text, so only `[A-Za-z0-9_]` is allowed.
pub fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid table prefix '{prefix}': only letters, digits and '_' are allowed"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_use_prefix() {
        let stmts = all_schema_statements("lab_");
        assert_eq!(stmts.len(), TABLES.len() + CREATE_INDEXES.len());
        assert!(stmts.iter().all(|s| !s.contains("{p}")));
        assert!(stmts[0].contains("lab_molecules"));
        assert!(stmts.iter().any(|s| s.contains("REFERENCES lab_experiments(experiment_id)")));
    }

    #[test]
    fn test_check_prefix() {
        assert!(check_prefix("cheminf3_").is_ok());
        assert!(check_prefix("").is_ok());
        assert!(check_prefix("x; DROP TABLE y").is_err());
        assert!(check_prefix("lab-").is_err());
    }
}
