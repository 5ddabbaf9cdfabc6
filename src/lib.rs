//! # ChemINF-EDU - chemistry lab records
//!
//! Educational record keeping for a chemistry lab, backed by one SQLite file.
//!
//! ChemINF-EDU provides:
//! - Molecules with SMILES parsing, formula/weight and 2-D depiction
//! - Chemical inventory with stock checks
//! - Projects and tasks
//! - Reactions and their participants
//! - LIMS experiments, samples and measurements
//! - Time-series instrument data with statistics and CSV/XML/JSON/Plotly export
//! - A JSON REST surface and server-rendered pages over the same store

pub mod chem;
pub mod config;
pub mod inventory;
pub mod lims;
pub mod molecule;
pub mod project;
pub mod reaction;
pub mod server;
pub mod storage;
pub mod timeseries;
pub mod ui;

// Re-exports for convenient access
pub use config::Config;
pub use molecule::Molecule;
pub use storage::SqliteStore;

/// Result type alias for ChemINF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ChemINF operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("SMILES error: {0}")]
    Smiles(#[from] chem::SmilesError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound { entity, id: id.to_string() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Classify a SQLite failure: UNIQUE / PRIMARY KEY violations are
    /// conflicts, CHECK, NOT NULL and FOREIGN KEY violations are validation
    /// failures, everything else is a storage error.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| code.to_string());
                return match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Error::Conflict(detail)
                    }
                    _ => Error::Validation(detail),
                };
            }
        }
        Error::Storage(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::from_sqlite(err)
    }
}
