//! Runtime configuration
//!
//! Resolution order: built-in defaults, then the settings file
//! (`cheminf.json`, or `.toml`), then `CHEMINF_*` environment variables
//! (a `.env` file is read first), then command-line flags.

use crate::storage::schema;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "CHEMINF_DB_PATH";
pub const ENV_DB_PREFIX: &str = "CHEMINF_DB_PREFIX";
pub const ENV_HOST: &str = "CHEMINF_HOST";
pub const ENV_PORT: &str = "CHEMINF_PORT";
pub const ENV_ADMIN_USER: &str = "CHEMINF_ADMIN_USER";
pub const ENV_ADMIN_PASSWORD: &str = "CHEMINF_ADMIN_PASSWORD";
pub const ENV_STATIC_DIR: &str = "CHEMINF_STATIC_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// Prefix of every table name
    pub db_prefix: String,
    pub host: String,
    pub port: u16,
    /// Credentials accepted by the login page
    pub admin_user: String,
    pub admin_password: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("cheminf_edu.db"),
            db_prefix: schema::DEFAULT_PREFIX.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8050,
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("cheminf.json")
}

impl Config {
    /// Load defaults, the settings file and the process environment.
    ///
    /// An explicitly given `path` must exist; the default `cheminf.json` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = default_config_path();
                if default.exists() { Self::from_file(&default)? } else { Self::default() }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a settings file: TOML for `.toml`, JSON otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = if is_toml(path) {
            toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            serde_json::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        };
        Ok(config)
    }

    /// Override fields from `CHEMINF_*` variables as returned by `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_DB_PATH) {
            self.database = PathBuf::from(v);
        }
        // An empty prefix is legal, so this one is not filtered
        if let Some(v) = lookup(ENV_DB_PREFIX) {
            self.db_prefix = v.trim().to_string();
        }
        if let Some(v) = get(ENV_HOST) {
            self.host = v;
        }
        if let Some(v) = get(ENV_PORT) {
            self.port = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_PORT} must be a port number, got '{v}'")))?;
        }
        if let Some(v) = get(ENV_ADMIN_USER) {
            self.admin_user = v;
        }
        if let Some(v) = lookup(ENV_ADMIN_PASSWORD) {
            self.admin_password = v;
        }
        if let Some(v) = get(ENV_STATIC_DIR) {
            self.static_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        schema::check_prefix(&self.db_prefix)?;
        if self.admin_user.trim().is_empty() {
            return Err(Error::Config("admin_user must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Write `config` to `path`, refusing to overwrite unless `force`
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = if is_toml(path) {
        toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?
    } else {
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?
    };
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
