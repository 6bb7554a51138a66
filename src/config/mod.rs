//! Settings resolution: optional TOML file with environment overrides.
//!
//! File location comes from `LEXDESK_CONFIG` (default `lexdesk.toml`, absent
//! is fine). Every field can be overridden by a `LEXDESK_*` env var; `.env`
//! files are honored via `dotenvy`.

mod helpers;

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;
use helpers::{optional_env, parse_bool_env, parse_string_env};

pub const DEFAULT_DB_PATH: &str = "data/lexdesk.db";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
    pub url: Option<String>,
    pub migrate_on_connect: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            url: None,
            migrate_on_connect: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::File {
                    path: path.display().to_string(),
                    message: err.to_string(),
                });
            }
        };
        toml::from_str(&raw).map_err(|err| ConfigError::File {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }
}

/// Resolved database configuration handed to `db::connect_from_config`.
#[derive(Debug)]
pub struct DatabaseConfig {
    /// Local database file (also the replica path in remote mode).
    pub db_path: PathBuf,
    /// Remote libSQL URL; when set, the backend runs as a remote replica.
    pub url: Option<String>,
    /// Auth token required alongside `url`.
    pub auth_token: Option<SecretString>,
    pub migrate_on_connect: bool,
}

impl DatabaseConfig {
    /// Resolve from `.env` + settings file + env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config_path =
            optional_env("LEXDESK_CONFIG")?.unwrap_or_else(|| "lexdesk.toml".to_string());
        let settings = Settings::load(Path::new(&config_path))?;
        Self::resolve(&settings)
    }

    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let db_path = parse_string_env("LEXDESK_DB_PATH", settings.database.path.clone())?;
        let url = optional_env("LEXDESK_DB_URL")?.or_else(|| settings.database.url.clone());
        let auth_token = optional_env("LEXDESK_DB_AUTH_TOKEN")?.map(SecretString::from);

        Ok(Self {
            db_path: PathBuf::from(db_path),
            url,
            auth_token,
            migrate_on_connect: parse_bool_env(
                "LEXDESK_DB_MIGRATE",
                settings.database.migrate_on_connect,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DB_PATH, Settings};

    #[test]
    fn settings_default_to_local_database() {
        let settings = Settings::default();
        assert_eq!(settings.database.path, DEFAULT_DB_PATH);
        assert!(settings.database.url.is_none());
        assert!(settings.database.migrate_on_connect);
    }

    #[test]
    fn settings_parse_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [database]
            path = "tmp/office.db"
            "#,
        )
        .expect("valid settings");
        assert_eq!(settings.database.path, "tmp/office.db");
        assert!(settings.database.migrate_on_connect);
    }
}
