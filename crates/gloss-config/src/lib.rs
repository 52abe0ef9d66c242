//! # gloss-config
//!
//! Layered configuration loading for the glossary service using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GLOSSARY_*` prefix, `__` as separator)
//! 2. Project-level `.glossary/config.toml`
//! 3. User-level `~/.config/glossary/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GLOSSARY_DATABASE__PATH` -> `database.path`,
//! `GLOSSARY_GENERAL__DEFAULT_LIMIT` -> `general.default_limit`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use gloss_config::GlossConfig;
//!
//! let config = GlossConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod database;
mod error;
mod general;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlossConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl GlossConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`GlossConfig::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`GlossConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so callers can layer extra providers (e.g. CLI flags) on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".glossary/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("GLOSSARY_").split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.general.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.default_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("glossary").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_loads() {
        let config = GlossConfig::default();
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.general.default_limit, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_project_file() {
        Jail::expect_with(|jail| {
            jail.create_dir(".glossary")?;
            jail.create_file(
                ".glossary/config.toml",
                r#"
                [database]
                path = "project.db"
                pool_size = 2

                [general]
                default_limit = 50
                "#,
            )?;
            jail.set_env("GLOSSARY_DATABASE__POOL_SIZE", "8");

            let config: GlossConfig = GlossConfig::figment().extract()?;
            assert_eq!(config.database.path, "project.db");
            assert_eq!(config.database.pool_size, 8);
            assert_eq!(config.database.busy_timeout_ms, 5_000);
            assert_eq!(config.general.default_limit, 50);
            Ok(())
        });
    }

    #[test]
    fn zero_limit_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("GLOSSARY_GENERAL__DEFAULT_LIMIT", "0");
            let err = GlossConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "general.default_limit"));
            Ok(())
        });
    }
}
