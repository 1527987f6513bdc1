//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, overlaid with `KEYSTOCK__*` environment variables. Each
//! sub-module represents a logical configuration section.

pub mod app;
pub mod database;
pub mod inventory;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::database::DatabaseConfig;
pub use self::inventory::InventoryConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// configuration (base file + environment overlay + environment variables).
/// Every section has defaults, so an empty source set yields a runnable
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Program/duration vocabularies, owners, and mirror location.
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the base file at `path` (extension optional), an
    /// environment-specific overlay `config/{env}`, and environment
    /// variables prefixed with `KEYSTOCK__`. List-valued inventory keys
    /// accept comma-separated environment values, e.g.
    /// `KEYSTOCK__INVENTORY__OWNERS=1,2,3`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        Self::load_with_vars(path, env, None)
    }

    /// Load configuration, reading `KEYSTOCK__*` variables from `vars`
    /// instead of the process environment when given.
    fn load_with_vars(
        path: &str,
        env: &str,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KEYSTOCK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("inventory.owners")
                    .with_list_parse_key("inventory.programs")
                    .with_list_parse_key("inventory.durations")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.inventory.validate()?;
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must not be empty"));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::configuration(
                "database.min_connections exceeds database.max_connections",
            ));
        }
        Ok(())
    }
}
