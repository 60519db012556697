//! Configuration management for the warehouse tracking server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DEPO_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Storage backend selection
    pub storage: StorageConfig,

    /// Warehouse behaviour
    pub warehouse: WarehouseSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    Postgres,
    /// Non-persistent store for local runs and demos
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub driver: StorageDriver,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseSettings {
    /// Location returned and received stock is placed in
    pub default_location: String,

    /// Attempts per ledger mutation before giving up on concurrent updates
    pub max_update_attempts: u32,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            default_location: "Ana Depo".to_string(),
            max_update_attempts: 3,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("DEPO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("storage.driver", "postgres")?
            .set_default("warehouse.default_location", "Ana Depo")?
            .set_default("warehouse.max_update_attempts", 3)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DEPO_ prefix)
            .add_source(
                Environment::with_prefix("DEPO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.driver == StorageDriver::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres storage driver".to_string(),
            ));
        }
        if self.warehouse.max_update_attempts == 0 {
            return Err(ConfigError::Message(
                "warehouse.max_update_attempts must be at least 1".to_string(),
            ));
        }
        if self.warehouse.default_location.trim().is_empty() {
            return Err(ConfigError::Message(
                "warehouse.default_location cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
