// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub leboncoin: LeboncoinConfig,
    pub scheduler: SchedulerSettings,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlite connection URL, e.g. `sqlite://data.db`
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

/// HTTP Basic credentials protecting the management API.
///
/// When either field is absent every request is rejected, matching the
/// original dashboard behavior of an empty user table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub dashboard_user: Option<String>,
    pub dashboard_pass: Option<String>,
}

/// Credentials and endpoints for the Leboncoin repost executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeboncoinConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// How often the ticker fires, in seconds
    pub tick_interval_seconds: u64,
    /// How long a per-schedule run lease stays valid before a crashed
    /// holder is considered gone, in seconds
    pub lease_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let defaults = Config::try_from(&Settings::default())?;

        let builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.leboncoin.base_url.is_empty() {
            return Err("Leboncoin base_url cannot be empty".to_string());
        }

        if self.scheduler.tick_interval_seconds == 0 {
            return Err("Scheduler tick_interval_seconds must be greater than 0".to_string());
        }
        if self.scheduler.lease_ttl_seconds == 0 {
            return Err("Scheduler lease_ttl_seconds must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://data.db".to_string(),
                max_connections: 5,
                connect_timeout_seconds: 30,
            },
            auth: AuthConfig {
                dashboard_user: None,
                dashboard_pass: None,
            },
            leboncoin: LeboncoinConfig {
                email: None,
                password: None,
                base_url: "https://www.leboncoin.fr".to_string(),
                request_timeout_seconds: 60,
            },
            scheduler: SchedulerSettings {
                tick_interval_seconds: 120,
                lease_ttl_seconds: 900,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_database_url() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_tick_interval() {
        let mut settings = Settings::default();
        settings.scheduler.tick_interval_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let settings = Settings::load_from_path("does-not-exist").unwrap();
        assert_eq!(settings.scheduler.tick_interval_seconds, 120);
        assert_eq!(settings.server.port, 8080);
    }
}
