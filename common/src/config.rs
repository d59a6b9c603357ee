// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder secret shipped in `Settings::default()` and `config/default.toml`
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub auth: AuthConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where scheduler metadata is read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Quartz `sched_name` to filter on
    #[serde(default = "default_scheduler_name")]
    pub scheduler_name: String,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    pub database: Option<DatabaseConfig>,
    pub http: Option<HttpSourceConfig>,
    pub snapshot_path: Option<String>,
}

fn default_scheduler_name() -> String {
    "MetabaseScheduler".to_string()
}

fn default_table_prefix() -> String {
    "qrtz_".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Postgres,
    Http,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

fn default_http_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
}

fn default_auth_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
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

        if self.source.scheduler_name.is_empty() {
            return Err("Source scheduler_name cannot be empty".to_string());
        }

        match self.source.kind {
            SourceKind::Postgres => {
                let database = self.source.database.as_ref().ok_or_else(|| {
                    "Database configuration required when source kind is 'postgres'".to_string()
                })?;
                if database.url.is_empty() {
                    return Err("Database URL cannot be empty".to_string());
                }
                if database.max_connections == 0 {
                    return Err("Database max_connections must be greater than 0".to_string());
                }
            }
            SourceKind::Http => {
                let http = self.source.http.as_ref().ok_or_else(|| {
                    "HTTP source configuration required when source kind is 'http'".to_string()
                })?;
                if http.base_url.is_empty() {
                    return Err("HTTP source base_url cannot be empty".to_string());
                }
                if http.timeout_seconds == 0 {
                    return Err("HTTP source timeout_seconds must be greater than 0".to_string());
                }
            }
            SourceKind::File => {
                let path = self.source.snapshot_path.as_deref().unwrap_or_default();
                if path.is_empty() {
                    return Err("snapshot_path required when source kind is 'file'".to_string());
                }
            }
        }

        if self.auth.enabled && self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }

        if self.uses_default_jwt_secret() {
            tracing::warn!("Auth is enabled with the default JWT secret; set auth.jwt_secret");
        }

        Ok(())
    }

    /// True when auth is on but still signed with the shipped placeholder secret
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.auth.enabled && self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            source: SourceConfig {
                kind: SourceKind::Postgres,
                scheduler_name: default_scheduler_name(),
                table_prefix: default_table_prefix(),
                database: Some(DatabaseConfig {
                    url: "postgresql://localhost/metabase".to_string(),
                    max_connections: 10,
                    min_connections: 2,
                    connect_timeout_seconds: 30,
                }),
                http: None,
                snapshot_path: None,
            },
            auth: AuthConfig {
                enabled: true,
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expiration_hours: 24,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                tracing_endpoint: None,
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
        if let Some(database) = settings.source.database.as_mut() {
            database.url = String::new();
        }
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_http_kind_without_config() {
        let mut settings = Settings::default();
        settings.source.kind = SourceKind::Http;
        settings.source.http = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_file_kind_without_path() {
        let mut settings = Settings::default();
        settings.source.kind = SourceKind::File;
        assert!(settings.validate().is_err());

        settings.source.snapshot_path = Some("snapshot.json".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_secret_allowed_when_auth_disabled() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = String::new();
        assert!(settings.validate().is_err());

        settings.auth.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_jwt_secret_is_flagged() {
        let mut settings = Settings::default();
        assert!(settings.uses_default_jwt_secret());
        // Still valid: the placeholder only warns
        assert!(settings.validate().is_ok());

        settings.auth.enabled = false;
        assert!(!settings.uses_default_jwt_secret());

        settings.auth.enabled = true;
        settings.auth.jwt_secret = "a-real-secret".to_string();
        assert!(!settings.uses_default_jwt_secret());
    }
}
