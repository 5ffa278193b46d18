//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `MEETCORE__SECTION__KEY` environment variables.

use crate::domain::meeting::MeetingKind;
use ::config::{ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub persistence: PersistenceConfig,
    pub sync: SyncConfig,
    pub meetings: MeetingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Write-behind behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Extra attempts after a failed remote write. 0 disables retries.
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingConfig {
    pub one_on_one_limit: u32,
    pub group_limit: u32,
    pub webinar_limit: u32,
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::Memory,
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost/meetcore".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,   // 10 minutes
            max_lifetime_secs: 1800,  // 30 minutes
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_backoff_ms: 250,
        }
    }
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            one_on_one_limit: 2,
            group_limit: 25,
            webinar_limit: 500,
            event_capacity: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,meetcore=debug".to_string(),
        }
    }
}

impl MeetingConfig {
    /// Attendee limit used when a draft does not name one
    pub fn default_limit(&self, kind: MeetingKind) -> u32 {
        match kind {
            MeetingKind::OneOnOne => self.one_on_one_limit,
            MeetingKind::Group => self.group_limit,
            MeetingKind::Webinar => self.webinar_limit,
        }
    }
}

impl Config {
    /// Load from an optional TOML file and the environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix("MEETCORE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?)
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("one_on_one_limit", self.meetings.one_on_one_limit),
            ("group_limit", self.meetings.group_limit),
            ("webinar_limit", self.meetings.webinar_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Message(format!(
                    "meetings.{} must be at least 1",
                    name
                )));
            }
        }

        if self.meetings.event_capacity == 0 {
            return Err(ConfigError::Message(
                "meetings.event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
        assert_eq!(config.sync.max_retries, 0);
        assert_eq!(config.meetings.default_limit(MeetingKind::OneOnOne), 2);
        assert_eq!(config.meetings.default_limit(MeetingKind::Webinar), 500);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = Config::from_toml(
            r#"
            [persistence]
            backend = "postgres"

            [sync]
            max_retries = 3

            [meetings]
            group_limit = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.persistence.backend, PersistenceBackend::Postgres);
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync.retry_backoff_ms, 250);
        assert_eq!(config.meetings.group_limit, 12);
        assert_eq!(config.meetings.one_on_one_limit, 2);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = Config::from_toml(
            r#"
            [meetings]
            webinar_limit = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_layers_file_then_env() {
        let path = std::env::temp_dir().join(format!("meetcore-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [sync]
            max_retries = 2

            [meetings]
            group_limit = 12
            "#,
        )
        .unwrap();

        std::env::set_var("MEETCORE__MEETINGS__GROUP_LIMIT", "30");
        let layered = Config::load(path.to_str());
        std::env::remove_var("MEETCORE__MEETINGS__GROUP_LIMIT");
        std::fs::remove_file(&path).unwrap();

        let config = layered.unwrap();
        assert_eq!(config.sync.max_retries, 2);
        assert_eq!(config.meetings.group_limit, 30);
        assert_eq!(config.meetings.webinar_limit, 500);

        // a missing file is not an error
        let config = Config::load(Some("/nonexistent/meetcore.toml")).unwrap();
        assert_eq!(config.meetings.group_limit, 25);
    }
}
