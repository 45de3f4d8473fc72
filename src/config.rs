//! Layered configuration
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `deimos.toml` in the working directory (optional), or an explicit file (required)
//! 3. `DEIMOS__*` environment variables, e.g. `DEIMOS__VM__POLL_INTERVAL_MS=100`
//!
//! A `.env` file, if present, is loaded into the environment first.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FILE: &str = "deimos";
const ENV_PREFIX: &str = "DEIMOS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/* ===================== Settings ===================== */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vm: VmSettings,
    pub supervisor: SupervisorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSettings {
    /// Delay between two polls of a `waitfor` predicate
    pub poll_interval_ms: u64,
}

impl VmSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Delay between two scans of the watched tasks
    pub tick_interval_ms: u64,
}

impl SupervisorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/* ===================== Loading ===================== */

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.vm.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "vm.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.supervisor.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "supervisor.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Read this file instead of `deimos.toml`; it must exist
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Ignore `.env` and `DEIMOS__*` variables
    pub fn skip_env(mut self, skip: bool) -> Self {
        self.skip_env = skip;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?);

        builder = match &self.config_path {
            Some(path) => builder.add_source(::config::File::from(path.as_path()).required(true)),
            None => builder.add_source(::config::File::with_name(DEFAULT_FILE).required(false)),
        };

        if !self.skip_env {
            // A missing .env file is not an error
            let _ = dotenvy::dotenv();
            builder = builder.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.vm.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.supervisor.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config("deimos-override", "[vm]\npoll_interval_ms = 100\n");
        let config = Config::builder()
            .config_path(Some(path.clone()))
            .skip_env(true)
            .build()
            .unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.vm.poll_interval_ms, 100);
        assert_eq!(config.supervisor.tick_interval_ms, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::builder()
            .config_path(Some(PathBuf::from("/nonexistent/deimos.toml")))
            .skip_env(true)
            .build();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let path = write_config("deimos-zero", "[supervisor]\ntick_interval_ms = 0\n");
        let result = Config::builder()
            .config_path(Some(path.clone()))
            .skip_env(true)
            .build();
        std::fs::remove_file(path).ok();

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
