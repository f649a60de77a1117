use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::filter::FilterParameters;

pub const DEFAULT_GITLAB_API_URL: &str = "https://gitlab.com/api/v4/projects";

/// Main configuration structure for forge-indexer
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// GitLab listing endpoint and credentials
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Repository acceptance thresholds
    #[serde(default)]
    pub filters: FilterParameters,

    /// Host loop settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitLab configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitLabConfig {
    /// Projects listing endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Personal access token (overridden by GITLAB_PERSONAL_TOKEN)
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Host loop configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunnerConfig {
    /// Key under which the cursor is stored
    #[serde(default = "default_indexer_name")]
    pub indexer_name: String,

    /// Seconds to wait after the listing is exhausted
    #[serde(default = "default_idle_delay")]
    pub idle_delay_secs: u64,

    /// Seconds to wait before retrying a failed crawl
    #[serde(default = "default_error_delay")]
    pub error_delay_secs: u64,

    /// SQLite database holding the cursor and processed ids
    #[serde(default = "default_state_db")]
    pub state_db: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_base_url() -> String {
    DEFAULT_GITLAB_API_URL.to_string()
}
fn default_timeout() -> u64 {
    3
}
fn default_indexer_name() -> String {
    "gitlab".to_string()
}
fn default_idle_delay() -> u64 {
    60
}
fn default_error_delay() -> u64 {
    10
}
fn default_state_db() -> String {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        format!("{}/forge-indexer/state.db", data_home)
    } else if let Ok(home) = std::env::var("HOME") {
        format!("{}/.local/share/forge-indexer/state.db", home)
    } else {
        "/tmp/forge-indexer-state.db".to_string()
    }
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            indexer_name: default_indexer_name(),
            idle_delay_secs: default_idle_delay(),
            error_delay_secs: default_error_delay(),
            state_db: default_state_db(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Environment variables that override file settings
pub mod env_vars {
    pub const TOKEN: &str = "GITLAB_PERSONAL_TOKEN";
    pub const MIN_STARS: &str = "MIN_STARS";
    pub const MIN_FORKS: &str = "MIN_FORKS";
    pub const MAX_INACTIVITY: &str = "MAX_INACTIVITY_IN_DAYS";
    pub const ERROR_DELAY: &str = "RMQ_REJECTED_PUBLISH_DELAY";
}

fn parse_env<T: std::str::FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value,
    })
}

impl Config {
    /// Load from `path` if given, else the default location if it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default()?,
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                let mut config = Self::default();
                config.expand_paths()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        config.expand_paths()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("forge-indexer").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<(), ConfigError> {
        self.runner.state_db = shellexpand::full(&self.runner.state_db)
            .map_err(|_| ConfigError::Expand(self.runner.state_db.clone()))?
            .into_owned();
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(env_vars::TOKEN) {
            self.gitlab.token = Some(token);
        }
        if let Some(value) = lookup(env_vars::MIN_STARS) {
            self.filters.min_stars = Some(parse_env(env_vars::MIN_STARS, value)?);
        }
        if let Some(value) = lookup(env_vars::MIN_FORKS) {
            self.filters.min_forks = Some(parse_env(env_vars::MIN_FORKS, value)?);
        }
        if let Some(value) = lookup(env_vars::MAX_INACTIVITY) {
            self.filters.max_inactivity_days = Some(parse_env(env_vars::MAX_INACTIVITY, value)?);
        }
        if let Some(value) = lookup(env_vars::ERROR_DELAY) {
            self.runner.error_delay_secs = parse_env(env_vars::ERROR_DELAY, value)?;
        }
        Ok(())
    }

    /// Check everything a crawl needs is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.gitlab.token {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(ConfigError::MissingToken),
        }
    }

    /// Copy of this config safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.gitlab.token.is_some() {
            config.gitlab.token = Some("<redacted>".to_string());
        }
        config
    }
}
