//! Environment-driven configuration.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `APP_ENV` | development | `development`, `test` or `production` |
//! | `DEFAULT_PER_PAGE` | 15 | Page size for list requests without a usable `perPage` |
//!
//! Invalid values are logged and replaced by their defaults.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

pub const APP_ENV_VAR: &str = "APP_ENV";
pub const DEFAULT_PER_PAGE_VAR: &str = "DEFAULT_PER_PAGE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Test => "test",
            AppEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnvironment::Development),
            "test" => Ok(AppEnvironment::Test),
            "production" | "prod" => Ok(AppEnvironment::Production),
            _ => Err(ConfigError::InvalidValue {
                key: APP_ENV_VAR,
                value: s.to_string(),
                reason: "expected development, test or production".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub environment: AppEnvironment,
    pub default_per_page: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::default(),
            default_per_page: domain::DEFAULT_PER_PAGE,
        }
    }
}

impl EnvConfig {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let environment = match lookup(APP_ENV_VAR) {
            Some(raw) => match raw.parse::<AppEnvironment>() {
                Ok(environment) => {
                    info!("Using environment '{}' from {}.", environment, APP_ENV_VAR);
                    environment
                }
                Err(e) => {
                    warn!("{}. Using default environment '{}'.", e, defaults.environment);
                    defaults.environment
                }
            },
            None => defaults.environment,
        };

        let default_per_page = match lookup(DEFAULT_PER_PAGE_VAR) {
            Some(raw) => match parse_per_page(&raw) {
                Ok(per_page) => per_page,
                Err(e) => {
                    warn!("{}. Using default page size {}.", e, defaults.default_per_page);
                    defaults.default_per_page
                }
            },
            None => defaults.default_per_page,
        };

        Self {
            environment,
            default_per_page,
        }
    }
}

fn parse_per_page(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: DEFAULT_PER_PAGE_VAR,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(per_page) => Ok(per_page),
        Err(_) => Err(invalid("not a positive integer")),
    }
}
