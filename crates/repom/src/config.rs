//! Environment-driven configuration for database sessions and logging

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

/// Connection pool configuration for a database session
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
    pub test_before_acquire: bool,
}

impl DatabaseConfig {
    /// Create a configuration for `url` with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: Some(600),  // 10 minutes
            max_lifetime_secs: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; pool settings fall back to defaults:
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `REPOM_DB_MAX_CONNECTIONS` | `max_connections` |
    /// | `REPOM_DB_MIN_CONNECTIONS` | `min_connections` |
    /// | `REPOM_DB_ACQUIRE_TIMEOUT` | `acquire_timeout_secs` |
    /// | `REPOM_DB_IDLE_TIMEOUT` | `idle_timeout_secs` (`0` disables) |
    /// | `REPOM_DB_MAX_LIFETIME` | `max_lifetime_secs` (`0` disables) |
    /// | `REPOM_DB_TEST_BEFORE_ACQUIRE` | `test_before_acquire` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar {
            var: "DATABASE_URL".to_string(),
        })?;
        let mut config = Self::new(url);

        if let Some(max) = parse_env::<u32>("REPOM_DB_MAX_CONNECTIONS", "positive integer")? {
            config.max_connections = max;
        }
        if let Some(min) = parse_env::<u32>("REPOM_DB_MIN_CONNECTIONS", "integer")? {
            config.min_connections = min;
        }
        if let Some(timeout) = parse_env::<u64>("REPOM_DB_ACQUIRE_TIMEOUT", "seconds")? {
            config.acquire_timeout_secs = timeout;
        }
        if let Some(idle) = parse_env::<u64>("REPOM_DB_IDLE_TIMEOUT", "seconds")? {
            config.idle_timeout_secs = (idle > 0).then_some(idle);
        }
        if let Some(lifetime) = parse_env::<u64>("REPOM_DB_MAX_LIFETIME", "seconds")? {
            config.max_lifetime_secs = (lifetime > 0).then_some(lifetime);
        }
        if let Some(test) = parse_env::<bool>("REPOM_DB_TEST_BEFORE_ACQUIRE", "true or false")? {
            config.test_before_acquire = test;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                var: "DATABASE_URL".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue {
                field: "min_connections".to_string(),
                value: self.min_connections.to_string(),
                expected: format!("at most max_connections ({})", self.max_connections),
            });
        }
        Ok(())
    }

    /// The database URL with credentials stripped, safe for logs
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: s.to_string(),
                expected: "plain or json".to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug")
    pub level: String,
    pub format: LogFormat,
    /// Directive string such as "repom=debug,sqlx=warn"; overrides `level`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Load from `REPOM_LOG` (filter directives) and `REPOM_LOG_FORMAT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(filter) = env::var("REPOM_LOG") {
            config.env_filter = Some(filter);
        }
        if let Ok(format) = env::var("REPOM_LOG_FORMAT") {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    /// Filter directives used to build the subscriber
    pub fn directives(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

fn parse_env<T: FromStr>(var: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: var.to_string(),
                value: raw,
                expected: expected.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
