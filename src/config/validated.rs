//! Validated transport configuration.
//!
//! All validation is performed during construction, so a [`ClientConfig`]
//! obtained from [`ClientConfig::load`] or [`ClientConfig::from_toml`] can be
//! turned into a client without further checks.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use http::HeaderValue;

use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;
use crate::user_agent::set_default_user_agent;

/// Fully validated transport configuration.
///
/// # Construction
///
/// Use [`ClientConfig::load`] to read a TOML file, [`ClientConfig::from_toml`]
/// for an already parsed one, or [`ClientConfig::default`] for the built-in
/// defaults. Builder methods override individual values afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Total request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Default `User-Agent`, if configured
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: defaults::timeout(),
            connect_timeout: defaults::connect_timeout(),
            user_agent: None,
        }
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientConfig {{ timeout: {}s, connect_timeout: {}s, user_agent: {} }}",
            self.timeout.as_secs(),
            self.connect_timeout.as_secs(),
            self.user_agent.as_deref().unwrap_or("none"),
        )
    }
}

impl ClientConfig {
    /// Creates a validated configuration from an optional TOML config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A timeout is zero
    /// - The user agent is empty or not a valid header value
    pub fn from_toml(toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let section = toml.map(|t| &t.transport);

        let timeout = resolve_duration(
            "timeout",
            section.and_then(|s| s.timeout),
            defaults::TIMEOUT_SECS,
        )?;
        let connect_timeout = resolve_duration(
            "connect_timeout",
            section.and_then(|s| s.connect_timeout),
            defaults::CONNECT_TIMEOUT_SECS,
        )?;
        let user_agent = section
            .and_then(|s| s.user_agent.as_deref())
            .map(validate_user_agent)
            .transpose()?;

        Ok(Self {
            timeout,
            connect_timeout,
            user_agent,
        })
    }

    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml = TomlConfig::load(path)?;
        let config = Self::from_toml(Some(&toml))?;
        tracing::debug!("Loaded {config} from {}", path.display());
        Ok(config)
    }

    /// Sets the total request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        self.timeout = validate_duration("timeout", timeout)?;
        Ok(self)
    }

    /// Sets the connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        self.connect_timeout = validate_duration("connect_timeout", timeout)?;
        Ok(self)
    }

    /// Re-checks every field.
    ///
    /// The fields are public, so a value assembled by hand may bypass the
    /// checks applied during construction.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_duration("timeout", self.timeout)?;
        validate_duration("connect_timeout", self.connect_timeout)?;
        if let Some(agent) = &self.user_agent {
            validate_user_agent(agent)?;
        }
        Ok(())
    }

    /// Sets the default `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or not a valid header value.
    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self, ConfigError> {
        self.user_agent = Some(validate_user_agent(user_agent)?);
        Ok(self)
    }

    /// Installs the configured user agent as the process-wide default.
    ///
    /// Returns `true` if a user agent was configured. Without one the
    /// current default is left untouched.
    pub fn apply_default_user_agent(&self) -> bool {
        let Some(agent) = &self.user_agent else {
            return false;
        };
        tracing::info!("Default user agent set to '{agent}'");
        set_default_user_agent(agent.clone());
        true
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn resolve_duration(
    field: &'static str,
    configured: Option<u64>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let seconds = configured.unwrap_or(default_secs);
    validate_duration(field, Duration::from_secs(seconds))
}

fn validate_duration(field: &'static str, duration: Duration) -> Result<Duration, ConfigError> {
    if duration.is_zero() {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(duration)
}

fn validate_user_agent(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidUserAgent {
            value: value.to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    HeaderValue::from_str(trimmed).map_err(|e| ConfigError::InvalidUserAgent {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    Ok(trimmed.to_string())
}
