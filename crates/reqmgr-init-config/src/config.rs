// crates/reqmgr-init-config/src/config.rs
// ============================================================================
// Module: Bootstrap Configuration
// Description: Configuration model, defaults, and one-pass validation.
// Purpose: Decide whether the environment is complete enough to start a run.
// Dependencies: reqmgr-init-core, serde, thiserror
// ============================================================================

//! ## Overview
//! [`BootstrapConfig::from_env`] never fails: unparsable values are kept as
//! raw text so that [`BootstrapConfig::validate`] can report them alongside
//! every missing variable in a single error.
//!
//! ## Invariants
//! - Validation is the only place configuration policy is enforced.
//! - Secrets are redacted in `Debug` output and skipped by serialization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use reqmgr_init_core::ADMIN_PASSWORD_ENV;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::EnvSource;
use reqmgr_init_core::check_admin_secret;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Database host variable.
pub const ENV_DB_HOST: &str = "DB_HOST";
/// Database port variable.
pub const ENV_DB_PORT: &str = "DB_PORT";
/// Database user variable.
pub const ENV_DB_USER: &str = "DB_USER";
/// Database password variable.
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
/// Database name variable.
pub const ENV_DB_NAME: &str = "DB_NAME";
/// Transport security mode variable.
pub const ENV_DB_SSLMODE: &str = "DB_SSLMODE";
/// Token signing secret variable.
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
/// Log level variable.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Log format variable.
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Default database port.
pub const DEFAULT_DB_PORT: u16 = 5432;
/// Placeholder signing secret shipped in sample files; never accepted.
pub const PLACEHOLDER_JWT_SECRET: &str = "your-secret-key";

/// Variables that must be present and non-empty, in reporting order.
pub const REQUIRED_VARIABLES: [&str; 6] =
    [ENV_DB_HOST, ENV_DB_USER, ENV_DB_PASSWORD, ENV_DB_NAME, ENV_JWT_SECRET, ADMIN_PASSWORD_ENV];

// ============================================================================
// SECTION: Secrets
// ============================================================================

/// Secret string that never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { f.write_str("Secret(<empty>)") } else { f.write_str("Secret(<redacted>)") }
    }
}

// ============================================================================
// SECTION: Typed Settings
// ============================================================================

/// Error parsing a typed setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not one of {expected}")]
pub struct ParseSettingError {
    /// Rejected value.
    pub value: String,
    /// Accepted values.
    pub expected: &'static str,
}

/// Transport security mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain TCP.
    #[default]
    Disable,
    /// TLS when the server offers it.
    Prefer,
    /// TLS or fail.
    Require,
}

impl SslMode {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prefer => "prefer",
            Self::Require => "require",
        }
    }
}

impl FromStr for SslMode {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            _ => Err(ParseSettingError { value: value.to_string(), expected: "disable, prefer, require" }),
        }
    }
}

/// Minimum severity of emitted log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    #[default]
    Info,
    /// Unexpected but tolerated.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ParseSettingError {
                value: value.to_string(),
                expected: "trace, debug, info, warn, error",
            }),
        }
    }
}

/// Shape of emitted log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

impl FromStr for LogFormat {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(ParseSettingError { value: value.to_string(), expected: "json, text" }),
        }
    }
}

/// A typed setting as read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting<T> {
    /// Parsed value (or the default when unset).
    Value(T),
    /// Explicitly set to an empty string.
    Empty,
    /// Raw text that failed to parse.
    Invalid {
        /// Raw text.
        raw: String,
        /// Parse failure description.
        reason: String,
    },
}

impl<T: Copy> Setting<T> {
    /// Returns the parsed value, when valid.
    #[must_use]
    pub const fn value(&self) -> Option<T> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Empty | Self::Invalid { .. } => None,
        }
    }
}

/// Parses an optional variable, falling back to `default` when unset.
///
/// When `empty_is_default` is set an empty value also yields the default.
fn read_setting<T, E>(
    env: &impl EnvSource,
    key: &str,
    default: T,
    empty_is_default: bool,
) -> Setting<T>
where
    T: FromStr<Err = E>,
    E: fmt::Display,
{
    match env.var(key) {
        None => Setting::Value(default),
        Some(raw) if raw.trim().is_empty() => {
            if empty_is_default {
                Setting::Value(default)
            } else {
                Setting::Empty
            }
        }
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Setting::Value(value),
            Err(err) => Setting::Invalid { reason: err.to_string(), raw },
        },
    }
}

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Database coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: Setting<u16>,
    /// Login role.
    pub user: String,
    /// Login password.
    #[serde(skip_serializing)]
    pub password: Secret,
    /// Database name.
    pub name: String,
    /// Transport security mode.
    pub sslmode: Setting<SslMode>,
}

/// Secrets consumed by the run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AuthConfig {
    /// Token signing secret of the main service.
    #[serde(skip_serializing)]
    pub jwt_secret: Secret,
    /// Administrator bootstrap secret.
    #[serde(skip_serializing)]
    pub admin_password: Secret,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    /// Minimum level.
    pub level: Setting<LogLevel>,
    /// Record shape.
    pub format: Setting<LogFormat>,
}

impl LoggingConfig {
    /// Returns the level, falling back to the default when invalid.
    #[must_use]
    pub fn effective_level(&self) -> LogLevel {
        self.level.value().unwrap_or_default()
    }

    /// Returns the format, falling back to the default when invalid.
    #[must_use]
    pub fn effective_format(&self) -> LogFormat {
        self.format.value().unwrap_or_default()
    }
}

/// Complete initializer configuration, immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapConfig {
    /// Database coordinates.
    pub database: DatabaseConfig,
    /// Secrets.
    pub auth: AuthConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Validated database coordinates ready for a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: Secret,
    /// Database name.
    pub name: String,
    /// Transport security mode.
    pub sslmode: SslMode,
}

impl BootstrapConfig {
    /// Materializes configuration from `env`, applying defaults.
    #[must_use]
    pub fn from_env(env: &impl EnvSource) -> Self {
        let text = |key: &str| env.var(key).map(|value| value.trim().to_string()).unwrap_or_default();
        let secret = |key: &str| Secret::new(env.var(key).unwrap_or_default());
        Self {
            database: DatabaseConfig {
                host: text(ENV_DB_HOST),
                port: read_setting(env, ENV_DB_PORT, DEFAULT_DB_PORT, false),
                user: text(ENV_DB_USER),
                password: secret(ENV_DB_PASSWORD),
                name: text(ENV_DB_NAME),
                sslmode: read_setting(env, ENV_DB_SSLMODE, SslMode::default(), true),
            },
            auth: AuthConfig {
                jwt_secret: secret(ENV_JWT_SECRET),
                admin_password: secret(ADMIN_PASSWORD_ENV),
            },
            logging: LoggingConfig {
                level: read_setting(env, ENV_LOG_LEVEL, LogLevel::default(), true),
                format: read_setting(env, ENV_LOG_FORMAT, LogFormat::default(), true),
            },
        }
    }

    /// Validates the configuration, collecting every issue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] listing all missing and invalid
    /// settings when any exist.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        let presence = [
            (ENV_DB_HOST, self.database.host.is_empty()),
            (ENV_DB_PORT, matches!(self.database.port, Setting::Empty)),
            (ENV_DB_USER, self.database.user.is_empty()),
            (ENV_DB_PASSWORD, self.database.password.is_empty()),
            (ENV_DB_NAME, self.database.name.is_empty()),
            (ENV_JWT_SECRET, self.auth.jwt_secret.is_empty()),
            (ADMIN_PASSWORD_ENV, self.auth.admin_password.is_empty()),
        ];
        missing.extend(presence.iter().filter(|(_, absent)| *absent).map(|(key, _)| (*key).to_string()));

        match &self.database.port {
            Setting::Value(0) => invalid.push(format!("{ENV_DB_PORT} must be between 1 and 65535")),
            Setting::Invalid { raw, .. } => {
                invalid.push(format!("{ENV_DB_PORT} must be between 1 and 65535 (got '{raw}')"));
            }
            Setting::Value(_) | Setting::Empty => {}
        }
        push_invalid(&mut invalid, ENV_DB_SSLMODE, &self.database.sslmode);
        push_invalid(&mut invalid, ENV_LOG_LEVEL, &self.logging.level);
        push_invalid(&mut invalid, ENV_LOG_FORMAT, &self.logging.format);

        if self.auth.jwt_secret.expose() == PLACEHOLDER_JWT_SECRET {
            invalid.push(format!(
                "{ENV_JWT_SECRET} must not be the placeholder value '{PLACEHOLDER_JWT_SECRET}'"
            ));
        }
        if !self.auth.admin_password.is_empty()
            && let Err(reason) = check_admin_secret(self.auth.admin_password.expose())
        {
            invalid.push(reason);
        }

        if missing.is_empty() && invalid.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError { missing, invalid })
        }
    }

    /// Validates and returns connector-ready database coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] when the configuration is invalid.
    pub fn database_target(&self) -> Result<DatabaseTarget, ConfigValidationError> {
        self.validate()?;
        Ok(DatabaseTarget {
            host: self.database.host.clone(),
            port: self.database.port.value().unwrap_or(DEFAULT_DB_PORT),
            user: self.database.user.clone(),
            password: self.database.password.clone(),
            name: self.database.name.clone(),
            sslmode: self.database.sslmode.value().unwrap_or_default(),
        })
    }
}

/// Records an invalid typed setting.
fn push_invalid<T>(invalid: &mut Vec<String>, key: &str, setting: &Setting<T>) {
    if let Setting::Invalid { reason, .. } = setting {
        invalid.push(format!("{key} is invalid: {reason}"));
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration validation failure listing every issue found.
///
/// # Invariants
/// - At least one of `missing` and `invalid` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_issues(.missing, .invalid))]
pub struct ConfigValidationError {
    /// Variables absent or empty.
    pub missing: Vec<String>,
    /// Human-readable descriptions of invalid values.
    pub invalid: Vec<String>,
}

/// Renders the validation failure message.
fn describe_issues(missing: &[String], invalid: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing required environment variables: {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("invalid configuration: {}", invalid.join("; ")));
    }
    format!("configuration validation failed: {}", parts.join("; "))
}

impl From<ConfigValidationError> for BootstrapError {
    fn from(error: ConfigValidationError) -> Self {
        Self::config(error.to_string())
            .with_context("missing", &error.missing)
            .with_context("invalid", &error.invalid)
    }
}
