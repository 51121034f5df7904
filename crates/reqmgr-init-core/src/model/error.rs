// crates/reqmgr-init-core/src/model/error.rs
// ============================================================================
// Module: Bootstrap Error Taxonomy
// Description: Closed error kinds, exit codes, and the bootstrap error record.
// Purpose: Bind every failure of a run to exactly one kind and exit status.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Every failure an initializer stage can produce is a [`BootstrapError`]
//! carrying one [`ErrorKind`]. The kind fixes the process exit code, the
//! severity, and whether an operator can retry after fixing the cause.
//! Foreign errors that reach the orchestrator without a kind are classified
//! by [`classify_message`] as a last resort.
//!
//! Security posture: error messages and context never carry secret values;
//! callers attach names of offending settings, not their contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::clock::now_utc;
use crate::model::correlation::CorrelationId;

/// Boxed cause attached to a bootstrap error.
type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Closed set of failure kinds a run can end with.
///
/// # Invariants
/// - Each kind maps to exactly one non-zero exit code.
/// - Only [`ErrorKind::Safety`] and [`ErrorKind::System`] are unrecoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid configuration.
    Config,
    /// Connection or health failure against the target database.
    Database,
    /// The target database already holds application data.
    Safety,
    /// Schema migration failure or dirty migration state.
    Migration,
    /// Administrator identity creation failure.
    Creation,
    /// Anything not attributable to a stage.
    System,
}

impl ErrorKind {
    /// All kinds in classification priority order.
    pub const ALL: [Self; 6] =
        [Self::Config, Self::Database, Self::Safety, Self::Migration, Self::Creation, Self::System];

    /// Returns the stable lowercase label of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Database => "database",
            Self::Safety => "safety",
            Self::Migration => "migration",
            Self::Creation => "creation",
            Self::System => "system",
        }
    }

    /// Returns the process exit code bound to this kind.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Config => 1,
            Self::Database => 2,
            Self::Safety => 3,
            Self::Migration => 4,
            Self::Creation => 5,
            Self::System => 10,
        }
    }

    /// Returns true when an operator may retry after fixing the cause.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Safety | Self::System)
    }

    /// Returns the severity attached to this kind.
    #[must_use]
    pub const fn severity(self) -> Severity {
        Severity::Critical
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to an error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The run cannot continue.
    Critical,
}

impl Severity {
    /// Returns the stable lowercase label of this severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
        }
    }
}

// ============================================================================
// SECTION: Bootstrap Error
// ============================================================================

/// Error record produced by a failed run.
///
/// # Invariants
/// - `kind` never changes once the error is built; enrichment only adds
///   context, correlation, and step information.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BootstrapError {
    /// Failure kind.
    kind: ErrorKind,
    /// Human-readable message.
    message: String,
    /// Underlying cause, if any.
    #[source]
    cause: Option<BoxedCause>,
    /// Structured context attached by the failing component.
    context: BTreeMap<String, Value>,
    /// Correlation identifier of the run.
    correlation_id: Option<CorrelationId>,
    /// Stage that produced the failure.
    step: Option<String>,
    /// Wall-clock time the error was built.
    timestamp: OffsetDateTime,
}

impl BootstrapError {
    /// Builds an error of `kind` with `message`.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            context: BTreeMap::new(),
            correlation_id: None,
            step: None,
            timestamp: now_utc(),
        }
    }

    /// Builds a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Builds a database error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Builds a safety error.
    #[must_use]
    pub fn safety(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Safety, message)
    }

    /// Builds a migration error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Migration, message)
    }

    /// Builds an administrator creation error.
    #[must_use]
    pub fn creation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Creation, message)
    }

    /// Builds a system error.
    #[must_use]
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::System, message)
    }

    /// Wraps a foreign error, classifying it by its rendered message.
    #[must_use]
    pub fn from_opaque<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = error.to_string();
        Self::new(classify_message(&message), message).with_cause(error)
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Adds a structured context entry, replacing any previous value.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.context.insert(key.into(), value);
        self
    }

    /// Binds the error to a run's correlation identifier.
    #[must_use]
    pub const fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Records the stage that produced the error.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured context.
    #[must_use]
    pub const fn context(&self) -> &BTreeMap<String, Value> {
        &self.context
    }

    /// Returns the correlation identifier, when bound.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    /// Returns the producing stage, when recorded.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    /// Returns the time the error was built.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Returns the exit code bound to this error's kind.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Returns true when an operator may retry after fixing the cause.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    /// Returns the rendered messages of the cause chain, outermost first.
    #[must_use]
    pub fn cause_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut next = self.source();
        while let Some(cause) = next {
            chain.push(cause.to_string());
            next = cause.source();
        }
        chain
    }

    /// Projects the error into its serializable record form.
    #[must_use]
    pub fn record(&self) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind,
            severity: self.kind.severity(),
            message: self.message.clone(),
            causes: self.cause_chain(),
            context: self.context.clone(),
            correlation_id: self.correlation_id,
            step: self.step.clone(),
            recoverable: self.kind.is_recoverable(),
            exit_code: self.kind.exit_code(),
            timestamp: self.timestamp,
        }
    }
}

// ============================================================================
// SECTION: Error Record
// ============================================================================

/// Serializable projection of a [`BootstrapError`] for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Failure kind.
    pub kind: ErrorKind,
    /// Severity derived from the kind.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Rendered cause chain, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// Structured context.
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
    /// Correlation identifier of the run.
    pub correlation_id: Option<CorrelationId>,
    /// Stage that produced the failure.
    pub step: Option<String>,
    /// Whether an operator may retry after fixing the cause.
    pub recoverable: bool,
    /// Process exit code.
    pub exit_code: u8,
    /// Wall-clock time the error was built.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Substrings mapped to each classifiable kind, in priority order.
const CLASSIFIER_RULES: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::Config, &["configuration", "environment", "missing", "invalid", "config"]),
    (ErrorKind::Database, &["database", "connection", "postgres", "sql", "db"]),
    (ErrorKind::Safety, &["safety", "not empty", "existing data", "non-empty"]),
    (ErrorKind::Migration, &["migration", "schema", "migrate"]),
    (ErrorKind::Creation, &["user", "admin", "password", "creation", "hash"]),
];

/// Classifies an uncategorized failure message into a kind.
///
/// Matching is case-insensitive and follows the priority order Config,
/// Database, Safety, Migration, Creation; anything else is System. This is a
/// fallback for errors raised outside any stage; stages set kinds directly.
#[must_use]
pub fn classify_message(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    CLASSIFIER_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| lowered.contains(needle)))
        .map_or(ErrorKind::System, |(kind, _)| *kind)
}
