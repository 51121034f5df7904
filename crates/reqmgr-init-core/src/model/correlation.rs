// crates/reqmgr-init-core/src/model/correlation.rs
// ============================================================================
// Module: Run Correlation
// Description: Correlation identifiers and the per-run correlation context.
// Purpose: Tie every log line and error record of one run together.
// Dependencies: serde, serde_json, time, uuid
// ============================================================================

//! ## Overview
//! A run owns exactly one [`CorrelationContext`]. It is created before the
//! first stage, handed to every stage by reference, and dropped on exit. The
//! context is a value, never a global: log calls read the identifier and the
//! current step name from it explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::clock::now_utc;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Step label used for records emitted outside of any stage.
pub const RUN_SCOPE_STEP: &str = "initialization";

// ============================================================================
// SECTION: Correlation Identifier
// ============================================================================

/// Unique identifier of one initializer run.
///
/// # Invariants
/// - Renders as a 36-character hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Issues a fresh random correlation identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CorrelationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

// ============================================================================
// SECTION: Correlation Context
// ============================================================================

/// Run-scoped context carried through every stage.
///
/// # Invariants
/// - The correlation identifier never changes after construction.
/// - `step` is `None` between stages.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    /// Correlation identifier of this run.
    correlation_id: CorrelationId,
    /// Name of the stage currently executing.
    step: Option<String>,
    /// Wall-clock start of the run.
    started_at: OffsetDateTime,
    /// Free-form structured data attached during the run.
    data: BTreeMap<String, Value>,
}

impl CorrelationContext {
    /// Creates a context with a freshly generated correlation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(CorrelationId::generate())
    }

    /// Creates a context bound to an existing correlation identifier.
    #[must_use]
    pub fn with_id(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            step: None,
            started_at: now_utc(),
            data: BTreeMap::new(),
        }
    }

    /// Returns the run's correlation identifier.
    #[must_use]
    pub const fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Returns the current step name, or [`RUN_SCOPE_STEP`] between stages.
    #[must_use]
    pub fn step(&self) -> &str {
        self.step.as_deref().unwrap_or(RUN_SCOPE_STEP)
    }

    /// Marks `step` as the currently executing stage.
    pub fn enter_step(&mut self, step: &str) {
        self.step = Some(step.to_string());
    }

    /// Clears the current stage marker.
    pub fn leave_step(&mut self) {
        self.step = None;
    }

    /// Returns the wall-clock start of the run.
    #[must_use]
    pub const fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    /// Attaches a structured value under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.into(), value);
    }

    /// Returns the structured data attached to the run.
    #[must_use]
    pub const fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}
