// crates/reqmgr-init-core/src/model/summary.rs
// ============================================================================
// Module: Run Summaries
// Description: Step summaries and the whole-run initialization summary.
// Purpose: Record what each stage did and how long it took.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Each stage contributes one [`StepSummary`], successful or failed, in
//! execution order. A successful run folds them into an
//! [`InitializationSummary`] that is logged and printed for the operator.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::model::clock::duration_millis;
use crate::model::correlation::CorrelationId;

/// Outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The stage completed.
    Success,
    /// The stage failed and ended the run.
    Failed,
}

impl StepStatus {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the run was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// All stages against the database.
    Full,
    /// Validation and component construction only.
    DryRun,
}

impl RunMode {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::DryRun => "dry_run",
        }
    }
}

/// Record of one executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Stage name.
    pub step: String,
    /// Stage start.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Stage end.
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    /// Elapsed milliseconds.
    pub duration_ms: u64,
    /// Outcome.
    pub status: StepStatus,
    /// Stage-specific details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl StepSummary {
    /// Builds a summary from measured timings.
    #[must_use]
    pub fn new(
        step: impl Into<String>,
        started_at: OffsetDateTime,
        finished_at: OffsetDateTime,
        elapsed: Duration,
        status: StepStatus,
        details: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            step: step.into(),
            started_at,
            finished_at,
            duration_ms: duration_millis(elapsed),
            status,
            details,
        }
    }
}

/// Record of a whole successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializationSummary {
    /// Correlation identifier of the run.
    pub correlation_id: CorrelationId,
    /// Execution mode.
    pub mode: RunMode,
    /// Run start.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Run end.
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    /// Total elapsed milliseconds.
    pub total_duration_ms: u64,
    /// Stage summaries in execution order.
    pub steps: Vec<StepSummary>,
    /// True when the administrator identity was created.
    pub admin_created: bool,
    /// Number of migration files applied.
    pub migrations_applied: usize,
    /// Schema version after the run, when known.
    pub schema_version: Option<u64>,
    /// Database host.
    pub database_host: String,
    /// Database name.
    pub database_name: String,
}

impl InitializationSummary {
    /// Returns the summary of a named stage, when it ran.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepSummary> {
        self.steps.iter().find(|summary| summary.step == name)
    }
}
