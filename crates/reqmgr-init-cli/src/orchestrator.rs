// crates/reqmgr-init-cli/src/orchestrator.rs
// ============================================================================
// Module: Initialization Orchestrator
// Description: Runs the bootstrap stages in order and records each one.
// Purpose: Turn a validated environment into a migrated, seeded database.
// Dependencies: reqmgr-init-core, reqmgr-init-config, reqmgr-init-store-postgres,
//               serde_json, tracing
// ============================================================================

//! ## Overview
//! A run is a fixed sequence of named steps. Each step records a
//! [`StepSummary`] and emits one `step_completed` or `step_failed` record.
//! The first failure ends the run; its error is enriched with the
//! correlation id, the step name, and the step's `duration_ms`, and the kind
//! assigned by the failing component is kept.
//!
//! ## Invariants
//! - Every log record emitted here carries the run's correlation id.
//! - Database components are owned by the run and dropped on every return
//!   path, which closes the pool.
//! - Nothing touches the database in a dry run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Instant;

use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_config::DatabaseTarget;
use reqmgr_init_core::ADMIN_PASSWORD_ENV;
use reqmgr_init_core::ADMIN_USERNAME;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::BoundComponents;
use reqmgr_init_core::CorrelationContext;
use reqmgr_init_core::InitializationSummary;
use reqmgr_init_core::RUN_SCOPE_STEP;
use reqmgr_init_core::RunMode;
use reqmgr_init_core::StepStatus;
use reqmgr_init_core::StepSummary;
use reqmgr_init_core::duration_millis;
use reqmgr_init_core::now_utc;
use reqmgr_init_store_postgres::APPLICATION_NAME;
use reqmgr_init_store_postgres::CONNECT_TIMEOUT;
use reqmgr_init_store_postgres::POOL_MAX_SIZE;
use reqmgr_init_store_postgres::PostgresConnector;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::t;

// ============================================================================
// SECTION: Step Names
// ============================================================================

/// Environment validation.
pub const STEP_VALIDATE_ENVIRONMENT: &str = "validate_environment";
/// Pool construction and first connection.
pub const STEP_CONNECT_DATABASE: &str = "connect_database";
/// Ping and pool inspection.
pub const STEP_CHECK_HEALTH: &str = "check_database_health";
/// Empty-database verification.
pub const STEP_VERIFY_EMPTY: &str = "verify_database_empty";
/// Forward migration.
pub const STEP_APPLY_MIGRATIONS: &str = "apply_migrations";
/// Administrator creation.
pub const STEP_CREATE_ADMIN: &str = "create_admin_user";
/// Dry-run component construction.
pub const STEP_PREPARE_COMPONENTS: &str = "prepare_components";

/// Steps of a full run in execution order.
pub const FULL_RUN_STEPS: [&str; 6] = [
    STEP_VALIDATE_ENVIRONMENT,
    STEP_CONNECT_DATABASE,
    STEP_CHECK_HEALTH,
    STEP_VERIFY_EMPTY,
    STEP_APPLY_MIGRATIONS,
    STEP_CREATE_ADMIN,
];

/// Steps of a dry run in execution order.
pub const DRY_RUN_STEPS: [&str; 2] = [STEP_VALIDATE_ENVIRONMENT, STEP_PREPARE_COMPONENTS];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Structured details attached to a step summary.
pub type StepDetails = BTreeMap<String, Value>;

/// Builds step details from key/value pairs.
fn details<const N: usize>(entries: [(&str, Value); N]) -> StepDetails {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

/// Database access used by the orchestrator.
pub trait Connector {
    /// Builds everything a full run needs without touching the database.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when connection settings, TLS, or the
    /// migration source cannot be prepared.
    fn prepare_components(&self, target: &DatabaseTarget) -> Result<StepDetails, BootstrapError>;

    /// Opens the pool and binds the stage components to it.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] when connecting fails.
    fn connect(&self, target: &DatabaseTarget) -> Result<BoundComponents, BootstrapError>;
}

impl Connector for PostgresConnector {
    fn prepare_components(&self, target: &DatabaseTarget) -> Result<StepDetails, BootstrapError> {
        let prepared = self.prepare(target)?;
        let source = self.migration_source();
        let migrations = source.load()?;
        Ok(details([
            ("host", json!(prepared.host())),
            ("database", json!(prepared.database())),
            ("application_name", json!(APPLICATION_NAME)),
            ("pool_max_size", json!(POOL_MAX_SIZE)),
            ("connect_timeout_ms", json!(duration_millis(CONNECT_TIMEOUT))),
            ("migrations_dir", json!(source.location())),
            ("migrations_available", json!(migrations.len())),
            ("latest_version", json!(migrations.last().map(|migration| migration.version))),
        ]))
    }

    fn connect(&self, target: &DatabaseTarget) -> Result<BoundComponents, BootstrapError> {
        Self::connect(self, target)
    }
}

/// A failed run: the terminal error plus every step recorded before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// Enriched error of the failing step.
    #[source]
    pub error: BootstrapError,
    /// Step summaries in execution order, ending with the failed step.
    pub steps: Vec<StepSummary>,
}

impl RunFailure {
    /// Returns the process exit code of the failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error.exit_code()
    }
}

// ============================================================================
// SECTION: Step Recorder
// ============================================================================

/// Tracks the correlation context and the steps recorded so far.
struct RunRecorder<'a> {
    /// Run context.
    context: &'a mut CorrelationContext,
    /// Step summaries in execution order.
    steps: Vec<StepSummary>,
}

impl<'a> RunRecorder<'a> {
    /// Starts recording a run in `mode`.
    fn start(context: &'a mut CorrelationContext, mode: RunMode) -> Self {
        context.insert("mode", mode.as_str());
        tracing::info!(
            correlation_id = %context.correlation_id(),
            step = RUN_SCOPE_STEP,
            component = "orchestrator",
            action = "start",
            mode = mode.as_str(),
            "initialization_started"
        );
        Self { context, steps: Vec::new() }
    }

    /// Runs one step, recording its summary and log record.
    fn step<T>(
        &mut self,
        step: &'static str,
        component: &'static str,
        action: &'static str,
        work: impl FnOnce() -> Result<(T, StepDetails), BootstrapError>,
    ) -> Result<T, RunFailure> {
        self.context.enter_step(step);
        let correlation_id = self.context.correlation_id();
        tracing::debug!(correlation_id = %correlation_id, step, component, action, "step_started");

        let started_at = now_utc();
        let clock = Instant::now();
        let outcome = work();
        let elapsed = clock.elapsed();
        let finished_at = now_utc();
        let duration_ms = duration_millis(elapsed);
        self.context.leave_step();

        match outcome {
            Ok((value, details)) => {
                let rendered = serde_json::to_string(&details).unwrap_or_default();
                tracing::info!(
                    correlation_id = %correlation_id,
                    step,
                    component,
                    action,
                    duration_ms,
                    status = StepStatus::Success.as_str(),
                    details = %rendered,
                    "step_completed"
                );
                self.steps.push(StepSummary::new(
                    step,
                    started_at,
                    finished_at,
                    elapsed,
                    StepStatus::Success,
                    details,
                ));
                Ok(value)
            }
            Err(error) => {
                let error = error
                    .with_correlation(correlation_id)
                    .with_step(step)
                    .with_context("duration_ms", duration_ms);
                let record = error.record();
                let context = serde_json::to_string(&record.context).unwrap_or_default();
                let causes = serde_json::to_string(&record.causes).unwrap_or_default();
                tracing::error!(
                    correlation_id = %correlation_id,
                    step,
                    component,
                    action,
                    duration_ms,
                    status = StepStatus::Failed.as_str(),
                    error = record.message.as_str(),
                    error_kind = record.kind.as_str(),
                    severity = record.severity.as_str(),
                    recoverable = record.recoverable,
                    exit_code = record.exit_code,
                    causes = %causes,
                    context = %context,
                    "step_failed"
                );
                self.steps.push(StepSummary::new(
                    step,
                    started_at,
                    finished_at,
                    elapsed,
                    StepStatus::Failed,
                    details([
                        ("error_kind", json!(record.kind.as_str())),
                        ("error", json!(record.message)),
                        ("causes", json!(record.causes)),
                    ]),
                ));
                Err(RunFailure { error, steps: std::mem::take(&mut self.steps) })
            }
        }
    }

    /// Closes the run and logs the completion record.
    fn finish(self, outcome: RunOutcome) -> InitializationSummary {
        let finished_at = now_utc();
        let started_at = self.context.started_at();
        let total = (finished_at - started_at).unsigned_abs();
        let summary = InitializationSummary {
            correlation_id: self.context.correlation_id(),
            mode: outcome.mode,
            started_at,
            finished_at,
            total_duration_ms: duration_millis(total),
            steps: self.steps,
            admin_created: outcome.admin_created,
            migrations_applied: outcome.migrations_applied,
            schema_version: outcome.schema_version,
            database_host: outcome.database_host,
            database_name: outcome.database_name,
        };
        let steps = serde_json::to_string(&summary.steps).unwrap_or_default();
        let next = serde_json::to_string(&next_steps(summary.mode)).unwrap_or_default();
        tracing::info!(
            correlation_id = %summary.correlation_id,
            step = RUN_SCOPE_STEP,
            component = "orchestrator",
            action = "complete",
            mode = summary.mode.as_str(),
            duration_ms = summary.total_duration_ms,
            status = StepStatus::Success.as_str(),
            admin_created = summary.admin_created,
            migrations_applied = summary.migrations_applied,
            steps = %steps,
            next_steps = %next,
            "initialization_completed"
        );
        summary
    }
}

/// Facts gathered during a successful run.
struct RunOutcome {
    /// Execution mode.
    mode: RunMode,
    /// True when the administrator identity was created.
    admin_created: bool,
    /// Migration files applied.
    migrations_applied: usize,
    /// Schema version after the run.
    schema_version: Option<u64>,
    /// Database host.
    database_host: String,
    /// Database name.
    database_name: String,
}

// ============================================================================
// SECTION: Runs
// ============================================================================

/// Validates the configuration and returns the connector-ready target.
fn validate_environment(config: &BootstrapConfig) -> Result<(DatabaseTarget, StepDetails), BootstrapError> {
    let target = config.database_target()?;
    let details = details([
        ("host", json!(target.host)),
        ("port", json!(target.port)),
        ("database", json!(target.name)),
        ("sslmode", json!(target.sslmode.as_str())),
        ("log_level", json!(config.logging.effective_level().as_str())),
    ]);
    Ok((target, details))
}

/// Runs every stage against the database.
///
/// # Errors
///
/// Returns [`RunFailure`] carrying the first stage error and the steps
/// recorded up to and including the failed one.
pub fn run_full(
    config: &BootstrapConfig,
    connector: &impl Connector,
    context: &mut CorrelationContext,
) -> Result<InitializationSummary, RunFailure> {
    let mut run = RunRecorder::start(context, RunMode::Full);

    let target = run.step(STEP_VALIDATE_ENVIRONMENT, "config", "validate", || {
        validate_environment(config)
    })?;
    run.context.insert("database_host", &target.host);
    run.context.insert("database_name", &target.name);

    let components = run.step(STEP_CONNECT_DATABASE, "connector", "connect", || {
        let components = connector.connect(&target)?;
        let details = details([
            ("host", json!(target.host)),
            ("port", json!(target.port)),
            ("database", json!(target.name)),
        ]);
        Ok((components, details))
    })?;

    run.step(STEP_CHECK_HEALTH, "health", "ping", || {
        let pool = components.health.check()?;
        let details = details([
            ("connections", json!(pool.connections)),
            ("idle_connections", json!(pool.idle_connections)),
            ("max_size", json!(pool.max_size)),
        ]);
        Ok(((), details))
    })?;

    run.step(STEP_VERIFY_EMPTY, "safety", "verify_empty", || {
        let summary = components.safety.validate()?;
        let details = details([
            ("total_rows", json!(summary.total_rows())),
            ("missing_tables", json!(summary.missing_tables())),
            ("table_counts", json!(summary.counts)),
        ]);
        Ok(((), details))
    })?;

    let report = run.step(STEP_APPLY_MIGRATIONS, "migrator", "migrate", || {
        let report = components.migrator.migrate()?;
        let details = details([
            ("prior_version", json!(report.prior_version)),
            ("current_version", json!(report.current_version)),
            ("applied_count", json!(report.applied_count())),
            ("version_delta", json!(report.version_delta())),
            ("applied", json!(report.applied)),
        ]);
        Ok((report, details))
    })?;

    run.step(STEP_CREATE_ADMIN, "admin", "create", || {
        let admin = components.admin.create_admin()?;
        let details = details([
            ("admin_id", json!(admin.id)),
            ("username", json!(admin.username)),
            ("email", json!(admin.email)),
            ("role", json!(admin.role.as_str())),
        ]);
        Ok(((), details))
    })?;
    drop(components);

    Ok(run.finish(RunOutcome {
        mode: RunMode::Full,
        admin_created: true,
        migrations_applied: report.applied_count(),
        schema_version: report.current_version,
        database_host: target.host,
        database_name: target.name,
    }))
}

/// Validates the configuration and constructs components without any
/// database access.
///
/// # Errors
///
/// Returns [`RunFailure`] when validation or component construction fails.
pub fn run_dry(
    config: &BootstrapConfig,
    connector: &impl Connector,
    context: &mut CorrelationContext,
) -> Result<InitializationSummary, RunFailure> {
    let mut run = RunRecorder::start(context, RunMode::DryRun);

    let target = run.step(STEP_VALIDATE_ENVIRONMENT, "config", "validate", || {
        validate_environment(config)
    })?;

    run.step(STEP_PREPARE_COMPONENTS, "connector", "prepare", || {
        Ok(((), connector.prepare_components(&target)?))
    })?;

    Ok(run.finish(RunOutcome {
        mode: RunMode::DryRun,
        admin_created: false,
        migrations_applied: 0,
        schema_version: None,
        database_host: target.host,
        database_name: target.name,
    }))
}

/// Returns the ordered follow-up actions for the operator.
#[must_use]
pub fn next_steps(mode: RunMode) -> Vec<String> {
    match mode {
        RunMode::Full => vec![
            t!("next_steps.start_server"),
            t!("next_steps.login", username = ADMIN_USERNAME, env = ADMIN_PASSWORD_ENV),
            t!("next_steps.create_users"),
        ],
        RunMode::DryRun => vec![t!("next_steps.dry_run")],
    }
}
