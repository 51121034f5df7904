// crates/reqmgr-init-core/src/interfaces/mod.rs
// ============================================================================
// Module: Bootstrap Interfaces
// Description: Backend-agnostic interfaces for the initializer stages.
// Purpose: Define the contract surfaces concrete stores implement.
// Dependencies: crate::model, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the initializer talks to its environment and to the
//! target database without embedding driver details. Every stage operation
//! returns a [`BootstrapError`] already carrying the stage's natural kind, so
//! the orchestrator never has to guess a failure category.
//!
//! Security posture: secrets pass through [`EnvSource`] and
//! [`PasswordHasher`] only; implementations must not log them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::AdminIdentity;
use crate::model::BootstrapError;
use crate::model::DataSummary;
use crate::model::Migration;
use crate::model::MigrationReport;
use crate::model::MigrationState;
use crate::model::TableCount;
use crate::model::TrackedTable;

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Read-only view of environment variables.
pub trait EnvSource {
    /// Returns the value of `key`, or `None` when unset or not valid UTF-8.
    fn var(&self, key: &str) -> Option<String>;
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Environment backed by the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Environment backed by an in-memory map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    /// Variables by name.
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self { vars: BTreeMap::new() }
    }

    /// Sets `key` to `value`, returning the updated environment.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect() }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Two environments where `primary` shadows `fallback`.
#[derive(Debug, Clone, Default)]
pub struct LayeredEnv<P, F> {
    /// Consulted first.
    primary: P,
    /// Consulted when `primary` has no value.
    fallback: F,
}

impl<P, F> LayeredEnv<P, F> {
    /// Layers `primary` over `fallback`.
    pub const fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvSource, F: EnvSource> EnvSource for LayeredEnv<P, F> {
    fn var(&self, key: &str) -> Option<String> {
        self.primary.var(key).or_else(|| self.fallback.var(key))
    }
}

// ============================================================================
// SECTION: Password Hashing
// ============================================================================

/// Password hashing errors.
///
/// # Invariants
/// - Messages never include the secret being hashed.
#[derive(Debug, Error)]
pub enum HashError {
    /// Hash computation failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
    /// Hash verification could not run.
    #[error("password verification failed: {0}")]
    Verify(String),
}

/// One-way password hashing primitive.
pub trait PasswordHasher {
    /// Hashes `secret` into its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Hash`] when hashing fails.
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// Checks `secret` against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Verify`] when the stored hash is malformed.
    fn verify(&self, secret: &str, hash: &str) -> Result<bool, HashError>;
}

// ============================================================================
// SECTION: Migration Source
// ============================================================================

/// Migration source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum MigrationSourceError {
    /// The source could not be read.
    #[error("cannot read migration source {path}: {message}")]
    Io {
        /// Location that failed.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// A file does not follow the migration naming scheme.
    #[error("unrecognized file in migration source: {0}")]
    UnrecognizedFile(String),
    /// A version prefix is not an unsigned integer.
    #[error("invalid migration version in file name: {0}")]
    InvalidVersion(String),
    /// Two files claim the same version and direction.
    #[error("duplicate {direction} migration for version {version}")]
    DuplicateVersion {
        /// Conflicting version.
        version: u64,
        /// `up` or `down`.
        direction: &'static str,
    },
    /// A version has a down file without an up file.
    #[error("migration version {0} has no up file")]
    MissingUp(u64),
    /// The source holds no migrations.
    #[error("migration source {0} contains no migrations")]
    Empty(String),
}

impl From<MigrationSourceError> for BootstrapError {
    fn from(error: MigrationSourceError) -> Self {
        Self::migration(format!("invalid migration source: {error}")).with_cause(error)
    }
}

/// Provider of ordered migrations.
pub trait MigrationSource {
    /// Loads every migration, ordered by ascending version.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationSourceError`] when the source is unreadable or
    /// malformed.
    fn load(&self) -> Result<Vec<Migration>, MigrationSourceError>;

    /// Returns a human-readable location of the source.
    fn location(&self) -> String;
}

// ============================================================================
// SECTION: Health Check
// ============================================================================

/// Upper bound on the liveness ping.
pub const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot of connection pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Open connections.
    pub connections: u32,
    /// Open connections not in use.
    pub idle_connections: u32,
    /// Configured pool ceiling.
    pub max_size: u32,
}

/// Liveness check against the target database.
pub trait HealthProbe {
    /// Verifies the database answers within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] when the ping fails or
    /// times out.
    fn ping(&self, timeout: Duration) -> Result<(), BootstrapError>;

    /// Returns the current pool occupancy.
    fn pool_state(&self) -> PoolState;

    /// Pings the database, then requires at least one open connection.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] on ping failure or when the
    /// pool holds no open connection.
    fn check(&self) -> Result<PoolState, BootstrapError> {
        self.ping(HEALTH_PING_TIMEOUT)?;
        let state = self.pool_state();
        if state.connections == 0 {
            return Err(BootstrapError::database("no open database connections in pool")
                .with_context("max_connections", state.max_size));
        }
        Ok(state)
    }
}

// ============================================================================
// SECTION: Safety Check
// ============================================================================

/// Empty-database verification.
pub trait SafetyCheck {
    /// Counts rows in one tracked table.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] for failures other than a
    /// missing table.
    fn count_rows(&self, table: TrackedTable) -> Result<TableCount, BootstrapError>;

    /// Counts rows in every tracked table.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SafetyCheck::count_rows`] failure.
    fn summary(&self) -> Result<DataSummary, BootstrapError> {
        let mut counts = Vec::with_capacity(TrackedTable::ALL.len());
        for table in TrackedTable::ALL {
            counts.push((table, self.count_rows(table)?));
        }
        Ok(DataSummary::from_counts(counts))
    }

    /// Returns true when every tracked table is empty or missing.
    ///
    /// # Errors
    ///
    /// Propagates [`SafetyCheck::summary`] failures.
    fn is_empty(&self) -> Result<bool, BootstrapError> {
        Ok(self.summary()?.is_empty())
    }

    /// Renders the operator-facing safety report.
    ///
    /// # Errors
    ///
    /// Propagates [`SafetyCheck::summary`] failures.
    fn report(&self) -> Result<String, BootstrapError> {
        Ok(self.summary()?.render_report())
    }

    /// Requires an empty database.
    ///
    /// # Errors
    ///
    /// Returns a Safety-kind [`BootstrapError`] embedding the full report when
    /// any tracked table holds rows.
    fn validate(&self) -> Result<DataSummary, BootstrapError> {
        let summary = self.summary()?;
        if summary.is_empty() {
            return Ok(summary);
        }
        let counts: BTreeMap<&str, u64> =
            summary.counts.iter().map(|count| (count.table.table_name(), count.rows)).collect();
        Err(BootstrapError::safety(summary.render_report())
            .with_context("non_empty_tables", summary.non_empty_tables())
            .with_context("table_counts", counts))
    }
}

// ============================================================================
// SECTION: Schema Migrator
// ============================================================================

/// Forward-only schema migrator.
pub trait SchemaMigrator {
    /// Reads the persisted migration state; `None` when nothing has run.
    ///
    /// # Errors
    ///
    /// Returns a Migration-kind [`BootstrapError`] when the state is
    /// unreadable.
    fn current_version(&self) -> Result<Option<MigrationState>, BootstrapError>;

    /// Applies every pending migration under the migration lock.
    ///
    /// # Errors
    ///
    /// Returns a Migration-kind [`BootstrapError`] when the state is dirty,
    /// the lock cannot be taken, or a migration fails.
    fn apply_forward(&self) -> Result<MigrationReport, BootstrapError>;

    /// Checks the version table exists and is readable.
    ///
    /// # Errors
    ///
    /// Returns a Migration-kind [`BootstrapError`] otherwise.
    fn validate_schema(&self) -> Result<(), BootstrapError>;

    /// Steps back one version; returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns a Migration-kind [`BootstrapError`] when nothing can be rolled
    /// back or the down script fails.
    fn rollback_one(&self) -> Result<Option<MigrationState>, BootstrapError>;

    /// Applies pending migrations and verifies the resulting state is clean.
    ///
    /// # Errors
    ///
    /// Returns a Migration-kind [`BootstrapError`] when applying fails, the
    /// state is dirty afterwards, or the version table is unreadable.
    fn migrate(&self) -> Result<MigrationReport, BootstrapError> {
        let mut report = self.apply_forward()?;
        match self.current_version()? {
            Some(state) if state.dirty => {
                return Err(BootstrapError::migration(format!(
                    "database is in dirty migration state at version {}; manual repair required",
                    state.version
                ))
                .with_context("version", state.version)
                .with_context("dirty", true));
            }
            state => report.current_version = state.map(|state| state.version),
        }
        self.validate_schema()?;
        Ok(report)
    }
}

// ============================================================================
// SECTION: Administrator Provisioning
// ============================================================================

/// Creator of the seeded administrator identity.
pub trait AdminProvisioner {
    /// Creates the administrator under one atomic commit.
    ///
    /// # Errors
    ///
    /// Returns a Creation-kind [`BootstrapError`] when the secret is missing
    /// or weak, hashing fails, the administrator already exists, or the
    /// commit fails.
    fn create_admin(&self) -> Result<AdminIdentity, BootstrapError>;

    /// Returns true when an administrator-like identity already exists.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] when the lookup fails.
    fn administrator_exists(&self) -> Result<bool, BootstrapError>;
}

// ============================================================================
// SECTION: Bound Components
// ============================================================================

/// Stage components bound to one open connection pool.
///
/// Dropping the value releases every pooled connection.
pub struct BoundComponents {
    /// Liveness check.
    pub health: Box<dyn HealthProbe>,
    /// Empty-database check.
    pub safety: Box<dyn SafetyCheck>,
    /// Schema migrator.
    pub migrator: Box<dyn SchemaMigrator>,
    /// Administrator creator.
    pub admin: Box<dyn AdminProvisioner>,
}
