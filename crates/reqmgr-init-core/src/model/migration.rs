// crates/reqmgr-init-core/src/model/migration.rs
// ============================================================================
// Module: Migration Model
// Description: Migration files, persisted migration state, and run reports.
// Purpose: Describe schema versions independently of the database driver.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A migration is a numbered pair of SQL scripts. The target database keeps
//! one `(version, dirty)` row; `dirty` means a script started but its
//! completion was never recorded. Dirty state is reported, never repaired.

use serde::Deserialize;
use serde::Serialize;

/// One versioned migration loaded from a migration source.
///
/// # Invariants
/// - `up` is always present; `down` is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Version number; orders migrations ascending.
    pub version: u64,
    /// Descriptive name taken from the file name.
    pub name: String,
    /// Forward SQL script.
    pub up: String,
    /// Reverse SQL script, when provided.
    pub down: Option<String>,
}

/// Persisted migration state of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    /// Last recorded version.
    pub version: u64,
    /// True when the last recorded version did not finish.
    pub dirty: bool,
}

/// A migration applied during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Version applied.
    pub version: u64,
    /// Descriptive name.
    pub name: String,
    /// Elapsed milliseconds for this migration.
    pub duration_ms: u64,
}

/// Outcome of a forward migration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Version before the pass; `None` when no migration had run.
    pub prior_version: Option<u64>,
    /// Version after the pass.
    pub current_version: Option<u64>,
    /// Migrations applied during the pass, in order.
    pub applied: Vec<AppliedMigration>,
}

impl MigrationReport {
    /// Returns the number of migration files applied.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Returns the version distance covered by the pass.
    ///
    /// Counts from zero when no migration had run before.
    #[must_use]
    pub fn version_delta(&self) -> u64 {
        let prior = self.prior_version.unwrap_or(0);
        self.current_version.unwrap_or(0).saturating_sub(prior)
    }
}
