// crates/reqmgr-init-store-postgres/src/migrator.rs
// ============================================================================
// Module: PostgreSQL Migrator
// Description: Forward-only schema migration with dirty-state tracking.
// Purpose: Move the schema to the newest version without half-applied steps.
// Dependencies: postgres, r2d2, sha2
// ============================================================================

//! ## Overview
//! The migrator keeps one `(version, dirty)` row in `schema_migrations`.
//! Before a script runs, its version is committed as dirty; the script and
//! the clean record then commit together. A crash mid-script leaves the
//! dirty row behind, and every later run refuses to continue until an
//! operator repairs it by hand.
//!
//! ## Invariants
//! - All state changes happen while holding a session advisory lock on one
//!   dedicated connection, so concurrent migrators serialize.
//! - The lock is released on every return path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use postgres::Client;
use postgres::GenericClient;
use postgres::error::SqlState;
use reqmgr_init_core::AppliedMigration;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::Migration;
use reqmgr_init_core::MigrationReport;
use reqmgr_init_core::MigrationSource;
use reqmgr_init_core::MigrationState;
use reqmgr_init_core::SchemaMigrator;
use reqmgr_init_core::duration_millis;
use reqmgr_init_core::is_missing_table_error;
use sha2::Digest;
use sha2::Sha256;

use crate::connector::PgPool;
use crate::connector::checkout;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version bookkeeping table.
const VERSION_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (version BIGINT \
                                 NOT NULL PRIMARY KEY, dirty BOOLEAN NOT NULL)";
/// Namespace mixed into the advisory lock key.
const LOCK_NAMESPACE: &str = "reqmgr-init:schema_migrations:";

/// Derives the advisory lock key for `database`.
///
/// The key is the first eight bytes of SHA-256 over a fixed namespace and
/// the database name, read as a big-endian signed integer.
#[must_use]
pub fn advisory_lock_key(database: &str) -> i64 {
    let digest = Sha256::new().chain_update(LOCK_NAMESPACE).chain_update(database).finalize();
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[.. 8]);
    i64::from_be_bytes(prefix)
}

// ============================================================================
// SECTION: Migrator
// ============================================================================

/// Migrator bound to the run's pool.
pub struct PostgresMigrator {
    /// Shared pool.
    pool: PgPool,
    /// Migration files.
    source: Arc<dyn MigrationSource + Send + Sync>,
    /// Advisory lock key for the target database.
    lock_key: i64,
}

impl PostgresMigrator {
    /// Binds a migrator to `pool` for `database`.
    #[must_use]
    pub fn new(pool: PgPool, source: Arc<dyn MigrationSource + Send + Sync>, database: &str) -> Self {
        Self { pool, source, lock_key: advisory_lock_key(database) }
    }

    /// Runs `work` on one connection while holding the migration lock.
    fn with_lock<T>(
        &self,
        work: impl FnOnce(&mut Client) -> Result<T, BootstrapError>,
    ) -> Result<T, BootstrapError> {
        let mut conn = checkout(&self.pool, BootstrapError::migration)?;
        conn.execute("SELECT pg_advisory_lock($1)", &[&self.lock_key]).map_err(|err| {
            BootstrapError::migration("failed to acquire migration lock")
                .with_context("lock_key", self.lock_key)
                .with_cause(err)
        })?;
        let outcome = work(&mut *conn);
        let released = conn.execute("SELECT pg_advisory_unlock($1)", &[&self.lock_key]);
        match (outcome, released) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) => Err(BootstrapError::migration("failed to release migration lock")
                .with_context("lock_key", self.lock_key)
                .with_cause(err)),
            (Err(error), _) => Err(error),
        }
    }

    /// Loads migrations from the source.
    fn load(&self) -> Result<Vec<Migration>, BootstrapError> {
        Ok(self.source.load()?)
    }
}

impl SchemaMigrator for PostgresMigrator {
    fn current_version(&self) -> Result<Option<MigrationState>, BootstrapError> {
        let mut conn = checkout(&self.pool, BootstrapError::migration)?;
        read_state(&mut *conn)
    }

    fn apply_forward(&self) -> Result<MigrationReport, BootstrapError> {
        let migrations = self.load()?;
        self.with_lock(|client| {
            client.batch_execute(VERSION_TABLE_DDL).map_err(|err| {
                BootstrapError::migration("failed to create schema_migrations table").with_cause(err)
            })?;
            let prior = read_state(client)?;
            if let Some(state) = prior {
                ensure_clean(state)?;
                if !migrations.iter().any(|migration| migration.version == state.version) {
                    return Err(BootstrapError::migration(format!(
                        "database is at version {} which is not present in the migration source",
                        state.version
                    ))
                    .with_context("version", state.version));
                }
            }
            let prior_version = prior.map(|state| state.version);

            let mut applied = Vec::new();
            for migration in
                migrations.iter().filter(|migration| prior_version.is_none_or(|prior| migration.version > prior))
            {
                let started = Instant::now();
                apply_one(client, migration)?;
                applied.push(AppliedMigration {
                    version: migration.version,
                    name: migration.name.clone(),
                    duration_ms: duration_millis(started.elapsed()),
                });
            }

            let current_version = read_state(client)?.map(|state| state.version);
            Ok(MigrationReport { prior_version, current_version, applied })
        })
    }

    fn validate_schema(&self) -> Result<(), BootstrapError> {
        let mut conn = checkout(&self.pool, BootstrapError::migration)?;
        conn.query_one("SELECT COUNT(*) FROM schema_migrations", &[]).map(|_| ()).map_err(|err| {
            BootstrapError::migration("schema_migrations table is missing or unreadable").with_cause(err)
        })
    }

    fn rollback_one(&self) -> Result<Option<MigrationState>, BootstrapError> {
        let migrations = self.load()?;
        self.with_lock(|client| {
            let Some(state) = read_state(client)? else {
                return Err(BootstrapError::migration("no applied migration to roll back"));
            };
            ensure_clean(state)?;
            let position = migrations
                .iter()
                .position(|migration| migration.version == state.version)
                .ok_or_else(|| {
                    BootstrapError::migration(format!(
                        "version {} is not present in the migration source",
                        state.version
                    ))
                })?;
            let migration = &migrations[position];
            let down = migration.down.as_deref().ok_or_else(|| {
                BootstrapError::migration(format!("migration {} has no down file", migration.version))
            })?;
            let target = position.checked_sub(1).and_then(|index| migrations.get(index));

            write_state(client, migration.version, true)?;
            let mut tx = client.transaction().map_err(|err| migration_failure(migration, err))?;
            tx.batch_execute(down).map_err(|err| migration_failure(migration, err))?;
            match target {
                Some(previous) => write_state(&mut tx, previous.version, false)?,
                None => {
                    tx.batch_execute("TRUNCATE schema_migrations")
                        .map_err(|err| migration_failure(migration, err))?;
                }
            }
            tx.commit().map_err(|err| migration_failure(migration, err))?;
            Ok(target.map(|previous| MigrationState { version: previous.version, dirty: false }))
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Applies one migration: dirty marker commit, then script plus clean marker.
fn apply_one(client: &mut Client, migration: &Migration) -> Result<(), BootstrapError> {
    write_state(client, migration.version, true)?;
    let mut tx = client.transaction().map_err(|err| migration_failure(migration, err))?;
    tx.batch_execute(&migration.up).map_err(|err| migration_failure(migration, err))?;
    write_state(&mut tx, migration.version, false)?;
    tx.commit().map_err(|err| migration_failure(migration, err))
}

/// Builds the failure for a script that did not complete.
fn migration_failure(migration: &Migration, err: postgres::Error) -> BootstrapError {
    BootstrapError::migration(format!(
        "migration {} ({}) failed; database left dirty at version {}",
        migration.version, migration.name, migration.version
    ))
    .with_context("version", migration.version)
    .with_context("name", &migration.name)
    .with_context("dirty", true)
    .with_cause(err)
}

/// Refuses to continue from a dirty state.
fn ensure_clean(state: MigrationState) -> Result<(), BootstrapError> {
    if state.dirty {
        return Err(BootstrapError::migration(format!(
            "database is in dirty migration state at version {}; manual repair required",
            state.version
        ))
        .with_context("version", state.version)
        .with_context("dirty", true));
    }
    Ok(())
}

/// Reads the persisted state; `None` when the table is absent or empty.
fn read_state(client: &mut impl GenericClient) -> Result<Option<MigrationState>, BootstrapError> {
    let row = match client.query_opt("SELECT version, dirty FROM schema_migrations LIMIT 1", &[]) {
        Ok(row) => row,
        Err(err) => {
            let code = err.code().map(SqlState::code);
            if is_missing_table_error(code, &err.to_string()) {
                return Ok(None);
            }
            return Err(BootstrapError::migration("failed to read migration state").with_cause(err));
        }
    };
    let Some(row) = row else {
        return Ok(None);
    };
    let version: i64 = row.get(0);
    let dirty: bool = row.get(1);
    let version = u64::try_from(version).map_err(|_| {
        BootstrapError::migration(format!("schema_migrations holds a negative version {version}"))
    })?;
    Ok(Some(MigrationState { version, dirty }))
}

/// Replaces the persisted state with `(version, dirty)`.
fn write_state(client: &mut impl GenericClient, version: u64, dirty: bool) -> Result<(), BootstrapError> {
    let stored = i64::try_from(version).map_err(|_| {
        BootstrapError::migration(format!("migration version {version} exceeds BIGINT range"))
    })?;
    let failure = |err: postgres::Error| {
        BootstrapError::migration(format!("failed to record migration version {version}"))
            .with_context("version", version)
            .with_context("dirty", dirty)
            .with_cause(err)
    };
    let mut tx = client.transaction().map_err(failure)?;
    tx.batch_execute("TRUNCATE schema_migrations").map_err(failure)?;
    tx.execute("INSERT INTO schema_migrations (version, dirty) VALUES ($1, $2)", &[&stored, &dirty])
        .map_err(failure)?;
    tx.commit().map_err(failure)
}
