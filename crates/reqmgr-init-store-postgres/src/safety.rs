// crates/reqmgr-init-store-postgres/src/safety.rs
// ============================================================================
// Module: PostgreSQL Safety Check
// Description: Row counts for the tracked application tables.
// Purpose: Refuse to initialize a database that already holds data.
// Dependencies: postgres, r2d2
// ============================================================================

//! ## Overview
//! Each tracked table is counted with its own query so a missing table
//! surfaces as [`TableCount::Missing`] instead of aborting the whole check.
//! Table names come from a closed enum, never from input.

use postgres::error::SqlState;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::SafetyCheck;
use reqmgr_init_core::TableCount;
use reqmgr_init_core::TrackedTable;
use reqmgr_init_core::is_missing_table_error;

use crate::connector::PgPool;
use crate::connector::checkout;

/// Safety check bound to the run's pool.
pub struct PostgresSafetyCheck {
    /// Shared pool.
    pool: PgPool,
}

impl PostgresSafetyCheck {
    /// Binds a safety check to `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SafetyCheck for PostgresSafetyCheck {
    fn count_rows(&self, table: TrackedTable) -> Result<TableCount, BootstrapError> {
        let mut conn = checkout(&self.pool, BootstrapError::database)?;
        let query = format!("SELECT COUNT(*) FROM {}", table.table_name());
        match conn.query_one(query.as_str(), &[]) {
            Ok(row) => {
                let rows: i64 = row.try_get(0).map_err(|err| {
                    BootstrapError::database(format!("failed to read row count of {table}"))
                        .with_cause(err)
                })?;
                Ok(TableCount::Rows(u64::try_from(rows).unwrap_or(0)))
            }
            Err(err) => {
                let code = err.code().map(SqlState::code);
                if is_missing_table_error(code, &err.to_string()) {
                    return Ok(TableCount::Missing);
                }
                Err(BootstrapError::database(format!("failed to count rows in {table}"))
                    .with_context("table", table.table_name())
                    .with_context("sqlstate", code)
                    .with_cause(err))
            }
        }
    }
}
