// crates/reqmgr-init-store-postgres/src/health.rs
// ============================================================================
// Module: PostgreSQL Health Check
// Description: Bounded liveness ping and pool occupancy.
// Dependencies: postgres, r2d2
// ============================================================================

//! ## Overview
//! The check pings one pooled connection with a deadline and reads the
//! pool's occupancy. It never touches application tables.

use std::time::Duration;

use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::HealthProbe;
use reqmgr_init_core::PoolState;

use crate::connector::PgPool;

/// Health check bound to the run's pool. Issues no data queries.
pub struct PostgresHealthProbe {
    /// Shared pool.
    pool: PgPool,
}

impl PostgresHealthProbe {
    /// Binds a health check to `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HealthProbe for PostgresHealthProbe {
    fn ping(&self, timeout: Duration) -> Result<(), BootstrapError> {
        let mut conn = self.pool.get_timeout(timeout).map_err(|err| {
            BootstrapError::database(format!("database health check failed: {err}"))
        })?;
        conn.is_valid(timeout).map_err(|err| {
            BootstrapError::database("database health check failed: ping did not succeed")
                .with_context("timeout_ms", u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
                .with_cause(err)
        })
    }

    fn pool_state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_size: self.pool.max_size(),
        }
    }
}
