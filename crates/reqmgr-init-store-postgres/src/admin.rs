// crates/reqmgr-init-store-postgres/src/admin.rs
// ============================================================================
// Module: PostgreSQL Administrator Provisioner
// Description: Creates the seeded administrator identity in one transaction.
// Purpose: Leave exactly one administrator behind, or none at all.
// Dependencies: postgres, r2d2, uuid
// ============================================================================

//! ## Overview
//! The secret is read, checked, and hashed before any connection is taken.
//! The existence check and insert share one transaction so a concurrent
//! writer cannot slip a second `admin` row in between.

use reqmgr_init_core::ADMIN_EMAIL;
use reqmgr_init_core::ADMIN_PASSWORD_ENV;
use reqmgr_init_core::ADMIN_USERNAME;
use reqmgr_init_core::AdminIdentity;
use reqmgr_init_core::AdminProvisioner;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::Role;
use reqmgr_init_core::check_admin_secret;
use uuid::Uuid;

use crate::connector::PgPool;
use crate::connector::SharedEnv;
use crate::connector::SharedPasswordHasher;
use crate::connector::checkout;

/// Administrator creator bound to the run's pool.
pub struct PostgresAdminProvisioner {
    /// Shared pool.
    pool: PgPool,
    /// Password hashing primitive.
    hasher: SharedPasswordHasher,
    /// Environment holding the bootstrap secret.
    env: SharedEnv,
}

impl PostgresAdminProvisioner {
    /// Binds a provisioner to `pool`.
    #[must_use]
    pub fn new(pool: PgPool, hasher: SharedPasswordHasher, env: SharedEnv) -> Self {
        Self { pool, hasher, env }
    }

    /// Reads, checks, and hashes the bootstrap secret.
    fn hashed_secret(&self) -> Result<String, BootstrapError> {
        let secret = self.env.var(ADMIN_PASSWORD_ENV).ok_or_else(|| {
            BootstrapError::creation(format!("{ADMIN_PASSWORD_ENV} environment variable is not set"))
        })?;
        check_admin_secret(&secret).map_err(BootstrapError::creation)?;
        self.hasher.hash(&secret).map_err(|err| {
            BootstrapError::creation("failed to hash administrator password").with_cause(err)
        })
    }
}

/// Builds a creation failure around a driver error.
fn creation_failure(message: &str, err: postgres::Error) -> BootstrapError {
    BootstrapError::creation(message.to_string()).with_cause(err)
}

impl AdminProvisioner for PostgresAdminProvisioner {
    fn create_admin(&self) -> Result<AdminIdentity, BootstrapError> {
        let password_hash = self.hashed_secret()?;
        let mut conn = checkout(&self.pool, BootstrapError::creation)?;
        let mut tx = conn
            .transaction()
            .map_err(|err| creation_failure("failed to begin administrator transaction", err))?;

        let existing = tx
            .query_opt("SELECT id FROM users WHERE username = $1", &[&ADMIN_USERNAME])
            .map_err(|err| creation_failure("failed to look up existing administrator", err))?;
        if existing.is_some() {
            tx.rollback()
                .map_err(|err| creation_failure("failed to roll back administrator transaction", err))?;
            return Err(BootstrapError::creation("admin user already exists")
                .with_context("username", ADMIN_USERNAME));
        }

        let row = tx
            .query_one(
                "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) \
                 RETURNING id",
                &[&ADMIN_USERNAME, &ADMIN_EMAIL, &password_hash, &Role::Administrator.as_str()],
            )
            .map_err(|err| creation_failure("failed to insert administrator", err))?;
        let id: Uuid = row
            .try_get(0)
            .map_err(|err| creation_failure("failed to read administrator id", err))?;
        tx.commit().map_err(|err| creation_failure("failed to commit administrator", err))?;
        Ok(AdminIdentity::seeded(id))
    }

    fn administrator_exists(&self) -> Result<bool, BootstrapError> {
        let mut conn = checkout(&self.pool, BootstrapError::database)?;
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR role = $2)",
                &[&ADMIN_USERNAME, &Role::Administrator.as_str()],
            )
            .map_err(|err| {
                BootstrapError::database("failed to check for an existing administrator").with_cause(err)
            })?;
        row.try_get(0).map_err(|err| {
            BootstrapError::database("failed to read administrator existence").with_cause(err)
        })
    }
}
