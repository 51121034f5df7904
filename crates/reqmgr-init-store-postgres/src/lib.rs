// crates/reqmgr-init-store-postgres/src/lib.rs
// ============================================================================
// Module: PostgreSQL Stage Components
// Description: PostgreSQL implementations of the initializer stage interfaces.
// Purpose: Connect, health-check, inspect, migrate, and seed a PostgreSQL database.
// Dependencies: reqmgr-init-core, reqmgr-init-config, postgres, r2d2, rustls
// ============================================================================

//! ## Overview
//! [`PostgresConnector`] opens one blocking connection pool and binds every
//! database-facing stage component to it. Components share the pool; dropping
//! the returned [`reqmgr_init_core::BoundComponents`] closes it.
//!
//! Security posture: the administrator secret is read from the injected
//! environment, hashed before it reaches SQL, and never logged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod admin;
pub mod connector;
pub mod hasher;
pub mod health;
pub mod migration_source;
pub mod migrator;
pub mod safety;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use admin::PostgresAdminProvisioner;
pub use connector::APPLICATION_NAME;
pub use connector::CONNECT_TIMEOUT;
pub use connector::PgPool;
pub use connector::POOL_MAX_SIZE;
pub use connector::PostgresConnector;
pub use connector::PreparedConnection;
pub use connector::SharedEnv;
pub use connector::SharedMigrationSource;
pub use connector::SharedPasswordHasher;
pub use connector::build_connection_config;
pub use connector::build_tls_connector;
pub use hasher::BCRYPT_COST;
pub use hasher::BcryptHasher;
pub use health::PostgresHealthProbe;
pub use migration_source::DirectoryMigrationSource;
pub use migrator::PostgresMigrator;
pub use migrator::advisory_lock_key;
pub use safety::PostgresSafetyCheck;
