// crates/reqmgr-init-store-postgres/src/connector.rs
// ============================================================================
// Module: PostgreSQL Connector
// Description: Connection configuration, TLS setup, and pool construction.
// Purpose: Open the run's single pool and bind stage components to it.
// Dependencies: postgres, r2d2, r2d2_postgres, rustls, tokio-postgres-rustls
// ============================================================================

//! ## Overview
//! Connecting is split in two so a dry run can exercise everything short of
//! the network: [`PostgresConnector::prepare`] builds the connection config
//! and TLS connector, [`PreparedConnection::open`] makes a single connection
//! attempt and then builds the pool. A refused attempt fails immediately;
//! there are no retries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use postgres::config::SslMode as PgSslMode;
use r2d2::ManageConnection;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use reqmgr_init_config::DatabaseTarget;
use reqmgr_init_config::SslMode;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::BoundComponents;
use reqmgr_init_core::EnvSource;
use reqmgr_init_core::MigrationSource;
use reqmgr_init_core::PasswordHasher;
use rustls::ClientConfig;
use rustls::RootCertStore;
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::admin::PostgresAdminProvisioner;
use crate::health::PostgresHealthProbe;
use crate::migrator::PostgresMigrator;
use crate::safety::PostgresSafetyCheck;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Application name reported to the server.
pub const APPLICATION_NAME: &str = "reqmgr-init";
/// Pool ceiling; stages run sequentially and the migrator pins one connection.
pub const POOL_MAX_SIZE: u32 = 4;
/// Upper bound on establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking pool over TLS-capable connections.
pub type PgPool = Pool<PostgresConnectionManager<MakeRustlsConnect>>;

/// Shared migration source handed to the migrator.
pub type SharedMigrationSource = Arc<dyn MigrationSource + Send + Sync>;
/// Shared password hasher handed to the administrator creator.
pub type SharedPasswordHasher = Arc<dyn PasswordHasher + Send + Sync>;
/// Shared environment handed to the administrator creator.
pub type SharedEnv = Arc<dyn EnvSource + Send + Sync>;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Builds the driver connection config for `target`.
#[must_use]
pub fn build_connection_config(target: &DatabaseTarget) -> postgres::Config {
    let mut config = postgres::Config::new();
    config
        .host(&target.host)
        .port(target.port)
        .user(&target.user)
        .password(target.password.expose())
        .dbname(&target.name)
        .ssl_mode(match target.sslmode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        })
        .connect_timeout(CONNECT_TIMEOUT)
        .application_name(APPLICATION_NAME);
    config
}

/// Builds the rustls connector used when the server negotiates TLS.
///
/// Server certificates are verified against the Mozilla root set.
///
/// # Errors
///
/// Returns a Database-kind [`BootstrapError`] when the TLS configuration
/// cannot be built.
pub fn build_tls_connector() -> Result<MakeRustlsConnect, BootstrapError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|err| {
        BootstrapError::database("failed to configure TLS for database connections")
            .with_cause(err)
    })?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(MakeRustlsConnect::new(config))
}

// ============================================================================
// SECTION: Prepared Connection
// ============================================================================

/// Connection settings ready to open, without any network activity yet.
pub struct PreparedConnection {
    /// Driver configuration.
    config: postgres::Config,
    /// TLS connector.
    tls: MakeRustlsConnect,
    /// Host label for error messages.
    host: String,
    /// Port for error messages.
    port: u16,
    /// Database name; also seeds the migration lock key.
    database: String,
}

impl PreparedConnection {
    /// Returns the target database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the target host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Makes one connection attempt, then builds the pool.
    ///
    /// The attempt is not retried. Once it succeeds the pool keeps its own
    /// connections.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] carrying the driver error
    /// when the attempt fails.
    pub fn open(self) -> Result<PgPool, BootstrapError> {
        let manager = PostgresConnectionManager::new(self.config, self.tls);
        let first = manager.connect().map_err(|err| {
            BootstrapError::database(format!(
                "failed to connect to database {}:{}/{}",
                self.host, self.port, self.database
            ))
            .with_context("host", &self.host)
            .with_context("port", self.port)
            .with_context("database", &self.database)
            .with_cause(err)
        })?;
        drop(first);
        Ok(Pool::builder()
            .max_size(POOL_MAX_SIZE)
            .min_idle(Some(1))
            .connection_timeout(CONNECT_TIMEOUT)
            .build_unchecked(manager))
    }
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// Opens the run's pool and binds stage components to it.
#[derive(Clone)]
pub struct PostgresConnector {
    /// Migration files for the migrator.
    source: SharedMigrationSource,
    /// Hasher for the administrator creator.
    hasher: SharedPasswordHasher,
    /// Environment the administrator secret is read from.
    env: SharedEnv,
}

impl PostgresConnector {
    /// Creates a connector with injected collaborators.
    #[must_use]
    pub fn new(source: SharedMigrationSource, hasher: SharedPasswordHasher, env: SharedEnv) -> Self {
        Self { source, hasher, env }
    }

    /// Returns the migration source handed to migrators.
    #[must_use]
    pub const fn migration_source(&self) -> &SharedMigrationSource {
        &self.source
    }

    /// Returns the password hasher handed to administrator creators.
    #[must_use]
    pub const fn password_hasher(&self) -> &SharedPasswordHasher {
        &self.hasher
    }

    /// Builds connection settings and the TLS connector for `target`.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] when TLS setup fails.
    pub fn prepare(&self, target: &DatabaseTarget) -> Result<PreparedConnection, BootstrapError> {
        Ok(PreparedConnection {
            config: build_connection_config(target),
            tls: build_tls_connector()?,
            host: target.host.clone(),
            port: target.port,
            database: target.name.clone(),
        })
    }

    /// Opens the pool for `target` and binds every stage component to it.
    ///
    /// # Errors
    ///
    /// Returns a Database-kind [`BootstrapError`] when connecting fails.
    pub fn connect(&self, target: &DatabaseTarget) -> Result<BoundComponents, BootstrapError> {
        let prepared = self.prepare(target)?;
        let database = prepared.database().to_string();
        let pool = prepared.open()?;
        Ok(self.bind(&pool, &database))
    }

    /// Binds stage components to an open pool.
    #[must_use]
    pub fn bind(&self, pool: &PgPool, database: &str) -> BoundComponents {
        BoundComponents {
            health: Box::new(PostgresHealthProbe::new(pool.clone())),
            safety: Box::new(PostgresSafetyCheck::new(pool.clone())),
            migrator: Box::new(PostgresMigrator::new(pool.clone(), Arc::clone(&self.source), database)),
            admin: Box::new(PostgresAdminProvisioner::new(
                pool.clone(),
                Arc::clone(&self.hasher),
                Arc::clone(&self.env),
            )),
        }
    }
}

/// Checks out a pooled connection, mapping failures with `error`.
pub(crate) fn checkout(
    pool: &PgPool,
    error: fn(String) -> BootstrapError,
) -> Result<r2d2::PooledConnection<PostgresConnectionManager<MakeRustlsConnect>>, BootstrapError> {
    pool.get().map_err(|err| error(format!("failed to acquire database connection: {err}")))
}
