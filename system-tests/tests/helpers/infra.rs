// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: PostgreSQL fixtures for bootstrap system-tests.
// Purpose: Provide an isolated server and an empty database per test.
// Dependencies: testcontainers, postgres, reqmgr-init-store-postgres
// ============================================================================

//! ## Overview
//! [`PostgresFixture`] either points at `REQMGR_SYSTEM_PG_URL` or starts a
//! PostgreSQL container that lives as long as the fixture. Each call to
//! [`PostgresFixture::fresh_database`] creates a new empty database on it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use postgres::NoTls;
use postgres::config::Host;
use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_config::DatabaseTarget;
use reqmgr_init_config::Secret;
use reqmgr_init_config::SslMode;
use reqmgr_init_core::MapEnv;
use reqmgr_init_core::MigrationSource;
use reqmgr_init_store_postgres::BcryptHasher;
use reqmgr_init_store_postgres::DirectoryMigrationSource;
use reqmgr_init_store_postgres::PgPool;
use reqmgr_init_store_postgres::PostgresConnector;
use reqmgr_init_system_tests::config::SystemTestConfig;
use testcontainers::Container;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::core::WaitFor;
use testcontainers::runners::SyncRunner;
use uuid::Uuid;

/// Bootstrap secret used by every scenario.
pub const ADMIN_SECRET: &str = "system-test-secret";
/// Bcrypt cost for tests; the minimum keeps hashing fast.
const TEST_BCRYPT_COST: u32 = 4;
/// Login role and password of the started container.
const CONTAINER_ROLE: &str = "reqmgr";

// ============================================================================
// SECTION: Server Fixture
// ============================================================================

/// A reachable PostgreSQL server.
pub struct PostgresFixture {
    /// Server host.
    host: String,
    /// Server port.
    port: u16,
    /// Superuser-capable login role.
    user: String,
    /// Login password.
    password: String,
    /// Database used for administrative statements.
    admin_database: String,
    /// Container kept alive for the fixture's lifetime.
    _container: Option<Container<GenericImage>>,
}

impl PostgresFixture {
    /// Connects to the configured server or starts a container.
    pub fn start() -> Result<Self, String> {
        let config = SystemTestConfig::load()?;
        let fixture = match &config.pg_url {
            Some(url) => Self::from_url(url)?,
            None => Self::from_container(config.image_tag())?,
        };
        wait_for_postgres_blocking(&fixture.url(&fixture.admin_database), config.readiness_timeout())?;
        Ok(fixture)
    }

    /// Uses an external server described by `url`.
    fn from_url(url: &str) -> Result<Self, String> {
        let parsed = postgres::Config::from_str(url).map_err(|err| format!("invalid server url: {err}"))?;
        let host = match parsed.get_hosts().first() {
            Some(Host::Tcp(host)) => host.clone(),
            _ => return Err("server url must name a TCP host".to_string()),
        };
        Ok(Self {
            host,
            port: parsed.get_ports().first().copied().unwrap_or(5432),
            user: parsed.get_user().unwrap_or("postgres").to_string(),
            password: parsed
                .get_password()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default(),
            admin_database: parsed.get_dbname().unwrap_or("postgres").to_string(),
            _container: None,
        })
    }

    /// Starts a disposable PostgreSQL container.
    fn from_container(tag: &str) -> Result<Self, String> {
        ensure_docker_available()?;
        let container = GenericImage::new("postgres", tag)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", CONTAINER_ROLE)
            .with_env_var("POSTGRES_PASSWORD", CONTAINER_ROLE)
            .with_env_var("POSTGRES_DB", "postgres")
            .start()
            .map_err(|err| format!("failed to start postgres container: {err}"))?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .map_err(|err| format!("failed to resolve postgres port: {err}"))?;
        let host = container
            .get_host()
            .map_err(|err| format!("failed to resolve postgres host: {err}"))?
            .to_string();
        Ok(Self {
            host,
            port,
            user: CONTAINER_ROLE.to_string(),
            password: CONTAINER_ROLE.to_string(),
            admin_database: "postgres".to_string(),
            _container: Some(container),
        })
    }

    /// Returns a connection URL for `database`.
    fn url(&self, database: &str) -> String {
        format!("postgres://{}:{}@{}:{}/{database}", self.user, self.password, self.host, self.port)
    }

    /// Creates an empty database with a unique name.
    pub fn fresh_database(&self) -> Result<TestDatabase, String> {
        let name = format!("reqmgr_{}", Uuid::new_v4().simple());
        let mut client = postgres::Client::connect(&self.url(&self.admin_database), NoTls)
            .map_err(|err| format!("admin connection failed: {err}"))?;
        client
            .batch_execute(&format!("CREATE DATABASE {name}"))
            .map_err(|err| format!("create database failed: {err}"))?;
        Ok(TestDatabase {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            name,
        })
    }
}

// ============================================================================
// SECTION: Test Database
// ============================================================================

/// One empty database on the fixture server.
pub struct TestDatabase {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub name: String,
}

impl TestDatabase {
    /// Opens a direct client for assertions and seeding.
    pub fn client(&self) -> Result<postgres::Client, String> {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        );
        postgres::Client::connect(&url, NoTls).map_err(|err| format!("client connection failed: {err}"))
    }

    /// Returns a complete, valid initializer environment for this database.
    pub fn env(&self) -> MapEnv {
        MapEnv::new()
            .with("DB_HOST", self.host.clone())
            .with("DB_PORT", self.port.to_string())
            .with("DB_USER", self.user.clone())
            .with("DB_PASSWORD", self.password.clone())
            .with("DB_NAME", self.name.clone())
            .with("DB_SSLMODE", "disable")
            .with("JWT_SECRET", "system-test-signing-secret")
            .with("DEFAULT_ADMIN_PASSWORD", ADMIN_SECRET)
    }

    /// Returns the configuration materialized from [`TestDatabase::env`].
    pub fn config(&self) -> BootstrapConfig {
        BootstrapConfig::from_env(&self.env())
    }

    /// Returns connector-ready coordinates.
    pub fn target(&self) -> DatabaseTarget {
        DatabaseTarget {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: Secret::new(self.password.clone()),
            name: self.name.clone(),
            sslmode: SslMode::Disable,
        }
    }

    /// Returns a connector over the shipped migrations.
    pub fn connector(&self) -> PostgresConnector {
        self.connector_with(Arc::new(DirectoryMigrationSource::new(shipped_migrations())), self.env())
    }

    /// Returns a connector over `source` reading secrets from `env`.
    pub fn connector_with(
        &self,
        source: Arc<dyn MigrationSource + Send + Sync>,
        env: MapEnv,
    ) -> PostgresConnector {
        PostgresConnector::new(source, Arc::new(BcryptHasher::with_cost(TEST_BCRYPT_COST)), Arc::new(env))
    }

    /// Opens a pool on this database.
    pub fn pool(&self) -> Result<PgPool, String> {
        self.connector()
            .prepare(&self.target())
            .and_then(|prepared| prepared.open())
            .map_err(|err| err.to_string())
    }
}

/// Returns the repository's default migrations directory.
pub fn shipped_migrations() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../migrations")
}

// ============================================================================
// SECTION: Readiness
// ============================================================================

/// Polls `url` until the server answers or `timeout` elapses.
pub fn wait_for_postgres_blocking(url: &str, timeout: Duration) -> Result<(), String> {
    let start = Instant::now();
    let mut last_error = "unknown error".to_string();
    loop {
        if start.elapsed() > timeout {
            return Err(format!("postgres readiness timeout: {last_error}"));
        }
        match postgres::Client::connect(url, NoTls) {
            Ok(mut client) => match client.simple_query("SELECT 1") {
                Ok(_) => return Ok(()),
                Err(err) => last_error = err.to_string(),
            },
            Err(err) => last_error = err.to_string(),
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

/// Fails early with a clear message when Docker is unavailable.
fn ensure_docker_available() -> Result<(), String> {
    let output = std::process::Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}
