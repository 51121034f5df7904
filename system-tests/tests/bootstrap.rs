//! End-to-end bootstrap scenarios against PostgreSQL.
// system-tests/tests/bootstrap.rs
// ============================================================================
// Module: Bootstrap Scenarios
// Description: Full initializer runs against a live database.
// Purpose: Verify the persisted outcome of successful and refused runs.
// Dependencies: system-test helpers, reqmgr-init-cli
// ============================================================================

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::indexing_slicing,
    reason = "Test-only helpers and assertions."
)]

mod helpers;

use helpers::infra::ADMIN_SECRET;
use helpers::infra::PostgresFixture;
use helpers::infra::TestDatabase;
use reqmgr_init_cli::run_full;
use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_core::CorrelationContext;
use reqmgr_init_core::ErrorKind;
use reqmgr_init_core::PasswordHasher;
use reqmgr_init_core::TrackedTable;
use reqmgr_init_store_postgres::BcryptHasher;
use uuid::Uuid;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Persisted administrator row.
struct AdminRow {
    /// Generated id.
    id: Uuid,
    /// Stored hash.
    password_hash: String,
    /// Stored role.
    role: String,
    /// Stored email.
    email: String,
}

fn admin_rows(database: &TestDatabase) -> Result<Vec<AdminRow>, Box<dyn std::error::Error>> {
    let mut client = database.client()?;
    let rows = client.query(
        "SELECT id, password_hash, role, email FROM users WHERE username = 'admin'",
        &[],
    )?;
    Ok(rows
        .iter()
        .map(|row| AdminRow {
            id: row.get(0),
            password_hash: row.get(1),
            role: row.get(2),
            email: row.get(3),
        })
        .collect())
}

fn migration_state(database: &TestDatabase) -> Result<(i64, bool), Box<dyn std::error::Error>> {
    let mut client = database.client()?;
    let row = client.query_one("SELECT version, dirty FROM schema_migrations", &[])?;
    Ok((row.get(0), row.get(1)))
}

#[test]
fn happy_path_migrates_and_seeds_one_administrator() -> TestResult {
    let server = PostgresFixture::start()?;
    let database = server.fresh_database()?;

    let mut context = CorrelationContext::new();
    let summary = run_full(&database.config(), &database.connector(), &mut context)?;

    if summary.migrations_applied != 2 || summary.schema_version != Some(2) || !summary.admin_created {
        return Err("summary does not reflect a complete initialization".into());
    }
    if migration_state(&database)? != (2, false) {
        return Err("schema_migrations must hold version 2, clean".into());
    }
    let admins = admin_rows(&database)?;
    let [admin] = admins.as_slice() else {
        return Err(format!("expected exactly one admin, found {}", admins.len()).into());
    };
    if admin.role != "Administrator" || admin.email != "admin@localhost" {
        return Err("administrator identity fields are wrong".into());
    }
    if admin.password_hash == ADMIN_SECRET || !admin.password_hash.starts_with("$2a$") {
        return Err("administrator secret was not hashed with bcrypt $2a$".into());
    }
    if !BcryptHasher::new().verify(ADMIN_SECRET, &admin.password_hash)? {
        return Err("stored hash does not verify against the secret".into());
    }
    let created = summary.step("create_admin_user").ok_or("missing create_admin_user step")?;
    if created.details.get("admin_id") != Some(&serde_json::json!(admin.id)) {
        return Err("step details do not report the created id".into());
    }
    Ok(())
}

#[test]
fn non_empty_database_is_refused_without_changes() -> TestResult {
    let server = PostgresFixture::start()?;
    let database = server.fresh_database()?;
    let mut client = database.client()?;
    client.batch_execute(
        "CREATE TABLE users (id SERIAL PRIMARY KEY, username TEXT NOT NULL); \
         INSERT INTO users (username) VALUES ('existing');",
    )?;

    let mut context = CorrelationContext::new();
    let Err(failure) = run_full(&database.config(), &database.connector(), &mut context) else {
        return Err("run must be refused".into());
    };

    if failure.error.kind() != ErrorKind::Safety || failure.exit_code() != 3 {
        return Err(format!("expected safety exit 3, got {}", failure.exit_code()).into());
    }
    if failure.error.is_recoverable() || !failure.error.message().contains("users: 1 records") {
        return Err("safety failure must be non-recoverable and list users".into());
    }
    let migrated: bool = client
        .query_one("SELECT to_regclass('schema_migrations') IS NOT NULL", &[])?
        .get(0);
    if migrated {
        return Err("refused run must not create schema_migrations".into());
    }
    let admins: i64 = client.query_one("SELECT COUNT(*) FROM users WHERE username = 'admin'", &[])?.get(0);
    if admins != 0 {
        return Err("refused run must not create an administrator".into());
    }
    Ok(())
}

#[test]
fn second_run_is_refused_and_leaves_the_administrator_unchanged() -> TestResult {
    let server = PostgresFixture::start()?;
    let database = server.fresh_database()?;
    run_full(&database.config(), &database.connector(), &mut CorrelationContext::new())?;
    let before = admin_rows(&database)?;

    let Err(failure) =
        run_full(&database.config(), &database.connector(), &mut CorrelationContext::new())
    else {
        return Err("second run must be refused".into());
    };

    if failure.exit_code() != 3 {
        return Err(format!("expected exit 3, got {}", failure.exit_code()).into());
    }
    let after = admin_rows(&database)?;
    let unchanged = before.len() == 1
        && after.len() == 1
        && before[0].id == after[0].id
        && before[0].password_hash == after[0].password_hash;
    if !unchanged {
        return Err("administrator row changed across runs".into());
    }
    if migration_state(&database)? != (2, false) {
        return Err("second run must not touch the migration state".into());
    }
    Ok(())
}

#[test]
fn rerun_after_configuration_repair_succeeds() -> TestResult {
    let server = PostgresFixture::start()?;
    let database = server.fresh_database()?;

    let weak = BootstrapConfig::from_env(&database.env().with("DEFAULT_ADMIN_PASSWORD", "short"));
    let Err(failure) = run_full(&weak, &database.connector(), &mut CorrelationContext::new()) else {
        return Err("weak secret must be refused".into());
    };
    if failure.exit_code() != 1 {
        return Err(format!("expected exit 1, got {}", failure.exit_code()).into());
    }
    let mut client = database.client()?;
    for table in TrackedTable::ALL {
        let exists: bool = client
            .query_one(&format!("SELECT to_regclass('{}') IS NOT NULL", table.table_name()), &[])?
            .get(0);
        if exists {
            return Err(format!("configuration failure created {table}").into());
        }
    }

    run_full(&database.config(), &database.connector(), &mut CorrelationContext::new())?;
    if admin_rows(&database)?.len() != 1 {
        return Err("repaired run must create the administrator".into());
    }
    Ok(())
}
