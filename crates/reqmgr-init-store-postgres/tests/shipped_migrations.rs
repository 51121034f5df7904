//! Shipped migration set tests for reqmgr-init-store-postgres.
// crates/reqmgr-init-store-postgres/tests/shipped_migrations.rs
// ============================================================================
// Module: Shipped Migration Tests
// Description: Validates the repository's default migrations directory.
// Purpose: Catch naming or pairing mistakes before they reach a database.
// ============================================================================

#![allow(clippy::use_debug, reason = "Test failure messages render values with Debug.")]

use std::path::PathBuf;

use reqmgr_init_core::MigrationSource;
use reqmgr_init_core::TrackedTable;
use reqmgr_init_store_postgres::DirectoryMigrationSource;

type TestResult = Result<(), String>;

fn shipped_source() -> DirectoryMigrationSource {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    DirectoryMigrationSource::new(root)
}

#[test]
fn shipped_migrations_load_in_order_with_down_files() -> TestResult {
    let migrations = shipped_source().load().map_err(|err| err.to_string())?;
    let versions: Vec<u64> = migrations.iter().map(|migration| migration.version).collect();
    if versions != vec![1, 2] {
        return Err(format!("unexpected versions {versions:?}"));
    }
    if migrations.iter().any(|migration| migration.down.is_none()) {
        return Err("every shipped migration needs a down file".to_string());
    }
    Ok(())
}

#[test]
fn initial_schema_creates_every_tracked_table() -> TestResult {
    let migrations = shipped_source().load().map_err(|err| err.to_string())?;
    let initial = migrations.first().ok_or("no migrations shipped")?;
    for table in TrackedTable::ALL {
        let ddl = format!("CREATE TABLE IF NOT EXISTS {} (", table.table_name());
        if !initial.up.contains(&ddl) {
            return Err(format!("initial schema does not create {table}"));
        }
    }
    Ok(())
}
