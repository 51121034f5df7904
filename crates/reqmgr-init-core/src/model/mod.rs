// crates/reqmgr-init-core/src/model/mod.rs
// ============================================================================
// Module: Bootstrap Data Model
// Description: Records and value types shared by every initializer stage.
// Purpose: Group the data model behind a single re-export surface.
// Dependencies: serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! Core types are plain data: they never touch the database or the process
//! environment. Stages produce them and the orchestrator reports them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clock;
pub mod correlation;
pub mod error;
pub mod identity;
pub mod migration;
pub mod safety;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::duration_millis;
pub use clock::now_utc;
pub use correlation::CorrelationContext;
pub use correlation::CorrelationId;
pub use correlation::RUN_SCOPE_STEP;
pub use error::BootstrapError;
pub use error::ErrorKind;
pub use error::ErrorRecord;
pub use error::Severity;
pub use error::classify_message;
pub use identity::ADMIN_EMAIL;
pub use identity::ADMIN_PASSWORD_ENV;
pub use identity::ADMIN_USERNAME;
pub use identity::AdminIdentity;
pub use identity::MIN_ADMIN_PASSWORD_LENGTH;
pub use identity::Role;
pub use identity::check_admin_secret;
pub use migration::AppliedMigration;
pub use migration::Migration;
pub use migration::MigrationReport;
pub use migration::MigrationState;
pub use safety::DataSummary;
pub use safety::TableCount;
pub use safety::TableRowCount;
pub use safety::TrackedTable;
pub use safety::UNDEFINED_TABLE_SQLSTATE;
pub use safety::is_missing_table_error;
pub use summary::InitializationSummary;
pub use summary::RunMode;
pub use summary::StepStatus;
pub use summary::StepSummary;
