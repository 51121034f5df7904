// system-tests/src/lib.rs
// ============================================================================
// Module: Bootstrap Initializer System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the `reqmgr-init`
//! system-test binaries in `system-tests/tests`. The binaries only build
//! with the `system-tests` feature because they need Docker or an external
//! PostgreSQL server.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
