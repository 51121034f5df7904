// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for bootstrap system-tests.
// Purpose: Provide PostgreSQL fixtures and per-test databases.
// Dependencies: reqmgr-init-system-tests, postgres, testcontainers
// ============================================================================

//! ## Overview
//! Shared helpers for bootstrap system-tests.
//! Every test works in its own freshly created database, so tests sharing
//! one server never observe each other's schema or rows.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod infra;
