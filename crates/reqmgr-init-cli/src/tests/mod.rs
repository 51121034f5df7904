// crates/reqmgr-init-cli/src/tests/mod.rs
// ============================================================================
// Module: CLI Library Unit Tests
// Description: Unit tests for crate-private catalog and logging helpers.
// ============================================================================

//! ## Overview
//! Groups unit tests that need access to crate-private items.

mod i18n;
