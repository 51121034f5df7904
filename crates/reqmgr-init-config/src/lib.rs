// crates/reqmgr-init-config/src/lib.rs
// ============================================================================
// Module: Bootstrap Config Library
// Description: Environment-sourced configuration model and validation.
// Purpose: Single source of truth for initializer configuration policy.
// Dependencies: reqmgr-init-core, dotenvy, serde
// ============================================================================

//! ## Overview
//! `reqmgr-init-config` materializes the initializer configuration from an
//! [`reqmgr_init_core::EnvSource`], applies defaults, and validates it in one
//! pass that reports every missing and invalid setting together.
//!
//! Security posture: configuration inputs are untrusted and carry secrets;
//! secrets are redacted from `Debug` output and never serialized.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env_file;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env_file::EnvFileError;
pub use env_file::load_env_file;
