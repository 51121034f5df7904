// crates/reqmgr-init-core/src/lib.rs
// ============================================================================
// Module: Bootstrap Core Library
// Description: Public API surface for the bootstrap initializer core.
// Purpose: Expose the error taxonomy, run records, and component interfaces.
// Dependencies: crate::{model, interfaces}
// ============================================================================

//! ## Overview
//! The bootstrap core holds everything the initializer stages share without
//! knowing which database backs them: the closed error taxonomy and its exit
//! codes, the correlation context carried through a run, step and run
//! summaries, the safety-check data model, and the interfaces that concrete
//! stores implement. Backend crates plug in through [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod model;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::*;

pub use interfaces::AdminProvisioner;
pub use interfaces::BoundComponents;
pub use interfaces::EnvSource;
pub use interfaces::HEALTH_PING_TIMEOUT;
pub use interfaces::HashError;
pub use interfaces::HealthProbe;
pub use interfaces::LayeredEnv;
pub use interfaces::MapEnv;
pub use interfaces::MigrationSource;
pub use interfaces::MigrationSourceError;
pub use interfaces::PasswordHasher;
pub use interfaces::PoolState;
pub use interfaces::ProcessEnv;
pub use interfaces::SafetyCheck;
pub use interfaces::SchemaMigrator;
