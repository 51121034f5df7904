// crates/reqmgr-init-cli/src/lib.rs
// ============================================================================
// Module: Bootstrap Initializer CLI Library
// Description: Orchestrator, operator reporting, logging, and message catalog.
// Purpose: Drive the initialization stages and report their outcome.
// Dependencies: reqmgr-init-core, reqmgr-init-config, reqmgr-init-store-postgres,
//               tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `reqmgr-init` binary is a thin shell around this library:
//! [`orchestrator`] runs the stages in order and records a step summary for
//! each, [`report`] renders the operator-facing output, [`logging`] installs
//! the structured log subscriber, and [`i18n`] holds every user-facing
//! string.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
pub mod logging;
pub mod orchestrator;
pub mod report;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use logging::LoggingError;
pub use logging::init_logging;
pub use orchestrator::Connector;
pub use orchestrator::RunFailure;
pub use orchestrator::StepDetails;
pub use orchestrator::run_dry;
pub use orchestrator::run_full;
