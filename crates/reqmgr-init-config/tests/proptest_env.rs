// crates/reqmgr-init-config/tests/proptest_env.rs
// ============================================================================
// Module: Environment Property-Based Tests
// Description: Property tests for one-pass validation.
// Purpose: Ensure any subset of absent variables is reported exactly.
// ============================================================================

//! Property-based tests for configuration validation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_config::REQUIRED_VARIABLES;
use reqmgr_init_core::MapEnv;

fn env_without(absent: &[bool]) -> MapEnv {
    let mut env = MapEnv::new();
    for (key, skip) in REQUIRED_VARIABLES.iter().zip(absent) {
        if !skip {
            env.insert(*key, "valid-value-123");
        }
    }
    env
}

proptest! {
    #[test]
    fn missing_list_matches_absent_variables(absent in prop::collection::vec(any::<bool>(), 6)) {
        let result = BootstrapConfig::from_env(&env_without(&absent)).validate();
        let expected: Vec<String> = REQUIRED_VARIABLES
            .iter()
            .zip(&absent)
            .filter(|(_, skip)| **skip)
            .map(|(key, _)| (*key).to_string())
            .collect();
        match result {
            Ok(()) => prop_assert!(expected.is_empty()),
            Err(error) => {
                prop_assert_eq!(error.missing, expected);
                prop_assert!(error.invalid.is_empty());
            }
        }
    }

    #[test]
    fn admin_secret_length_threshold_is_eight(secret in "[a-z]{1,16}") {
        let mut env = env_without(&[false; 6]);
        env.insert("DEFAULT_ADMIN_PASSWORD", secret.clone());
        let result = BootstrapConfig::from_env(&env).validate();
        prop_assert_eq!(result.is_ok(), secret.len() >= 8);
    }
}
