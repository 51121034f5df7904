//! Environment validation tests for reqmgr-init-config.
// crates/reqmgr-init-config/tests/env_validation.rs
// =============================================================================
// Module: Environment Validation Tests
// Description: Tests for defaults, missing and invalid settings.
// Purpose: Ensure validation reports every issue in one pass.
// =============================================================================

#![allow(clippy::use_debug, reason = "Debug output is the subject under test.")]

use reqmgr_init_config::BootstrapConfig;
use reqmgr_init_config::ConfigValidationError;
use reqmgr_init_config::LogFormat;
use reqmgr_init_config::LogLevel;
use reqmgr_init_config::Setting;
use reqmgr_init_config::SslMode;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::ErrorKind;
use reqmgr_init_core::MapEnv;
use serde_json::json;

type TestResult = Result<(), String>;

/// Environment with every required variable set to a valid value.
fn complete_env() -> MapEnv {
    MapEnv::new()
        .with("DB_HOST", "localhost")
        .with("DB_USER", "reqmgr")
        .with("DB_PASSWORD", "db-password")
        .with("DB_NAME", "requirements")
        .with("JWT_SECRET", "a-real-signing-secret")
        .with("DEFAULT_ADMIN_PASSWORD", "correct-horse")
}

/// Asserts validation fails and returns the error.
fn expect_invalid(env: &MapEnv) -> Result<ConfigValidationError, String> {
    match BootstrapConfig::from_env(env).validate() {
        Ok(()) => Err("expected invalid config".to_string()),
        Err(error) => Ok(error),
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn complete_environment_validates_with_defaults() -> TestResult {
    let config = BootstrapConfig::from_env(&complete_env());
    config.validate().map_err(|err| err.to_string())?;
    assert_eq!(config.database.port, Setting::Value(5432));
    assert_eq!(config.database.sslmode, Setting::Value(SslMode::Disable));
    assert_eq!(config.logging.level, Setting::Value(LogLevel::Info));
    assert_eq!(config.logging.format, Setting::Value(LogFormat::Json));

    let target = config.database_target().map_err(|err| err.to_string())?;
    assert_eq!(target.port, 5432);
    assert_eq!(target.password.expose(), "db-password");
    Ok(())
}

#[test]
fn explicit_optional_settings_are_parsed() -> TestResult {
    let env = complete_env()
        .with("DB_PORT", "6543")
        .with("DB_SSLMODE", "REQUIRE")
        .with("LOG_LEVEL", "debug")
        .with("LOG_FORMAT", "text");
    let config = BootstrapConfig::from_env(&env);
    config.validate().map_err(|err| err.to_string())?;
    assert_eq!(config.database.port.value(), Some(6543));
    assert_eq!(config.database.sslmode.value(), Some(SslMode::Require));
    assert_eq!(config.logging.effective_level(), LogLevel::Debug);
    assert_eq!(config.logging.effective_format(), LogFormat::Text);
    Ok(())
}

// ============================================================================
// SECTION: Missing Settings
// ============================================================================

#[test]
fn missing_admin_secret_is_reported_by_name() -> TestResult {
    let mut env = complete_env();
    env.remove("DEFAULT_ADMIN_PASSWORD");
    let error = expect_invalid(&env)?;
    assert_eq!(error.missing, vec!["DEFAULT_ADMIN_PASSWORD".to_string()]);
    assert!(error.invalid.is_empty());
    assert!(error.to_string().contains("DEFAULT_ADMIN_PASSWORD"));
    Ok(())
}

#[test]
fn every_missing_variable_is_collected() -> TestResult {
    let error = expect_invalid(&MapEnv::new())?;
    assert_eq!(
        error.missing,
        vec!["DB_HOST", "DB_USER", "DB_PASSWORD", "DB_NAME", "JWT_SECRET", "DEFAULT_ADMIN_PASSWORD"]
    );
    Ok(())
}

#[test]
fn empty_values_count_as_missing() -> TestResult {
    let env = complete_env().with("DB_HOST", "  ").with("DB_PORT", "").with("DB_PASSWORD", "");
    let error = expect_invalid(&env)?;
    assert_eq!(error.missing, vec!["DB_HOST", "DB_PORT", "DB_PASSWORD"]);
    Ok(())
}

// ============================================================================
// SECTION: Invalid Settings
// ============================================================================

#[test]
fn weak_admin_secret_is_invalid() -> TestResult {
    let env = complete_env().with("DEFAULT_ADMIN_PASSWORD", "short");
    let error = expect_invalid(&env)?;
    assert!(error.missing.is_empty());
    assert_eq!(error.invalid.len(), 1);
    assert!(error.invalid[0].contains("must be at least 8 characters long"));
    Ok(())
}

#[test]
fn placeholder_signing_secret_is_invalid() -> TestResult {
    let env = complete_env().with("JWT_SECRET", "your-secret-key");
    let error = expect_invalid(&env)?;
    assert!(error.invalid[0].contains("JWT_SECRET"));
    Ok(())
}

#[test]
fn missing_and_invalid_are_reported_together() -> TestResult {
    let mut env = complete_env()
        .with("DB_PORT", "99999")
        .with("DB_SSLMODE", "verify-full")
        .with("LOG_LEVEL", "loud")
        .with("LOG_FORMAT", "xml")
        .with("JWT_SECRET", "your-secret-key");
    env.remove("DB_NAME");
    let error = expect_invalid(&env)?;
    assert_eq!(error.missing, vec!["DB_NAME"]);
    assert_eq!(error.invalid.len(), 5);
    let message = error.to_string();
    assert!(message.contains("missing required environment variables: DB_NAME"));
    assert!(message.contains("DB_SSLMODE"));
    assert!(message.contains("LOG_FORMAT"));
    Ok(())
}

#[test]
fn zero_port_is_invalid() -> TestResult {
    let error = expect_invalid(&complete_env().with("DB_PORT", "0"))?;
    assert!(error.invalid[0].contains("between 1 and 65535"));
    Ok(())
}

// ============================================================================
// SECTION: Conversion and Redaction
// ============================================================================

#[test]
fn validation_error_becomes_config_kind_record() -> TestResult {
    let mut env = complete_env().with("DEFAULT_ADMIN_PASSWORD", "short");
    env.remove("DB_HOST");
    let error: BootstrapError = expect_invalid(&env)?.into();
    assert_eq!(error.kind(), ErrorKind::Config);
    assert_eq!(error.exit_code(), 1);
    assert_eq!(error.context()["missing"], json!(["DB_HOST"]));
    assert_eq!(error.context()["invalid"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn secrets_never_leak_through_debug_or_serde() -> TestResult {
    let config = BootstrapConfig::from_env(&complete_env());
    let debug = format!("{config:?}");
    assert!(!debug.contains("db-password"));
    assert!(!debug.contains("correct-horse"));
    assert!(!debug.contains("a-real-signing-secret"));

    let value = serde_json::to_value(&config).map_err(|err| err.to_string())?;
    let rendered = value.to_string();
    assert!(!rendered.contains("db-password"));
    assert!(!rendered.contains("correct-horse"));
    assert_eq!(value["database"]["host"], json!("localhost"));
    Ok(())
}
