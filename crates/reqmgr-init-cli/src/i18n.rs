// crates/reqmgr-init-cli/src/i18n.rs
// ============================================================================
// Module: Operator Message Catalog
// Description: Message catalog and placeholder substitution for CLI output.
// Purpose: Keep every operator-facing string in one reviewed table.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! Operator output (the run summary, failure lines, remediation checklists,
//! and next steps) is looked up by key in [`CATALOG_EN`] and formatted with
//! the [`t!`](crate::t) macro. Log records are not routed through the
//! catalog; their `msg` values are stable machine-readable event names.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholder substitutions apply in argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `step`).
/// - `value` is preformatted and safe for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"step"`).
    pub key: &'static str,
    /// The formatted string value substituted for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self { key, value: value.into() }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English message catalog.
pub(crate) static CATALOG_EN: &[(&str, &str)] = &[
    ("summary.header.full", "Initialization completed successfully."),
    ("summary.header.dry_run", "Dry run completed successfully; no database changes were made."),
    ("summary.correlation", "Correlation ID: {correlation_id}"),
    ("summary.database", "Database: {host}/{database}"),
    ("summary.duration", "Total duration: {duration_ms} ms"),
    ("summary.migrations", "Migrations applied: {count}"),
    ("summary.schema_version", "Schema version: {version}"),
    ("summary.schema_version.none", "Schema version: none"),
    ("summary.admin.created", "Administrator created: {username} <{email}>"),
    ("summary.admin.skipped", "Administrator created: no"),
    ("summary.steps", "Steps:"),
    ("summary.step", "  - {step}: {status} ({duration_ms} ms)"),
    ("summary.next_steps", "Next steps:"),
    ("summary.next_step", "  {index}. {text}"),
    ("next_steps.start_server", "Start the requirements management server."),
    ("next_steps.login", "Log in as '{username}' with the password supplied in {env}."),
    ("next_steps.create_users", "Create additional users from the administration interface."),
    ("next_steps.dry_run", "Run again without --dry-run to initialize the database."),
    ("failure.line", "error [{kind}] {message}"),
    ("failure.cause", "  caused by: {cause}"),
    ("failure.correlation", "Correlation ID: {correlation_id}"),
    ("failure.step", "Failed step: {step}"),
    ("failure.remediation.header", "Remediation checklist:"),
    ("failure.remediation.item", "  [ ] {text}"),
    (
        "remediation.config.variables",
        "Set every environment variable reported as missing, or pass --env-file.",
    ),
    (
        "remediation.config.dry_run",
        "Re-run with --dry-run to validate the configuration without touching the database.",
    ),
    (
        "remediation.config.admin_password",
        "Give DEFAULT_ADMIN_PASSWORD at least 8 characters.",
    ),
    (
        "remediation.config.jwt_secret",
        "Replace the placeholder JWT_SECRET with a generated secret.",
    ),
    (
        "remediation.database.reachable",
        "Confirm PostgreSQL is running and reachable at DB_HOST:DB_PORT.",
    ),
    ("remediation.database.credentials", "Check DB_USER and DB_PASSWORD."),
    ("remediation.database.name", "Confirm the database named by DB_NAME exists."),
    ("remediation.database.sslmode", "Check that DB_SSLMODE matches the server's TLS setup."),
    (
        "remediation.migration.dirty",
        "Inspect schema_migrations; a dirty row marks a migration that did not finish.",
    ),
    (
        "remediation.migration.repair",
        "Repair the schema by hand, then record a clean version before re-running.",
    ),
    (
        "remediation.migration.files",
        "Check the migrations directory for misnamed or missing files.",
    ),
    (
        "remediation.creation.secret",
        "Confirm DEFAULT_ADMIN_PASSWORD is set and at least 8 characters long.",
    ),
    (
        "remediation.creation.existing",
        "Check the users table for an existing 'admin' account.",
    ),
    (
        "failure.safety.notice",
        "Operator notice: the initializer only runs against an empty database. Point it at a \
         freshly provisioned database; existing data is never modified.",
    ),
    (
        "failure.system.hint",
        "Re-run with --verbose and review the log output for details.",
    ),
    ("cli.args.invalid", "invalid command line arguments: {error}"),
    ("output.write_failed", "failed to write to {stream}: {error}"),
    ("system.panic", "unexpected internal failure: {detail}"),
];

/// Returns the catalog as a lookup table.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect())
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Resolves `key` and substitutes `{placeholder}` arguments.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
