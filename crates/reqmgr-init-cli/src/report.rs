// crates/reqmgr-init-cli/src/report.rs
// ============================================================================
// Module: Operator Report
// Description: Renders the run summary and failure guidance for operators.
// Purpose: Give a human reader the outcome without parsing log records.
// Dependencies: reqmgr-init-core
// ============================================================================

//! ## Overview
//! A successful run prints the summary on stdout. A failed run prints one
//! `error [<kind>] <message>` line on stderr and one `caused by:` line per
//! underlying driver error, followed by a remediation checklist when the
//! kind is recoverable or an operator notice when the database already
//! holds data.

use reqmgr_init_core::ADMIN_EMAIL;
use reqmgr_init_core::ADMIN_USERNAME;
use reqmgr_init_core::BootstrapError;
use reqmgr_init_core::ErrorKind;
use reqmgr_init_core::InitializationSummary;
use reqmgr_init_core::RunMode;

use crate::orchestrator::next_steps;
use crate::t;

/// Renders the operator summary of a successful run.
#[must_use]
pub fn render_summary(summary: &InitializationSummary) -> String {
    let mut lines = vec![
        match summary.mode {
            RunMode::Full => t!("summary.header.full"),
            RunMode::DryRun => t!("summary.header.dry_run"),
        },
        t!("summary.correlation", correlation_id = summary.correlation_id),
        t!("summary.database", host = summary.database_host, database = summary.database_name),
        t!("summary.duration", duration_ms = summary.total_duration_ms),
    ];
    if summary.mode == RunMode::Full {
        lines.push(t!("summary.migrations", count = summary.migrations_applied));
        lines.push(match summary.schema_version {
            Some(version) => t!("summary.schema_version", version = version),
            None => t!("summary.schema_version.none"),
        });
    }
    lines.push(if summary.admin_created {
        t!("summary.admin.created", username = ADMIN_USERNAME, email = ADMIN_EMAIL)
    } else {
        t!("summary.admin.skipped")
    });

    lines.push(t!("summary.steps"));
    for step in &summary.steps {
        lines.push(t!(
            "summary.step",
            step = step.step,
            status = step.status,
            duration_ms = step.duration_ms
        ));
    }

    lines.push(t!("summary.next_steps"));
    for (index, text) in next_steps(summary.mode).into_iter().enumerate() {
        lines.push(t!("summary.next_step", index = index + 1, text = text));
    }
    lines.join("\n")
}

/// Returns the remediation checklist for a recoverable kind.
#[must_use]
pub fn remediation(kind: ErrorKind) -> Vec<String> {
    match kind {
        ErrorKind::Config => vec![
            t!("remediation.config.variables"),
            t!("remediation.config.admin_password"),
            t!("remediation.config.jwt_secret"),
            t!("remediation.config.dry_run"),
        ],
        ErrorKind::Database => vec![
            t!("remediation.database.reachable"),
            t!("remediation.database.credentials"),
            t!("remediation.database.name"),
            t!("remediation.database.sslmode"),
        ],
        ErrorKind::Migration => vec![
            t!("remediation.migration.dirty"),
            t!("remediation.migration.repair"),
            t!("remediation.migration.files"),
        ],
        ErrorKind::Creation => {
            vec![t!("remediation.creation.secret"), t!("remediation.creation.existing")]
        }
        ErrorKind::Safety | ErrorKind::System => Vec::new(),
    }
}

/// Renders the operator-facing lines for a failed run.
#[must_use]
pub fn render_failure(error: &BootstrapError) -> String {
    let mut lines =
        vec![t!("failure.line", kind = error.kind().as_str(), message = error.message())];
    lines.extend(error.cause_chain().into_iter().map(|cause| t!("failure.cause", cause = cause)));
    if let Some(correlation_id) = error.correlation_id() {
        lines.push(t!("failure.correlation", correlation_id = correlation_id));
    }
    if let Some(step) = error.step() {
        lines.push(t!("failure.step", step = step));
    }

    match error.kind() {
        ErrorKind::Safety => lines.push(t!("failure.safety.notice")),
        ErrorKind::System => lines.push(t!("failure.system.hint")),
        kind => {
            lines.push(t!("failure.remediation.header"));
            lines.extend(
                remediation(kind)
                    .into_iter()
                    .map(|text| t!("failure.remediation.item", text = text)),
            );
        }
    }
    lines.join("\n")
}
