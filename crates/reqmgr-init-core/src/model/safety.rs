// crates/reqmgr-init-core/src/model/safety.rs
// ============================================================================
// Module: Safety Model
// Description: Tracked tables, row counts, and the empty-database report.
// Purpose: Decide whether a database is safe to initialize.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The safety check counts rows in a fixed set of application tables. A table
//! that does not exist counts as empty. Any non-zero count makes the database
//! unsafe, and the rendered report names every offending table.

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;

/// SQLSTATE reported by PostgreSQL for an undefined table.
pub const UNDEFINED_TABLE_SQLSTATE: &str = "42P01";

/// Message fragments that identify a missing table across drivers.
const MISSING_TABLE_FRAGMENTS: [&str; 3] = ["does not exist", "no such table", "undefined_table"];

// ============================================================================
// SECTION: Tracked Tables
// ============================================================================

/// Application tables inspected by the safety check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedTable {
    /// Identities.
    Users,
    /// Epics.
    Epics,
    /// User stories.
    UserStories,
    /// Requirements.
    Requirements,
    /// Acceptance criteria.
    AcceptanceCriteria,
    /// Comments.
    Comments,
}

impl TrackedTable {
    /// Tracked tables in inspection order.
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::Epics,
        Self::UserStories,
        Self::Requirements,
        Self::AcceptanceCriteria,
        Self::Comments,
    ];

    /// Returns the SQL table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Epics => "epics",
            Self::UserStories => "user_stories",
            Self::Requirements => "requirements",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::Comments => "comments",
        }
    }
}

impl fmt::Display for TrackedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Result of counting rows in one tracked table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCount {
    /// The table exists and holds this many rows.
    Rows(u64),
    /// The table does not exist.
    Missing,
}

impl TableCount {
    /// Returns the row count, treating a missing table as empty.
    #[must_use]
    pub const fn rows(self) -> u64 {
        match self {
            Self::Rows(rows) => rows,
            Self::Missing => 0,
        }
    }
}

/// Row count of one tracked table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRowCount {
    /// Table inspected.
    pub table: TrackedTable,
    /// Rows found; zero for missing tables.
    pub rows: u64,
    /// True when the table does not exist.
    pub missing: bool,
}

// ============================================================================
// SECTION: Data Summary
// ============================================================================

/// Row counts of every tracked table.
///
/// # Invariants
/// - `counts` follows [`TrackedTable::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSummary {
    /// Per-table counts in inspection order.
    pub counts: Vec<TableRowCount>,
}

impl DataSummary {
    /// Builds a summary from per-table counts.
    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = (TrackedTable, TableCount)>) -> Self {
        let counts = counts
            .into_iter()
            .map(|(table, count)| TableRowCount {
                table,
                rows: count.rows(),
                missing: matches!(count, TableCount::Missing),
            })
            .collect();
        Self { counts }
    }

    /// Returns true when every tracked table is empty or missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|count| count.rows == 0)
    }

    /// Returns the names of tables holding rows, in inspection order.
    #[must_use]
    pub fn non_empty_tables(&self) -> Vec<&'static str> {
        self.counts
            .iter()
            .filter(|count| count.rows > 0)
            .map(|count| count.table.table_name())
            .collect()
    }

    /// Returns the names of tables that do not exist.
    #[must_use]
    pub fn missing_tables(&self) -> Vec<&'static str> {
        self.counts.iter().filter(|count| count.missing).map(|count| count.table.table_name()).collect()
    }

    /// Returns the total number of rows across tracked tables.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.counts.iter().fold(0_u64, |total, count| total.saturating_add(count.rows))
    }

    /// Renders the operator-facing safety report.
    #[must_use]
    pub fn render_report(&self) -> String {
        if self.is_empty() {
            return "Database is empty and safe for initialization.".to_string();
        }
        let mut report = String::from("Database contains existing data:\n");
        for count in self.counts.iter().filter(|count| count.rows > 0) {
            let _ = writeln!(report, "  - {}: {} records", count.table, count.rows);
        }
        report.push_str(
            "Initialization cannot proceed on a non-empty database to prevent data corruption.",
        );
        report
    }
}

/// Returns true when a driver error describes a missing table.
///
/// A matching SQLSTATE wins; message fragments are checked case-insensitively
/// for drivers that do not expose one.
#[must_use]
pub fn is_missing_table_error(sqlstate: Option<&str>, message: &str) -> bool {
    if sqlstate == Some(UNDEFINED_TABLE_SQLSTATE) {
        return true;
    }
    let lowered = message.to_lowercase();
    MISSING_TABLE_FRAGMENTS.iter().any(|fragment| lowered.contains(fragment))
}
