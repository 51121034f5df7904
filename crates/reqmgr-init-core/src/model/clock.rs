// crates/reqmgr-init-core/src/model/clock.rs
// ============================================================================
// Module: Bootstrap Clock Helpers
// Description: Wall-clock and elapsed-time helpers for run records.
// Purpose: Keep timestamp and duration conversions in one place.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Run records carry UTC wall-clock timestamps (serialized as RFC 3339) and
//! elapsed durations in whole milliseconds. Elapsed time is always measured
//! with [`std::time::Instant`]; wall-clock values are for reporting only.

use std::time::Duration;

use time::OffsetDateTime;

/// Returns the current UTC wall-clock time.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
