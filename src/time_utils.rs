// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
///
/// Fixed-width output, so stored timestamps compare correctly as strings.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Current time, bumped to one millisecond past `earlier` if the clock has
/// not moved beyond it yet. An unparseable `earlier` yields plain now.
pub fn stamp_after(earlier: &str) -> String {
    let now = Utc::now();
    let floor = DateTime::parse_from_rfc3339(earlier)
        .map(|t| t.with_timezone(&Utc) + Duration::milliseconds(1))
        .unwrap_or(now);
    format_utc_rfc3339(now.max(floor))
}
