// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp rounding and duration formatting for status output.

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Marker rendered for durations whose endpoints are not yet set.
pub const UNSET_TIME: &str = "--:--:--";

/// Round a timestamp to whole seconds, half up.
///
/// Falls back to truncation in the (unreachable for second granularity)
/// rounding-error case.
pub fn round_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_round(Duration::seconds(1))
        .unwrap_or_else(|_| t - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos())))
}

/// Format a duration as `H:MM:SS`.
///
/// Negative durations clamp to zero.
pub fn format_hms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
