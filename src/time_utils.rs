// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Compact timestamp suitable for directory and file names.
pub fn format_utc_compact(date: DateTime<Utc>) -> String {
    date.format("%Y%m%d-%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn compact_format_is_filesystem_safe() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(format_utc_compact(ts), "20260314-092653");
        assert_eq!(format_utc_rfc3339(ts), "2026-03-14T09:26:53Z");
    }
}
