//! Publish-date canonicalization.
//!
//! Upstream publish dates are free text ("Nov 21, 2002", "February 2001",
//! "1980"). [`to_iso_date`] turns them into `YYYY-MM-DD`, trying a fixed list
//! of patterns in order. Patterns without a day or month are completed with
//! `1`. Strings matching nothing map to [`FALLBACK_DATE`].

use chrono::NaiveDate;

/// Returned when no pattern matches.
pub const FALLBACK_DATE: &str = "2023-01-01";

/// A recognized layout plus the suffix that completes it into a full date.
struct DatePattern {
    format: &'static str,
    fill_input: &'static str,
    fill_format: &'static str,
}

const fn full(format: &'static str) -> DatePattern {
    DatePattern {
        format,
        fill_input: "",
        fill_format: "",
    }
}

const fn without_day(format: &'static str) -> DatePattern {
    DatePattern {
        format,
        fill_input: " 1",
        fill_format: " %d",
    }
}

const PATTERNS: [DatePattern; 8] = [
    full("%b %d, %Y"),    // Nov 21, 2002
    without_day("%B %Y"), // February 2001
    DatePattern {
        format: "%Y", // 2021
        fill_input: " 1 1",
        fill_format: " %m %d",
    },
    full("%Y-%m-%d"),     // 1980-01-01
    full("%d %B %Y"),     // 5 March 1999
    full("%Y/%m/%d"),     // 1977/05/20
    without_day("%Y %B"), // 2001 August
    full("%B %d, %Y"),    // January 5, 1998
];

/// Convert a free-form date into `YYYY-MM-DD`.
///
/// Never fails: unparsable input yields [`FALLBACK_DATE`].
pub fn to_iso_date(raw: &str) -> String {
    parse_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| FALLBACK_DATE.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !has_four_digit_year(raw) {
        return None;
    }

    PATTERNS.iter().find_map(|pattern| {
        let input = format!("{}{}", raw, pattern.fill_input);
        let format = format!("{}{}", pattern.format, pattern.fill_format);
        NaiveDate::parse_from_str(&input, &format).ok()
    })
}

// chrono's %Y accepts 1-4 digits; every pattern here expects a full year.
fn has_four_digit_year(raw: &str) -> bool {
    raw.as_bytes()
        .windows(4)
        .any(|w| w.iter().all(u8::is_ascii_digit))
}
