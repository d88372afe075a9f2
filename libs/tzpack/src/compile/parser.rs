// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Parser for `zdump` transition listings.
//!
//! Verbose listings (`zdump -V`) carry one transition per line:
//!
//! ```text
//! America/New_York  Sun Nov 18 16:59:59 1883 UT = Sun Nov 18 12:03:57 1883 LMT isdst=0 gmtoff=-17762
//! ```
//!
//! Zones without any transition produce an empty verbose listing and are
//! dumped a second time as `zdump UTC <zone>`, which prints the current
//! instant once in UTC and once in the zone:
//!
//! ```text
//! UTC  Mon Jan  1 00:00:00 2024 UTC
//! Asia/Kolkata  Mon Jan  1 05:30:00 2024 IST
//! ```

use chrono::NaiveDateTime;

use crate::error::CompileError;
use crate::segment::{Bound, MINUTE_MS};

/// Lines containing these mark the edge of representable time in 32-bit dumps.
const OVERFLOW_MARKERS: [&str; 3] = ["failed", "-2147481748", "2147485547"];

/// Weekday, 4 date/time tokens, `UT`, `=`, weekday, 4 date/time tokens, abbreviation, isdst.
const VERBOSE_MIN_TOKENS: usize = 14;

/// Weekday, 4 date/time tokens, abbreviation.
const FALLBACK_MIN_TOKENS: usize = 6;

const DATE_FORMAT: &str = "%b %d %H:%M:%S %Y";

/// One transition as reported by the dump tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransition {
    /// Instant the transition takes effect; `PosInfinity` for a zone that never changes.
    pub utc_instant: Bound,
    pub abbreviation: String,
    /// `(utc - local)` in minutes.
    pub utc_offset_minutes: i32,
    pub is_dst: bool,
}

/// Parse one zone's listing into records, oldest first.
///
/// Parsing stops silently at the first overflow sentinel or malformed line.
/// An empty result is an error: every real zone has at least one record.
pub fn parse_listing(zone: &str, text: &str) -> Result<Vec<RawTransition>, CompileError> {
    let mut records = Vec::new();

    for line in text.lines() {
        match parse_verbose_line(line) {
            Some(record) => records.push(record),
            None => break,
        }
    }

    if records.is_empty() {
        if let Some(record) = parse_fallback(text) {
            records.push(record);
        }
    }

    if records.is_empty() {
        return Err(CompileError::EmptyListing {
            zone: zone.to_string(),
        });
    }

    Ok(records)
}

fn parse_verbose_line(line: &str) -> Option<RawTransition> {
    if OVERFLOW_MARKERS.iter().any(|marker| line.contains(marker)) {
        return None;
    }

    let parts: Vec<&str> = strip_zone_name(line).split_whitespace().collect();
    if parts.len() < VERBOSE_MIN_TOKENS {
        return None;
    }

    let utc = parse_instant(&parts[1..5])?;
    let local = parse_instant(&parts[8..12])?;
    let is_dst = match parts[13].strip_prefix("isdst=")? {
        "0" => false,
        "1" => true,
        _ => return None,
    };

    Some(RawTransition {
        utc_instant: Bound::At(utc),
        abbreviation: parts[12].to_string(),
        utc_offset_minutes: offset_minutes(utc, local)?,
        is_dst,
    })
}

/// Synthesize the single eternal record of a zone that never changes.
///
/// The dump must be exactly two newline-terminated lines.
fn parse_fallback(text: &str) -> Option<RawTransition> {
    let lines: Vec<&str> = text.split('\n').collect();
    let [utc_line, local_line, ""] = lines[..] else {
        return None;
    };

    let utc_parts: Vec<&str> = strip_zone_name(utc_line).split_whitespace().collect();
    let local_parts: Vec<&str> = strip_zone_name(local_line).split_whitespace().collect();
    if utc_parts.len() < FALLBACK_MIN_TOKENS || local_parts.len() < FALLBACK_MIN_TOKENS {
        return None;
    }

    let utc = parse_instant(&utc_parts[1..5])?;
    let local = parse_instant(&local_parts[1..5])?;

    Some(RawTransition {
        utc_instant: Bound::PosInfinity,
        abbreviation: local_parts[5].to_string(),
        utc_offset_minutes: offset_minutes(utc, local)?,
        is_dst: false,
    })
}

/// Drop the `<zone>  ` prefix `zdump` prints before every line.
fn strip_zone_name(line: &str) -> &str {
    match line.find("  ") {
        Some(idx) => &line[idx + 2..],
        None => line,
    }
}

/// Parse `Mon DD HH:MM:SS YYYY` tokens into epoch milliseconds.
fn parse_instant(tokens: &[&str]) -> Option<i64> {
    let text = tokens.join(" ");
    NaiveDateTime::parse_from_str(&text, DATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Integer division truncates toward zero, dropping the seconds of LMT offsets.
fn offset_minutes(utc: i64, local: i64) -> Option<i32> {
    i32::try_from((utc - local) / MINUTE_MS).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: &str = "\
America/New_York  Sun Nov 18 16:59:59 1883 UT = Sun Nov 18 12:03:57 1883 LMT isdst=0 gmtoff=-17762
America/New_York  Sun Nov 18 17:00:00 1883 UT = Sun Nov 18 12:00:00 1883 EST isdst=0 gmtoff=-18000
America/New_York  Sun Mar 31 06:59:59 1918 UT = Sun Mar 31 01:59:59 1918 EST isdst=0 gmtoff=-18000
America/New_York  Sun Mar 31 07:00:00 1918 UT = Sun Mar 31 03:00:00 1918 EDT isdst=1 gmtoff=-14400
";

    #[test]
    fn test_parse_verbose_listing() {
        let records = parse_listing("America/New_York", NEW_YORK).unwrap();
        assert_eq!(records.len(), 4);

        // 1883-11-18 17:00:00 UTC
        assert_eq!(records[1].utc_instant, Bound::At(-2_717_650_800_000));
        assert_eq!(records[1].abbreviation, "EST");
        assert_eq!(records[1].utc_offset_minutes, 300);
        assert!(!records[1].is_dst);

        assert_eq!(records[3].abbreviation, "EDT");
        assert_eq!(records[3].utc_offset_minutes, 240);
        assert!(records[3].is_dst);
    }

    #[test]
    fn test_lmt_offset_truncates_toward_zero() {
        let records = parse_listing("America/New_York", NEW_YORK).unwrap();
        // 4:56:02 behind UTC
        assert_eq!(records[0].abbreviation, "LMT");
        assert_eq!(records[0].utc_offset_minutes, 296);
    }

    #[test]
    fn test_single_digit_day_with_double_space() {
        let text = "Europe/London  Sun Oct  1 01:59:59 2023 UT = Sun Oct  1 02:59:59 2023 BST isdst=1 gmtoff=3600\n";
        let records = parse_listing("Europe/London", text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].utc_offset_minutes, -60);
        assert!(records[0].is_dst);
    }

    #[test]
    fn test_stops_at_overflow_sentinel() {
        let text = format!(
            "{NEW_YORK}America/New_York  Tue Jan 19 03:14:07 2147485547 UT = Mon Jan 18 22:14:07 2147485547 EST isdst=0 gmtoff=-18000\n\
             America/New_York  Sun Nov  4 06:00:00 2040 UT = Sun Nov  4 01:00:00 2040 EST isdst=0 gmtoff=-18000\n"
        );
        let records = parse_listing("America/New_York", &text).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_stops_at_short_line() {
        let text = format!("{NEW_YORK}America/New_York  garbage\n{NEW_YORK}");
        let records = parse_listing("America/New_York", &text).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_fallback_fixed_offset() {
        let text = "UTC  Mon Jan  1 00:00:00 2024 UTC\n\
                    Asia/Kolkata  Mon Jan  1 05:30:00 2024 IST\n";
        let records = parse_listing("Asia/Kolkata", text).unwrap();
        assert_eq!(
            records,
            vec![RawTransition {
                utc_instant: Bound::PosInfinity,
                abbreviation: "IST".into(),
                utc_offset_minutes: -330,
                is_dst: false,
            }]
        );
    }

    #[test]
    fn test_fallback_requires_exactly_two_lines() {
        let text = "UTC  Mon Jan  1 00:00:00 2024 UTC\n\
                    A  Mon Jan  1 05:30:00 2024 IST\n\
                    B  Mon Jan  1 05:30:00 2024 IST\n";
        assert!(matches!(
            parse_listing("A", text),
            Err(CompileError::EmptyListing { .. })
        ));

        let unterminated = "UTC  Mon Jan  1 00:00:00 2024 UTC\n\
                            A  Mon Jan  1 05:30:00 2024 IST";
        let trailing_blank = "UTC  Mon Jan  1 00:00:00 2024 UTC\n\
                              A  Mon Jan  1 05:30:00 2024 IST\n\n";
        for text in [unterminated, trailing_blank] {
            assert!(matches!(
                parse_listing("A", text),
                Err(CompileError::EmptyListing { .. })
            ));
        }
    }

    #[test]
    fn test_empty_listing_is_an_error() {
        assert!(matches!(
            parse_listing("Nowhere", ""),
            Err(CompileError::EmptyListing { zone }) if zone == "Nowhere"
        ));
    }
}
