// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Collapse raw transitions into validity segments.

use super::parser::RawTransition;
use crate::segment::{Bound, Segment};

/// A run of consecutive records sharing abbreviation and offset.
struct Run<'a> {
    /// Oldest record seen so far; supplies the run's DST flag.
    oldest: &'a RawTransition,
    until: Bound,
}

/// Merge records into segments, oldest first.
///
/// Records are walked newest to oldest so each run's `until` is the instant of
/// the record following its newest member. Runs that only differ in their DST
/// flag are one segment.
pub fn collapse(records: &[RawTransition]) -> Vec<Segment> {
    let mut runs: Vec<Run<'_>> = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate().rev() {
        if let Some(run) = runs.last_mut() {
            if run.oldest.abbreviation == record.abbreviation
                && run.oldest.utc_offset_minutes == record.utc_offset_minutes
            {
                run.oldest = record;
                continue;
            }
        }

        let until = records
            .get(i + 1)
            .map_or(Bound::PosInfinity, |next| next.utc_instant);
        runs.push(Run {
            oldest: record,
            until,
        });
    }

    let mut from = Bound::NegInfinity;
    runs.into_iter()
        .rev()
        .map(|run| {
            let segment = Segment {
                abbreviation: run.oldest.abbreviation.clone(),
                offset_minutes: run.oldest.utc_offset_minutes,
                is_dst: run.oldest.is_dst,
                from,
                until: run.until,
            };
            from = run.until;
            segment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(at: i64, abbreviation: &str, offset: i32, is_dst: bool) -> RawTransition {
        RawTransition {
            utc_instant: Bound::At(at),
            abbreviation: abbreviation.to_string(),
            utc_offset_minutes: offset,
            is_dst,
        }
    }

    fn segment(abbreviation: &str, offset: i32, is_dst: bool, from: Bound, until: Bound) -> Segment {
        Segment {
            abbreviation: abbreviation.to_string(),
            offset_minutes: offset,
            is_dst,
            from,
            until,
        }
    }

    #[test]
    fn test_std_dst_std() {
        let (t1, t2, t3) = (1_000, 2_000, 3_000);
        let records = [
            record(t1, "STD", 0, false),
            record(t2, "DST", 60, true),
            record(t3, "STD", 0, false),
        ];
        assert_eq!(
            collapse(&records),
            vec![
                segment("STD", 0, false, Bound::NegInfinity, Bound::At(t2)),
                segment("DST", 60, true, Bound::At(t2), Bound::At(t3)),
                segment("STD", 0, false, Bound::At(t3), Bound::PosInfinity),
            ]
        );
    }

    #[test]
    fn test_paired_dump_lines_merge() {
        // zdump -V prints the second before and the second of every transition
        let records = [
            record(999, "LMT", 296, false),
            record(1_000, "EST", 300, false),
            record(4_999, "EST", 300, false),
            record(5_000, "EDT", 240, true),
            record(8_999, "EDT", 240, true),
            record(9_000, "EST", 300, false),
        ];
        assert_eq!(
            collapse(&records),
            vec![
                segment("LMT", 296, false, Bound::NegInfinity, Bound::At(1_000)),
                segment("EST", 300, false, Bound::At(1_000), Bound::At(5_000)),
                segment("EDT", 240, true, Bound::At(5_000), Bound::At(9_000)),
                segment("EST", 300, false, Bound::At(9_000), Bound::PosInfinity),
            ]
        );
    }

    #[test]
    fn test_dst_flag_only_change_keeps_oldest_flag() {
        let records = [
            record(1_000, "MSK", -180, false),
            record(2_000, "MSK", -180, true),
            record(3_000, "MSD", -240, true),
        ];
        let segments = collapse(&records);
        assert_eq!(segments.len(), 2);
        assert!(!segments[0].is_dst);
        assert_eq!(segments[0].until, Bound::At(3_000));
    }

    #[test]
    fn test_same_abbreviation_different_offset_is_split() {
        let records = [record(1_000, "CET", -60, false), record(2_000, "CET", -120, false)];
        assert_eq!(collapse(&records).len(), 2);
    }

    #[test]
    fn test_eternal_record() {
        let records = [RawTransition {
            utc_instant: Bound::PosInfinity,
            abbreviation: "IST".into(),
            utc_offset_minutes: -330,
            is_dst: false,
        }];
        assert_eq!(
            collapse(&records),
            vec![segment("IST", -330, false, Bound::NegInfinity, Bound::PosInfinity)]
        );
    }

    #[test]
    fn test_empty() {
        assert!(collapse(&[]).is_empty());
    }
}
