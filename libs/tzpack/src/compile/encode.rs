// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Dictionary encoding of a zone's segment list.
//!
//! Abbreviations, offsets and duration buckets are each replaced by an index
//! into a small first-seen dictionary, and the three indices plus the DST bit
//! are packed into one [`Code`] per segment.
//!
//! Duration buckets are whole hours. Every boundary is floored to the hour
//! before differencing, so decoding accumulates exactly the floored
//! boundaries and never drifts.

use crate::code::{Code, MAX_ABBREVIATIONS, MAX_DURATIONS, MAX_OFFSETS};
use crate::error::{CompileError, DictionaryKind};
use crate::segment::{Bound, Segment, HOUR_MS};
use crate::store::DataZone;

/// Ordered, duplicate-free values in first-seen order.
struct Dictionary<T> {
    values: Vec<T>,
    kind: DictionaryKind,
    capacity: usize,
}

impl<T: PartialEq> Dictionary<T> {
    fn new(kind: DictionaryKind, capacity: usize) -> Self {
        Self {
            values: Vec::new(),
            kind,
            capacity,
        }
    }

    /// Index of `value`, appending it if unseen.
    fn intern(&mut self, zone: &str, value: T) -> Result<usize, CompileError> {
        if let Some(idx) = self.values.iter().position(|v| *v == value) {
            return Ok(idx);
        }
        if self.values.len() == self.capacity {
            return Err(CompileError::DictionaryOverflow {
                zone: zone.to_string(),
                kind: self.kind,
                capacity: self.capacity,
            });
        }
        self.values.push(value);
        Ok(self.values.len() - 1)
    }
}

/// Encode `segments` into a data zone record named `zone`.
///
/// Segments must partition time: every boundary but the last is finite and
/// boundaries never decrease.
pub fn encode(zone: &str, segments: &[Segment]) -> Result<DataZone, CompileError> {
    validate(zone, segments)?;

    let mut abbrs = Dictionary::new(DictionaryKind::Abbreviations, MAX_ABBREVIATIONS);
    let mut offsets = Dictionary::new(DictionaryKind::Offsets, MAX_OFFSETS);
    let mut durations = Dictionary::new(DictionaryKind::Durations, MAX_DURATIONS);

    let mut data = Vec::with_capacity(segments.len());
    let mut previous_hours: Option<i64> = None;

    for segment in segments {
        let hours = segment.until.millis().map(|ms| ms.div_euclid(HOUR_MS));
        let bucket = match (previous_hours, hours) {
            (Some(previous), Some(hours)) => Some((hours - previous).abs()),
            (_, hours) => hours,
        };
        previous_hours = hours;

        let code = Code {
            abbr_index: abbrs.intern(zone, segment.abbreviation.as_str())?,
            offset_index: offsets.intern(zone, segment.offset_minutes)?,
            is_dst: segment.is_dst,
            duration_index: durations.intern(zone, bucket)?,
        };
        data.push(code.pack());
    }

    Ok(DataZone {
        name: zone.to_string(),
        abbrs: abbrs.values.into_iter().map(str::to_string).collect(),
        offsets: offsets.values,
        untils: durations.values,
        data,
    })
}

fn validate(zone: &str, segments: &[Segment]) -> Result<(), CompileError> {
    let invalid = |reason: &'static str| CompileError::InvalidSegments {
        zone: zone.to_string(),
        reason,
    };

    let Some((last, interior)) = segments.split_last() else {
        return Err(CompileError::EmptyListing {
            zone: zone.to_string(),
        });
    };

    if segments[0].from != Bound::NegInfinity {
        return Err(invalid("first segment is bounded below"));
    }
    if interior.iter().any(|segment| !segment.until.is_finite()) {
        return Err(invalid("interior boundary is unbounded"));
    }
    if last.until != Bound::PosInfinity {
        return Err(invalid("last boundary is bounded"));
    }
    if segments.windows(2).any(|pair| pair[0].until != pair[1].from) {
        return Err(invalid("segments are not contiguous"));
    }
    if segments.windows(2).any(|pair| pair[0].until > pair[1].until) {
        return Err(invalid("boundaries decrease"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(abbreviation: &str, offset: i32, is_dst: bool, from: Bound, until: Bound) -> Segment {
        Segment {
            abbreviation: abbreviation.to_string(),
            offset_minutes: offset,
            is_dst,
            from,
            until,
        }
    }

    /// Back-to-back segments alternating between two rules; gap `i` lasts `step_hours(i)`.
    fn alternating(count: usize, step_hours: impl Fn(usize) -> i64) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(count);
        let mut from = Bound::NegInfinity;
        let mut at = 0;
        for i in 0..count {
            let until = if i + 1 == count {
                Bound::PosInfinity
            } else {
                at += step_hours(i) * HOUR_MS;
                Bound::At(at)
            };
            let (abbr, offset) = if i % 2 == 0 { ("A", 0) } else { ("B", -60) };
            segments.push(segment(abbr, offset, i % 2 == 1, from, until));
            from = until;
        }
        segments
    }

    #[test]
    fn test_dictionaries_are_first_seen_and_unique() {
        let h = HOUR_MS;
        let segments = [
            segment("STD", 0, false, Bound::NegInfinity, Bound::At(10 * h)),
            segment("DST", -60, true, Bound::At(10 * h), Bound::At(20 * h)),
            segment("STD", 0, false, Bound::At(20 * h), Bound::At(30 * h)),
            segment("DST", -60, true, Bound::At(30 * h), Bound::PosInfinity),
        ];
        let zone = encode("Test/Zone", &segments).unwrap();
        assert_eq!(zone.abbrs, ["STD", "DST"]);
        assert_eq!(zone.offsets, [0, -60]);
        assert_eq!(zone.untils, [Some(10), None]);
        assert_eq!(
            zone.data,
            [
                0,
                (1 << 15) | (1 << 10) | (1 << 9),
                0,
                (1 << 15) | (1 << 10) | (1 << 9) | 1,
            ]
        );
    }

    #[test]
    fn test_first_bucket_is_hours_since_epoch() {
        let segments = [
            segment("LMT", 296, false, Bound::NegInfinity, Bound::At(-5 * HOUR_MS)),
            segment("EST", 300, false, Bound::At(-5 * HOUR_MS), Bound::PosInfinity),
        ];
        let zone = encode("Test/Zone", &segments).unwrap();
        assert_eq!(zone.untils, [Some(-5), None]);
    }

    #[test]
    fn test_boundaries_floor_to_the_hour() {
        let segments = [
            segment("LMT", 9, false, Bound::NegInfinity, Bound::At(-HOUR_MS / 2)),
            segment("WET", 0, false, Bound::At(-HOUR_MS / 2), Bound::At(HOUR_MS + 1)),
            segment("CET", -60, false, Bound::At(HOUR_MS + 1), Bound::PosInfinity),
        ];
        let zone = encode("Test/Zone", &segments).unwrap();
        // -0.5h floors to -1h, 1h+1ms floors to 1h
        assert_eq!(zone.untils, [Some(-1), Some(2), None]);
    }

    #[test]
    fn test_offset_overflow_fails() {
        let mut segments = Vec::new();
        let mut from = Bound::NegInfinity;
        for i in 0..=MAX_OFFSETS as i64 {
            let until = if i == MAX_OFFSETS as i64 {
                Bound::PosInfinity
            } else {
                Bound::At((i + 1) * HOUR_MS)
            };
            segments.push(segment("X", i as i32, false, from, until));
            from = until;
        }
        let err = encode("Too/Many", &segments).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DictionaryOverflow {
                kind: DictionaryKind::Offsets,
                capacity: 32,
                ..
            }
        ));
    }

    #[test]
    fn test_duration_overflow_fails() {
        // every gap distinct: 513 buckets including the first and the unbounded one
        let segments = alternating(MAX_DURATIONS + 1, |i| i as i64 + 1);
        let err = encode("Too/Long", &segments).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DictionaryOverflow {
                kind: DictionaryKind::Durations,
                capacity: 512,
                ..
            }
        ));
    }

    #[test]
    fn test_duration_at_capacity_succeeds() {
        let segments = alternating(MAX_DURATIONS, |i| i as i64 + 1);
        let zone = encode("Just/Fits", &segments).unwrap();
        assert_eq!(zone.untils.len(), MAX_DURATIONS);
        assert_eq!(zone.data.len(), MAX_DURATIONS);
    }

    #[test]
    fn test_abbreviation_overflow_fails() {
        let mut segments = Vec::new();
        let mut from = Bound::NegInfinity;
        for i in 0..=MAX_ABBREVIATIONS as i64 {
            let until = if i == MAX_ABBREVIATIONS as i64 {
                Bound::PosInfinity
            } else {
                Bound::At((i + 1) * HOUR_MS)
            };
            segments.push(segment(&format!("A{i}"), 0, false, from, until));
            from = until;
        }
        assert!(matches!(
            encode("Too/Many", &segments),
            Err(CompileError::DictionaryOverflow {
                kind: DictionaryKind::Abbreviations,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_gaps_and_interior_infinity() {
        let gap = [
            segment("A", 0, false, Bound::NegInfinity, Bound::At(HOUR_MS)),
            segment("B", 60, false, Bound::At(2 * HOUR_MS), Bound::PosInfinity),
        ];
        assert!(matches!(
            encode("Gap", &gap),
            Err(CompileError::InvalidSegments { .. })
        ));

        let interior = [
            segment("A", 0, false, Bound::NegInfinity, Bound::PosInfinity),
            segment("B", 60, false, Bound::PosInfinity, Bound::PosInfinity),
        ];
        assert!(matches!(
            encode("Interior", &interior),
            Err(CompileError::InvalidSegments { .. })
        ));

        let open_end = [
            segment("A", 0, false, Bound::NegInfinity, Bound::At(HOUR_MS)),
            segment("B", 60, false, Bound::At(HOUR_MS), Bound::At(2 * HOUR_MS)),
        ];
        assert!(matches!(
            encode("Open/End", &open_end),
            Err(CompileError::InvalidSegments {
                reason: "last boundary is bounded",
                ..
            })
        ));

        assert!(matches!(
            encode("Empty", &[]),
            Err(CompileError::EmptyListing { .. })
        ));
    }
}
