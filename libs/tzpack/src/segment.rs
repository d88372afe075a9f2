// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Validity segments and the instants that bound them.

use std::fmt;

use chrono::DateTime;

/// Milliseconds in one hour, the unit of duration buckets.
pub const HOUR_MS: i64 = 3_600_000;

/// Milliseconds in one minute, the unit of UTC offsets.
pub const MINUTE_MS: i64 = 60_000;

/// A segment boundary: an epoch-milliseconds instant or one of the two ends of time.
///
/// Variants are declared in time order so the derived `Ord` sorts
/// `NegInfinity < At(_) < PosInfinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInfinity,
    At(i64),
    PosInfinity,
}

impl Bound {
    /// Milliseconds since the Unix epoch, if the bound is finite.
    pub fn millis(self) -> Option<i64> {
        match self {
            Bound::At(ms) => Some(ms),
            _ => None,
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, Bound::At(_))
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInfinity => write!(f, "-inf"),
            Bound::PosInfinity => write!(f, "+inf"),
            Bound::At(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
                None => write!(f, "{ms}ms"),
            },
        }
    }
}

/// A maximal interval `[from, until)` during which a zone's abbreviation,
/// UTC offset and DST status are constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub abbreviation: String,
    /// `(utc - local)` in minutes, so zones east of UTC are negative.
    pub offset_minutes: i32,
    pub is_dst: bool,
    pub from: Bound,
    pub until: Bound,
}

impl Segment {
    /// Whether `instant` (epoch milliseconds) falls inside `[from, until)`.
    pub fn contains(&self, instant: i64) -> bool {
        let at = Bound::At(instant);
        self.from <= at && at < self.until
    }

    /// Whether two segments describe the same effective rule.
    pub fn same_rule(&self, other: &Segment) -> bool {
        self.abbreviation == other.abbreviation && self.offset_minutes == other.offset_minutes
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let east = -self.offset_minutes;
        let sign = if east < 0 { '-' } else { '+' };
        write!(
            f,
            "{} UTC{}{:02}:{:02}{} [{}, {})",
            self.abbreviation,
            sign,
            east.abs() / 60,
            east.abs() % 60,
            if self.is_dst { " dst" } else { "" },
            self.from,
            self.until
        )
    }
}
