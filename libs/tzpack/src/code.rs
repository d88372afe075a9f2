// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Bit layout of a packed segment code.
//!
//! ```text
//!  31 ........ 15 | 14 .... 10 |  9  | 8 ........ 0
//!  abbr index     | offset idx | dst | duration idx
//! ```
//!
//! The layout is defined over integer values, so any serialization of the
//! code sequence round-trips as long as the integers do.

const DURATION_BITS: u32 = 9;
const OFFSET_BITS: u32 = 5;
const ABBR_BITS: u32 = 6;

const DST_SHIFT: u32 = DURATION_BITS;
const OFFSET_SHIFT: u32 = DST_SHIFT + 1;
const ABBR_SHIFT: u32 = OFFSET_SHIFT + OFFSET_BITS;

const DURATION_MASK: u32 = (1 << DURATION_BITS) - 1;
const OFFSET_MASK: u32 = (1 << OFFSET_BITS) - 1;

/// Distinct duration buckets a single zone may use.
pub const MAX_DURATIONS: usize = 1 << DURATION_BITS;
/// Distinct UTC offsets a single zone may use.
pub const MAX_OFFSETS: usize = 1 << OFFSET_BITS;
/// Distinct abbreviations a single zone may use.
pub const MAX_ABBREVIATIONS: usize = 1 << ABBR_BITS;

/// The unpacked fields of one segment code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub abbr_index: usize,
    pub offset_index: usize,
    pub is_dst: bool,
    pub duration_index: usize,
}

impl Code {
    /// Pack into a single integer.
    ///
    /// Indices must be below their `MAX_*` capacity; the encoder enforces this
    /// before packing.
    #[inline]
    pub fn pack(self) -> u32 {
        debug_assert!(self.abbr_index < MAX_ABBREVIATIONS);
        debug_assert!(self.offset_index < MAX_OFFSETS);
        debug_assert!(self.duration_index < MAX_DURATIONS);

        ((self.abbr_index as u32) << ABBR_SHIFT)
            | ((self.offset_index as u32) << OFFSET_SHIFT)
            | ((self.is_dst as u32) << DST_SHIFT)
            | self.duration_index as u32
    }

    /// Split a packed integer back into its fields.
    ///
    /// The abbreviation index takes every bit from 15 up, so a code beyond
    /// the encoder's capacity yields an out-of-range index instead of wrapping.
    #[inline]
    pub fn unpack(code: u32) -> Self {
        Self {
            abbr_index: (code >> ABBR_SHIFT) as usize,
            offset_index: ((code >> OFFSET_SHIFT) & OFFSET_MASK) as usize,
            is_dst: (code >> DST_SHIFT) & 1 == 1,
            duration_index: (code & DURATION_MASK) as usize,
        }
    }
}
