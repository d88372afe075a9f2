// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error types for compiling, storing and querying packed zones.
//!
//! Compile errors are fatal for the whole run: a store is either built from
//! every zone or not at all. Lookup errors are ordinary query results.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which per-zone dictionary ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    Abbreviations,
    Offsets,
    Durations,
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DictionaryKind::Abbreviations => "abbreviation",
            DictionaryKind::Offsets => "offset",
            DictionaryKind::Durations => "duration",
        })
    }
}

/// Source-data errors raised on the write path.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("zone '{zone}': transition listing has no usable records")]
    EmptyListing { zone: String },

    #[error("zone '{zone}': {kind} dictionary exceeds its capacity of {capacity} entries")]
    DictionaryOverflow {
        zone: String,
        kind: DictionaryKind,
        capacity: usize,
    },

    #[error("zone '{zone}': segments do not form a partition of time: {reason}")]
    InvalidSegments { zone: String, reason: &'static str },

    #[error("link '{alias}' targets '{target}', which is itself a link")]
    ChainedLink { alias: String, target: String },

    #[error("link '{alias}' targets '{target}', which is not a compiled data zone")]
    DanglingLink { alias: String, target: String },

    #[error("zone '{zone}' was added as a link but no link declares it")]
    UndeclaredLink { zone: String },

    #[error("zone '{zone}' was added more than once")]
    DuplicateZone { zone: String },
}

/// A data zone record that cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnpackError {
    #[error("zone '{zone}' has no segment codes")]
    NoSegments { zone: String },

    #[error("zone '{zone}': segment {segment} references {kind} index {index}, dictionary has {len}")]
    IndexOutOfRange {
        zone: String,
        segment: usize,
        kind: DictionaryKind,
        index: usize,
        len: usize,
    },

    #[error("zone '{zone}': segment {segment} boundary is out of range")]
    BoundaryOverflow { zone: String, segment: usize },

    #[error("zone '{zone}': segment {segment} follows an unbounded segment")]
    SegmentAfterUnbounded { zone: String, segment: usize },

    #[error("link '{alias}' targets '{target}', which is itself a link")]
    ChainedLink { alias: String, target: String },

    #[error("link '{alias}' targets unknown zone '{target}'")]
    DanglingLink { alias: String, target: String },
}

/// Why a query-time lookup produced no zone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    #[error("link '{alias}' targets unknown zone '{target}'")]
    DanglingLink { alias: String, target: String },

    #[error("link '{alias}' targets '{target}', which is itself a link")]
    ChainedLink { alias: String, target: String },

    #[error(transparent)]
    Corrupt(#[from] UnpackError),
}

impl LookupError {
    /// Whether the error reveals an inconsistent store rather than a plain miss.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, LookupError::UnknownZone(_))
    }
}

/// Failures reading or writing a packed store document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
