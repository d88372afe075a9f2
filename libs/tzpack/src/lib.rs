// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Dictionary-packed timezone transition tables.
//!
//! A zone's full history is stored as a list of validity segments, each with
//! an abbreviation, a UTC offset and a DST flag. Segments are dictionary
//! encoded into one 32-bit code each, so a whole tzdb release fits in a small
//! JSON document.
//!
//! # Architecture
//!
//! 1. **Write path** ([`compile`]) - Parses `zdump` listings, merges
//!    consecutive transitions with the same rule and packs the segments.
//!    Link declarations become alias records that carry no data.
//!
//! 2. **Store** ([`PackedStore`]) - A version string and every zone record,
//!    sorted by name. Serialized as JSON, optionally zstd-compressed.
//!
//! 3. **Read path** ([`Unpacker`]) - Decodes a zone on first lookup and caches
//!    it. Links resolve to their canonical zone's segments.
//!
//! # Code layout
//!
//! ```text
//!  31      15 14    10   9   8          0
//! | abbr     | offset | dst | duration  |
//! ```
//!
//! Durations are whole hours: the first bucket counts hours since the epoch,
//! every later one hours since the previous boundary. A `null` bucket is the
//! unbounded end of a zone's last segment.
//!
//! # Example
//!
//! ```
//! use tzpack::compile::{AliasMap, StoreBuilder};
//! use tzpack::{PackedStore, Unpacker};
//!
//! let aliases = AliasMap::from_links([("Asia/Kolkata", "Asia/Calcutta")]);
//! let mut builder = StoreBuilder::new("2024a", aliases).unwrap();
//! builder
//!     .add_zone(
//!         "Asia/Kolkata",
//!         "UTC  Mon Jan  1 00:00:00 2024 UTC\nAsia/Kolkata  Mon Jan  1 05:30:00 2024 IST\n",
//!     )
//!     .unwrap();
//! builder.add_alias("Asia/Calcutta").unwrap();
//!
//! let json = builder.finish().unwrap().to_json().unwrap();
//! let unpacker = Unpacker::new(PackedStore::from_json(&json).unwrap());
//!
//! let entry = unpacker.get_zone_entry("asia/calcutta", 1_704_067_200_000).unwrap();
//! assert_eq!(entry.abbreviation, "IST");
//! assert_eq!(entry.offset_minutes, -330);
//! ```

mod code;
pub mod compile;
mod error;
mod segment;
mod store;
mod unpacker;

pub use code::{Code, MAX_ABBREVIATIONS, MAX_DURATIONS, MAX_OFFSETS};
pub use error::{CompileError, DictionaryKind, LookupError, StoreError, UnpackError};
pub use segment::{Bound, Segment, HOUR_MS, MINUTE_MS};
pub use store::{DataZone, LinkZone, PackedStore, ZoneRecord};
pub use unpacker::{unpack_file, unpack_zone, UnpackedFile, Unpacker, Zone};
