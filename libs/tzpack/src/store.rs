// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The packed store document.
//!
//! One record per zone, sorted by name. A record is either a data zone
//! carrying its three dictionaries and code sequence, or a link naming the
//! data zone whose segments it shares. The variant is carried in an explicit
//! `type` tag:
//!
//! ```json
//! { "type": "data", "name": "Asia/Kolkata", "abbrs": ["IST"],
//!   "offsets": [-330], "untils": [null], "data": [0] }
//! { "type": "link", "name": "Asia/Calcutta", "link": "Asia/Kolkata" }
//! ```
//!
//! Stores may also be written zstd-compressed; [`PackedStore::from_slice`]
//! accepts either form.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Zstd frame magic, little-endian.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression level for compressed store artifacts.
const ZSTD_LEVEL: i32 = 19;

/// A zone that owns segment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataZone {
    pub name: String,
    /// Abbreviation dictionary.
    pub abbrs: Vec<String>,
    /// Offset dictionary, `(utc - local)` in minutes.
    pub offsets: Vec<i32>,
    /// Duration-bucket dictionary in whole hours; `None` is the unbounded end of time.
    pub untils: Vec<Option<i64>>,
    /// One packed code per segment, oldest first.
    pub data: Vec<u32>,
}

/// A zone whose rules are those of another data zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkZone {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ZoneRecord {
    Data(DataZone),
    Link(LinkZone),
}

impl ZoneRecord {
    pub fn name(&self) -> &str {
        match self {
            ZoneRecord::Data(zone) => &zone.name,
            ZoneRecord::Link(zone) => &zone.name,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, ZoneRecord::Link(_))
    }
}

/// The serialized artifact of one compiler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedStore {
    pub version: String,
    pub zones: Vec<ZoneRecord>,
}

impl PackedStore {
    /// Create a store, sorting zones by name.
    pub fn new(version: impl Into<String>, mut zones: Vec<ZoneRecord>) -> Self {
        zones.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            version: version.into(),
            zones,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a store from bytes that are either plain JSON or a zstd frame of JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.starts_with(&ZSTD_MAGIC) {
            let json = zstd::stream::decode_all(Cursor::new(bytes))?;
            return Ok(serde_json::from_slice(&json)?);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to zstd-compressed JSON.
    pub fn to_compressed(&self) -> Result<Vec<u8>, StoreError> {
        let json = serde_json::to_vec(self)?;
        Ok(zstd::stream::encode_all(Cursor::new(json), ZSTD_LEVEL)?)
    }
}
