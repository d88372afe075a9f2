// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The read path: decode packed zones and answer lookups.
//!
//! [`Unpacker`] keeps the store as loaded and decodes a data zone the first
//! time it, or any link pointing at it, is queried. Each data zone has its own
//! `OnceCell`, so concurrent first queries decode at most once and every caller
//! observes the same shared segment list.
//!
//! [`unpack_file`] is the eager alternative: every zone decoded up front.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::code::Code;
use crate::error::{DictionaryKind, LookupError, UnpackError};
use crate::segment::{Bound, Segment, HOUR_MS};
use crate::store::{DataZone, PackedStore, ZoneRecord};

/// A decoded zone. Links share their canonical zone's segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Name of the record that was looked up, which is the alias for links.
    pub name: String,
    pub segments: Arc<[Segment]>,
}

impl Zone {
    /// The segment in effect at `instant` (epoch milliseconds).
    pub fn entry_at(&self, instant: i64) -> Option<&Segment> {
        let at = Bound::At(instant);
        self.segments.iter().find(|segment| at < segment.until)
    }
}

/// Lazily decoding query engine over one loaded store.
#[derive(Debug)]
pub struct Unpacker {
    version: String,
    zones: Vec<ZoneRecord>,
    /// Lowercased zone name to position in `zones`.
    index: HashMap<String, usize>,
    /// Decoded segments, keyed by lowercased canonical zone name.
    cache: HashMap<String, OnceCell<Arc<[Segment]>>>,
}

impl Unpacker {
    pub fn new(store: PackedStore) -> Self {
        let mut index = HashMap::with_capacity(store.zones.len());
        let mut cache = HashMap::new();

        for (position, record) in store.zones.iter().enumerate() {
            let key = record.name().to_lowercase();
            if index.contains_key(&key) {
                warn!("Zone {} shadows an earlier zone of the same name", record.name());
            }
            if let ZoneRecord::Data(_) = record {
                cache.insert(key.clone(), OnceCell::new());
            }
            index.insert(key, position);
        }

        Self {
            version: store.version,
            zones: store.zones,
            index,
            cache,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Case-insensitive membership test.
    pub fn has_zone(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// All zone names in store order.
    pub fn list_zones(&self) -> Vec<&str> {
        self.zones.iter().map(ZoneRecord::name).collect()
    }

    /// Look up a zone case-insensitively, following at most one link.
    ///
    /// Returns `None` for unknown names. Links to missing zones, links to links
    /// and undecodable records are also `None` and are logged; use
    /// [`Unpacker::resolve_zone`] to see the cause.
    pub fn get_zone(&self, name: &str) -> Option<Zone> {
        match self.resolve_zone(name) {
            Ok(zone) => Some(zone),
            Err(err) => {
                if err.is_data_error() {
                    warn!("Lookup of {name} failed: {err}");
                }
                None
            },
        }
    }

    /// Like [`Unpacker::get_zone`], reporting why a lookup failed.
    pub fn resolve_zone(&self, name: &str) -> Result<Zone, LookupError> {
        let record = self
            .find(name)
            .ok_or_else(|| LookupError::UnknownZone(name.to_string()))?;

        let data = match record {
            ZoneRecord::Data(data) => data,
            ZoneRecord::Link(link) => match self.find(&link.link) {
                Some(ZoneRecord::Data(data)) => data,
                Some(ZoneRecord::Link(_)) => {
                    return Err(LookupError::ChainedLink {
                        alias: link.name.clone(),
                        target: link.link.clone(),
                    })
                },
                None => {
                    return Err(LookupError::DanglingLink {
                        alias: link.name.clone(),
                        target: link.link.clone(),
                    })
                },
            },
        };

        Ok(Zone {
            name: record.name().to_string(),
            segments: self.segments(data)?,
        })
    }

    /// The segment of `name` in effect at `instant` (epoch milliseconds).
    pub fn get_zone_entry(&self, name: &str, instant: i64) -> Option<Segment> {
        self.get_zone(name)?.entry_at(instant).cloned()
    }

    /// The segment of `name` in effect now.
    pub fn current_entry(&self, name: &str) -> Option<Segment> {
        self.get_zone_entry(name, Utc::now().timestamp_millis())
    }

    fn find(&self, name: &str) -> Option<&ZoneRecord> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.zones[position])
    }

    fn segments(&self, data: &DataZone) -> Result<Arc<[Segment]>, UnpackError> {
        match self.cache.get(&data.name.to_lowercase()) {
            Some(cell) => cell
                .get_or_try_init(|| unpack_zone(data).map(Arc::from))
                .cloned(),
            // a shadowed duplicate has no cell of its own
            None => unpack_zone(data).map(Arc::from),
        }
    }
}

/// Decode one data zone's codes into its segment list.
pub fn unpack_zone(zone: &DataZone) -> Result<Vec<Segment>, UnpackError> {
    if zone.data.is_empty() {
        return Err(UnpackError::NoSegments {
            zone: zone.name.clone(),
        });
    }

    let mut segments = Vec::with_capacity(zone.data.len());
    let mut from = Bound::NegInfinity;

    for (i, &raw) in zone.data.iter().enumerate() {
        let code = Code::unpack(raw);
        let out_of_range = |kind, index, len| UnpackError::IndexOutOfRange {
            zone: zone.name.clone(),
            segment: i,
            kind,
            index,
            len,
        };

        let abbreviation = zone.abbrs.get(code.abbr_index).ok_or_else(|| {
            out_of_range(DictionaryKind::Abbreviations, code.abbr_index, zone.abbrs.len())
        })?;
        let offset = *zone.offsets.get(code.offset_index).ok_or_else(|| {
            out_of_range(DictionaryKind::Offsets, code.offset_index, zone.offsets.len())
        })?;
        let bucket = *zone.untils.get(code.duration_index).ok_or_else(|| {
            out_of_range(DictionaryKind::Durations, code.duration_index, zone.untils.len())
        })?;

        let until = match (bucket, from) {
            (None, _) => Bound::PosInfinity,
            (Some(_), Bound::PosInfinity) => {
                return Err(UnpackError::SegmentAfterUnbounded {
                    zone: zone.name.clone(),
                    segment: i,
                })
            },
            (Some(hours), from) => {
                let start = from.millis().unwrap_or(0);
                hours
                    .checked_mul(HOUR_MS)
                    .and_then(|ms| start.checked_add(ms))
                    .map(Bound::At)
                    .ok_or_else(|| UnpackError::BoundaryOverflow {
                        zone: zone.name.clone(),
                        segment: i,
                    })?
            },
        };

        segments.push(Segment {
            abbreviation: abbreviation.clone(),
            offset_minutes: offset,
            is_dst: code.is_dst,
            from,
            until,
        });
        from = until;
    }

    Ok(segments)
}

/// Every zone of a store, decoded.
#[derive(Debug, Clone)]
pub struct UnpackedFile {
    pub version: String,
    /// Zones in store order.
    pub zones: Vec<Zone>,
    /// Lowercased zone name to position in `zones`.
    pub index: HashMap<String, usize>,
}

impl UnpackedFile {
    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.zones[position])
    }
}

/// Decode every data zone and point every link at its canonical zone's segments.
pub fn unpack_file(store: &PackedStore) -> Result<UnpackedFile, UnpackError> {
    let mut decoded: HashMap<String, Arc<[Segment]>> = HashMap::new();
    for record in &store.zones {
        if let ZoneRecord::Data(data) = record {
            decoded.insert(data.name.to_lowercase(), Arc::from(unpack_zone(data)?));
        }
    }

    let mut zones = Vec::with_capacity(store.zones.len());
    let mut index = HashMap::with_capacity(store.zones.len());

    for record in &store.zones {
        let segments = match record {
            ZoneRecord::Data(data) => decoded[&data.name.to_lowercase()].clone(),
            ZoneRecord::Link(link) => match decoded.get(&link.link.to_lowercase()) {
                Some(segments) => segments.clone(),
                None => {
                    let target_is_link = store.zones.iter().any(|other| {
                        other.is_link() && other.name().eq_ignore_ascii_case(&link.link)
                    });
                    return Err(if target_is_link {
                        UnpackError::ChainedLink {
                            alias: link.name.clone(),
                            target: link.link.clone(),
                        }
                    } else {
                        UnpackError::DanglingLink {
                            alias: link.name.clone(),
                            target: link.link.clone(),
                        }
                    });
                },
            },
        };
        index.insert(record.name().to_lowercase(), zones.len());
        zones.push(Zone {
            name: record.name().to_string(),
            segments,
        });
    }

    Ok(UnpackedFile {
        version: store.version.clone(),
        zones,
        index,
    })
}
