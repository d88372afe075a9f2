// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The write path: transition listings in, packed store out.
//!
//! ```text
//! listing --parse_listing--> raw transitions --collapse--> segments --encode--> DataZone
//! ```
//!
//! Zones declared as links skip all three steps and become [`LinkZone`] records.

pub mod alias;
pub mod collapse;
pub mod encode;
pub mod parser;

use std::collections::BTreeMap;

use tracing::trace;

pub use alias::{parse_link_declarations, AliasMap};
pub use collapse::collapse;
pub use encode::encode;
pub use parser::{parse_listing, RawTransition};

use crate::error::CompileError;
use crate::store::{DataZone, LinkZone, PackedStore, ZoneRecord};

/// Compile one zone's transition listing into a data record.
pub fn compile_zone(zone: &str, listing: &str) -> Result<DataZone, CompileError> {
    let records = parse_listing(zone, listing)?;
    let segments = collapse(&records);
    let data = encode(zone, &segments)?;
    trace!(
        "{zone}: {} transitions, {} segments, {} abbrs, {} offsets, {} buckets",
        records.len(),
        segments.len(),
        data.abbrs.len(),
        data.offsets.len(),
        data.untils.len()
    );
    Ok(data)
}

/// Collects the zones of one release and produces its store.
///
/// The store is only produced by [`StoreBuilder::finish`], once every zone has
/// compiled and every link has been checked against the data zones.
#[derive(Debug)]
pub struct StoreBuilder {
    version: String,
    aliases: AliasMap,
    zones: BTreeMap<String, ZoneRecord>,
}

impl StoreBuilder {
    pub fn new(version: impl Into<String>, aliases: AliasMap) -> Result<Self, CompileError> {
        aliases.validate()?;
        Ok(Self {
            version: version.into(),
            aliases,
            zones: BTreeMap::new(),
        })
    }

    /// Whether `name` needs its transitions dumped, i.e. is not a declared link.
    pub fn needs_listing(&self, name: &str) -> bool {
        !self.aliases.is_alias(name)
    }

    /// Add a compiled zone. Declared links become link records and `listing` is not read.
    pub fn add_zone(&mut self, name: &str, listing: &str) -> Result<(), CompileError> {
        if !self.needs_listing(name) {
            return self.add_alias(name);
        }
        let data = compile_zone(name, listing)?;
        self.insert(ZoneRecord::Data(data))
    }

    /// Add a compiled zone that is a declared link.
    pub fn add_alias(&mut self, name: &str) -> Result<(), CompileError> {
        let Some(target) = self.aliases.canonical(name) else {
            return Err(CompileError::UndeclaredLink {
                zone: name.to_string(),
            });
        };
        let record = ZoneRecord::Link(LinkZone {
            name: name.to_string(),
            link: target.to_string(),
        });
        self.insert(record)
    }

    fn insert(&mut self, record: ZoneRecord) -> Result<(), CompileError> {
        let name = record.name().to_string();
        if self.zones.contains_key(&name) {
            return Err(CompileError::DuplicateZone { zone: name });
        }
        self.zones.insert(name, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Check every link targets a data zone and produce the sorted store.
    pub fn finish(self) -> Result<PackedStore, CompileError> {
        for record in self.zones.values() {
            if let ZoneRecord::Link(link) = record {
                match self.zones.get(&link.link) {
                    Some(ZoneRecord::Data(_)) => {},
                    Some(ZoneRecord::Link(_)) => {
                        return Err(CompileError::ChainedLink {
                            alias: link.name.clone(),
                            target: link.link.clone(),
                        })
                    },
                    None => {
                        return Err(CompileError::DanglingLink {
                            alias: link.name.clone(),
                            target: link.link.clone(),
                        })
                    },
                }
            }
        }
        Ok(PackedStore::new(
            self.version,
            self.zones.into_values().collect(),
        ))
    }
}
