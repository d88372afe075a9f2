// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Builds a packed store from a tzdb source tree and publishes it.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::{fs, task::JoinSet};
use tracing::{info, trace, warn};
use tzpack::compile::{parse_link_declarations, AliasMap, StoreBuilder};
use tzpack::{CompileError, PackedStore, StoreError};
use walkdir::WalkDir;

use crate::tools::{ToolError, Tools};

/// tzdb source files holding zone and link declarations.
pub const SOURCE_FILES: [&str; 9] = [
    "africa",
    "antarctica",
    "asia",
    "australasia",
    "etcetera",
    "europe",
    "northamerica",
    "southamerica",
    "backward",
];

const VERSION_FILE: &str = "version";
const LATEST: &str = "latest.json";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is empty", .0.display())]
    MissingVersion(PathBuf),

    #[error("failed to list compiled zones: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("dump task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ReleaseError + '_ {
    move |source| ReleaseError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Overrides the source tree's `version` file.
    pub version: Option<String>,
    /// Rebuild even if this version is already published.
    pub force: bool,
    /// Also write a zstd-compressed copy of the store.
    pub compress: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Published {
        version: String,
        zones: usize,
        path: PathBuf,
    },
    UpToDate {
        version: String,
    },
}

/// Compile, dump and pack every zone of a source tree, then publish the store.
///
/// Nothing is written to the output directory unless every zone compiled.
pub async fn build_release(tools: &Tools, options: &ReleaseOptions) -> Result<Outcome, ReleaseError> {
    let version = match &options.version {
        Some(version) => version.clone(),
        None => read_source_version(&options.source_dir).await?,
    };

    if !options.force && published_version(&options.out_dir).await.as_deref() == Some(version.as_str()) {
        info!("Release {version} is already published");
        return Ok(Outcome::UpToDate { version });
    }

    let aliases = AliasMap::from_links(read_links(&options.source_dir).await?);
    info!("Building release {version} with {} links", aliases.len());
    let mut builder = StoreBuilder::new(version.clone(), aliases)?;

    let scratch = tempfile::Builder::new()
        .prefix("tzpack-")
        .tempdir()
        .map_err(io_error(&std::env::temp_dir()))?;
    tools
        .zic(&options.source_dir, &SOURCE_FILES, scratch.path())
        .await?;

    let zone_files = compiled_zone_files(scratch.path())?;
    info!("Compiled {} zone files", zone_files.len());

    let mut tasks = JoinSet::new();
    for (name, path) in zone_files {
        if !builder.needs_listing(&name) {
            builder.add_alias(&name)?;
            continue;
        }
        let tools = tools.clone();
        tasks.spawn(async move {
            let listing = tools.dump(&path).await;
            (name, listing)
        });
    }

    // returning early drops the set, which aborts the remaining dumps
    while let Some(joined) = tasks.join_next().await {
        let (name, listing) = joined?;
        builder.add_zone(&name, &listing?)?;
        trace!("Packed {name}");
    }

    let store = builder.finish()?;
    let zones = store.zones.len();
    let path = publish(&store, &options.out_dir, options.compress).await?;
    info!("Published {zones} zones to {}", path.display());

    Ok(Outcome::Published {
        version,
        zones,
        path,
    })
}

pub async fn read_source_version(source_dir: &Path) -> Result<String, ReleaseError> {
    let path = source_dir.join(VERSION_FILE);
    let text = fs::read_to_string(&path).await.map_err(io_error(&path))?;
    match text.trim() {
        "" => Err(ReleaseError::MissingVersion(path)),
        version => Ok(version.to_string()),
    }
}

/// `(canonical, alias)` pairs from every source file, in file order.
pub async fn read_links(source_dir: &Path) -> Result<Vec<(String, String)>, ReleaseError> {
    let mut links = Vec::new();
    for file in SOURCE_FILES {
        let path = source_dir.join(file);
        let text = fs::read_to_string(&path).await.map_err(io_error(&path))?;
        links.extend(parse_link_declarations(&text));
    }
    Ok(links)
}

/// Zone names and paths of every file `zic` wrote under `dir`, sorted by name.
pub fn compiled_zone_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, ReleaseError> {
    let mut zones = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zones.push((name, entry.into_path()));
    }
    zones.sort();
    Ok(zones)
}

#[derive(Deserialize)]
struct Published {
    version: String,
}

/// Version of the store currently published as `latest.json`, if readable.
pub async fn published_version(out_dir: &Path) -> Option<String> {
    let path = out_dir.join(LATEST);
    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("Unable to read {}: {err}", path.display());
            return None;
        },
    };
    match serde_json::from_slice::<Published>(&bytes) {
        Ok(published) => Some(published.version),
        Err(err) => {
            warn!("Ignoring unreadable {}: {err}", path.display());
            None
        },
    }
}

/// Write `<version>.json`, optionally `<version>.json.zst`, then `latest.json`.
pub async fn publish(store: &PackedStore, out_dir: &Path, compress: bool) -> Result<PathBuf, ReleaseError> {
    fs::create_dir_all(out_dir).await.map_err(io_error(out_dir))?;

    let json = store.to_json()?;
    let path = out_dir.join(format!("{}.json", store.version));
    write_atomic(&path, json.as_bytes()).await?;

    if compress {
        let compressed = store.to_compressed()?;
        let zst = out_dir.join(format!("{}.json.zst", store.version));
        write_atomic(&zst, &compressed).await?;
    }

    write_atomic(&out_dir.join(LATEST), json.as_bytes()).await?;
    Ok(path)
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReleaseError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).await.map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).await.map_err(io_error(path))
}
