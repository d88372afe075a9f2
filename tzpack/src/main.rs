// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

mod environment;
mod minimal_tracer;
mod release;
mod tools;

use std::{
    error::Error,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use environment::{ENV_TZPACK_CONCURRENCY, ENV_TZPACK_OUT_DIR, ENV_TZPACK_ZDUMP, ENV_TZPACK_ZIC};
use minimal_tracer::MinimalTracer;
use release::{build_release, Outcome, ReleaseOptions};
use tokio::fs;
use tools::{Tools, DEFAULT_CONCURRENCY};
use tracing::trace;
use tzpack::{PackedStore, Unpacker};

/// Packed timezone transition tables.
#[derive(Parser, Debug)]
#[command(name = "tzpack", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a tzdb source tree and publish its packed store.
    Build(BuildArgs),
    /// Print the rule of a zone in effect at an instant.
    Query(QueryArgs),
    /// List every zone of a packed store.
    List {
        /// Packed store, plain or zstd-compressed JSON.
        store: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Extracted tzdb source directory.
    source_dir: PathBuf,
    /// Release identifier; read from the source `version` file when omitted.
    #[arg(long)]
    version: Option<String>,
    /// Directory receiving `<version>.json` and `latest.json`.
    #[arg(long, env = ENV_TZPACK_OUT_DIR, default_value = "dist")]
    out: PathBuf,
    #[arg(long, env = ENV_TZPACK_ZIC, default_value = "zic")]
    zic: PathBuf,
    #[arg(long, env = ENV_TZPACK_ZDUMP, default_value = "zdump")]
    zdump: PathBuf,
    /// Maximum number of concurrent `zdump` processes.
    #[arg(long, env = ENV_TZPACK_CONCURRENCY, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
    /// Rebuild even if the release is already published.
    #[arg(long)]
    force: bool,
    /// Also write a zstd-compressed copy of the store.
    #[arg(long)]
    compress: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Packed store, plain or zstd-compressed JSON.
    store: PathBuf,
    /// Zone name, matched case-insensitively.
    zone: String,
    /// Instant in milliseconds since the epoch; defaults to now.
    #[arg(long, allow_negative_numbers = true)]
    at: Option<i64>,
    /// Print every segment of the zone instead.
    #[arg(long, conflicts_with = "at")]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let now = Instant::now();

    MinimalTracer::register()?;
    trace!("Started tzpack");

    match Cli::parse().command {
        Command::Build(args) => build(args).await?,
        Command::Query(args) => query(args).await?,
        Command::List { store } => {
            let unpacker = load(&store).await?;
            for name in unpacker.list_zones() {
                println!("{name}");
            }
        },
    }

    trace!("Finished in {}ms", now.elapsed().as_millis());
    Ok(())
}

async fn build(args: BuildArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let tools = Tools::new(args.zic, args.zdump, args.concurrency);
    let options = ReleaseOptions {
        source_dir: args.source_dir,
        out_dir: args.out,
        version: args.version,
        force: args.force,
        compress: args.compress,
    };

    match build_release(&tools, &options).await? {
        Outcome::Published {
            version,
            zones,
            path,
        } => println!("{version}: {zones} zones written to {}", path.display()),
        Outcome::UpToDate { version } => println!("{version}: already published"),
    }
    Ok(())
}

async fn query(args: QueryArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let unpacker = load(&args.store).await?;
    let zone = unpacker.resolve_zone(&args.zone)?;

    if args.all {
        for segment in zone.segments.iter() {
            println!("{segment}");
        }
        return Ok(());
    }

    let at = match args.at {
        Some(at) => at,
        None => Utc::now().timestamp_millis(),
    };
    match zone.entry_at(at) {
        Some(segment) => println!("{} {segment}", zone.name),
        None => return Err(format!("{} has no segment at {at}", zone.name).into()),
    }
    Ok(())
}

async fn load(path: &Path) -> Result<Unpacker, Box<dyn Error + Send + Sync>> {
    let bytes = fs::read(path).await?;
    let store = PackedStore::from_slice(&bytes)?;
    trace!("Loaded {} zones of release {}", store.zones.len(), store.version);
    Ok(Unpacker::new(store))
}
