// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Runs the tzdb `zic` compiler and `zdump` dumper.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{command}` printed nothing")]
    EmptyOutput { command: String },

    #[error("tool runner is shut down")]
    Closed,
}

/// Paths of the tzdb tools and the limit on concurrent dumps.
#[derive(Debug, Clone)]
pub struct Tools {
    zic: PathBuf,
    zdump: PathBuf,
    permits: Arc<Semaphore>,
}

impl Tools {
    pub fn new(zic: impl Into<PathBuf>, zdump: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            zic: zic.into(),
            zdump: zdump.into(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Compile `files` of `source_dir` into `out_dir`, one file at a time.
    pub async fn zic(&self, source_dir: &Path, files: &[&str], out_dir: &Path) -> Result<(), ToolError> {
        for file in files {
            let mut command = Command::new(&self.zic);
            command.arg("-d").arg(out_dir).arg(source_dir.join(file));
            run(command).await?;
        }
        Ok(())
    }

    /// Dump every transition of a compiled zone file.
    ///
    /// A zone without transitions prints nothing for `zdump -V`; it is dumped
    /// again as `zdump UTC <file>`, which the listing parser understands as a
    /// fixed-offset zone. The same retry covers a failing verbose dump.
    pub async fn dump(&self, zone_file: &Path) -> Result<String, ToolError> {
        let _permit = self.permits.acquire().await.map_err(|_| ToolError::Closed)?;

        let mut verbose = Command::new(&self.zdump);
        verbose.arg("-V").arg(zone_file);
        match run(verbose).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => debug!("{} has no transitions", zone_file.display()),
            Err(err) => warn!("{err}, retrying without -V"),
        }

        let mut fallback = Command::new(&self.zdump);
        fallback.arg("UTC").arg(zone_file);
        let line = describe(&fallback);
        let text = run(fallback).await?;
        if text.trim().is_empty() {
            return Err(ToolError::EmptyOutput { command: line });
        }
        Ok(text)
    }
}

async fn run(mut command: Command) -> Result<String, ToolError> {
    let line = describe(&command);
    debug!("Running {line}");
    command.kill_on_drop(true);

    let output = command.output().await.map_err(|source| ToolError::Spawn {
        command: line.clone(),
        source,
    })?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            command: line,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn describe(command: &Command) -> String {
    let command = command.as_std();
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
