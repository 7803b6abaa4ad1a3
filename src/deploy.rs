//! Publishing the built site: storage sync followed by a CDN invalidation.
//!
//! Both steps shell out to the configured cloud CLI (`aws` by default):
//!
//! ```text
//! aws s3 sync site s3://example.com --exclude "*" --include "*.html" --include "*.css" ...
//! aws cloudfront create-invalidation --distribution-id E123 --paths "/*"
//! ```
//!
//! The sync excludes everything and then re-includes the allow-listed
//! extensions, so ledgers, manifests and templates sitting in the output
//! directory are never uploaded. The invalidation only runs after a
//! successful sync.

use crate::command::{self, CommandError};
use crate::config::DeployTarget;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("sync to {bucket} failed: {source}")]
    Sync {
        bucket: String,
        #[source]
        source: CommandError,
    },
    #[error("invalidation of distribution {distribution_id} failed: {source}")]
    Invalidate {
        distribution_id: String,
        #[source]
        source: CommandError,
    },
}

impl DeployError {
    /// Captured stderr of the failing command, if it ran at all.
    pub fn stderr(&self) -> Option<&str> {
        let (Self::Sync { source, .. } | Self::Invalidate { source, .. }) = self;
        match source {
            CommandError::Failed { stderr, .. } => Some(stderr.as_str()),
            CommandError::Spawn { .. } => None,
        }
    }
}

/// One external command of the deploy stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlannedCommand {
    /// Command line as it would be typed in a shell.
    pub fn display(&self) -> String {
        command::display_command(&self.program, &self.args)
    }
}

/// The sync and invalidation commands, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub sync: PlannedCommand,
    pub invalidate: PlannedCommand,
}

/// Build the deploy commands without running them.
pub fn plan(target: &DeployTarget, output_dir: &Path) -> DeployPlan {
    let mut sync_args = vec![
        "s3".to_string(),
        "sync".to_string(),
        output_dir.to_string_lossy().to_string(),
        target.bucket.clone(),
        "--exclude".to_string(),
        "*".to_string(),
    ];
    for ext in &target.extensions {
        sync_args.push("--include".to_string());
        sync_args.push(format!("*.{ext}"));
    }

    DeployPlan {
        sync: PlannedCommand {
            program: target.cli.clone(),
            args: sync_args,
        },
        invalidate: PlannedCommand {
            program: target.cli.clone(),
            args: vec![
                "cloudfront".to_string(),
                "create-invalidation".to_string(),
                "--distribution-id".to_string(),
                target.distribution_id.clone(),
                "--paths".to_string(),
                "/*".to_string(),
            ],
        },
    }
}

/// Sync `output_dir` to the bucket, then invalidate the distribution.
pub fn run(target: &DeployTarget, output_dir: &Path) -> Result<DeployPlan, DeployError> {
    let plan = plan(target, output_dir);

    tracing::info!("syncing {} to {}", output_dir.display(), target.bucket);
    let output = command::run(None, &plan.sync.program, &plan.sync.args).map_err(|source| {
        DeployError::Sync {
            bucket: target.bucket.clone(),
            source,
        }
    })?;
    let uploaded = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| l.starts_with("upload:"))
        .count();
    tracing::info!("sync complete, {uploaded} files uploaded");

    tracing::info!("invalidating distribution {}", target.distribution_id);
    command::run(None, &plan.invalidate.program, &plan.invalidate.args).map_err(|source| {
        DeployError::Invalidate {
            distribution_id: target.distribution_id.clone(),
            source,
        }
    })?;
    tracing::info!("invalidation requested");

    Ok(plan)
}
