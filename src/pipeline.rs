//! One build run, start to finish.
//!
//! ```text
//! load ledger
//!   → for each manifest entry:
//!       missing file          → log, count, continue
//!       hash matches ledger   → skip (page directory untouched)
//!       otherwise             → render → copy assets → publish → record hash
//!   → persist ledger
//!   → index page + sitemap (from the whole published tree)
//!   → deploy, if a distribution id is configured
//! ```
//!
//! The first fatal error (converter failure, asset copy, index template,
//! deploy command) aborts the rest of the run and is returned to the caller.
//! Nothing retries. The ledger is written once, after the document loop, so
//! an aborted run leaves the previous ledger in place and the next run
//! rebuilds whatever it had not yet recorded.

use crate::config::RunConfig;
use crate::deploy::{self, DeployError, DeployPlan};
use crate::index::{self, IndexError, IndexReport};
use crate::ledger::{self, BuildStats, Ledger};
use crate::manifest::{self, ManifestError};
use crate::publish::{self, PublishError};
use crate::render::{self, MarkdownConverter, PageShell, RenderError};
use crate::types::{PublishedPage, SourceDocument};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Knobs for a single [`build`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Rebuild every document regardless of the ledger.
    pub force: bool,
    /// Run the deploy stage when the config has a deploy target.
    pub deploy: bool,
    /// Plan the deploy commands but don't run them.
    pub dry_run: bool,
}

/// What happened to one manifest entry.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Missing,
    Unchanged,
    Built(PublishedPage),
}

#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
}

#[derive(Debug, Clone)]
pub enum DeployStatus {
    /// No distribution id configured, or deploy disabled for this run.
    Skipped,
    /// `--dry-run`: commands were planned, not executed.
    Planned(DeployPlan),
    Completed(DeployPlan),
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub stats: BuildStats,
    pub documents: Vec<DocumentReport>,
    pub index: IndexReport,
    pub deploy: DeployStatus,
    /// False when the ledger could not be written; the next run rebuilds.
    pub ledger_saved: bool,
}

/// Run the full pipeline.
pub fn build(
    config: &RunConfig,
    converter: &dyn MarkdownConverter,
    options: BuildOptions,
) -> Result<BuildReport, BuildError> {
    let manifest = manifest::load_manifest(&config.manifest_path)?;
    let mut ledger = Ledger::load(&config.ledger_path);
    let shell = PageShell::from_run_config(config);

    let mut stats = BuildStats::default();
    let mut documents = Vec::with_capacity(manifest.len());

    for entry in &manifest.entries {
        let outcome = build_document(
            &entry.file,
            config,
            converter,
            &shell,
            &mut ledger,
            options.force,
        )?;
        match &outcome {
            DocumentOutcome::Missing => stats.missing += 1,
            DocumentOutcome::Unchanged => stats.skipped += 1,
            DocumentOutcome::Built(page) => {
                stats.built += 1;
                stats.assets += page.assets_copied as u32;
            }
        }
        documents.push(DocumentReport {
            path: entry.file.clone(),
            outcome,
        });
    }

    let ledger_saved = match ledger.persist(&config.ledger_path) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(
                "cannot write ledger {}: {err}",
                config.ledger_path.display()
            );
            false
        }
    };

    let index = index::build_index(config)?;

    let deploy = match (&config.deploy, options.deploy) {
        (Some(target), true) if options.dry_run => {
            DeployStatus::Planned(deploy::plan(target, &config.output_dir))
        }
        (Some(target), true) => DeployStatus::Completed(deploy::run(target, &config.output_dir)?),
        (Some(_), false) => {
            tracing::info!("deploy disabled for this run");
            DeployStatus::Skipped
        }
        (None, _) => {
            tracing::debug!("no distribution id configured, skipping deploy");
            DeployStatus::Skipped
        }
    };

    tracing::info!("build finished: {stats}");
    Ok(BuildReport {
        stats,
        documents,
        index,
        deploy,
        ledger_saved,
    })
}

fn build_document(
    path: &Path,
    config: &RunConfig,
    converter: &dyn MarkdownConverter,
    shell: &PageShell,
    ledger: &mut Ledger,
    force: bool,
) -> Result<DocumentOutcome, BuildError> {
    let hash = match ledger::hash_file(path) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("skipping {}: {err}", path.display());
            return Ok(DocumentOutcome::Missing);
        }
    };
    let source = SourceDocument {
        path: path.to_path_buf(),
        hash,
    };
    let key = source.key();

    if !force && ledger.is_unchanged(&key, &source.hash) {
        tracing::debug!("{} unchanged", path.display());
        return Ok(DocumentOutcome::Unchanged);
    }

    tracing::info!("building {}", path.display());
    let page = render::render_page(converter, &source.path, shell)?;
    let published = publish::publish(&page, &source, &config.target_dir)?;
    tracing::info!(
        "{} → {}",
        path.display(),
        published.html_path.display()
    );
    ledger.record(key, source.hash);
    Ok(DocumentOutcome::Built(published))
}

/// Regenerate only the index page and sitemap.
pub fn rebuild_index(config: &RunConfig) -> Result<IndexReport, IndexError> {
    index::build_index(config)
}

/// Ledger status of a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Missing,
    Unchanged,
    /// New or modified since the last recorded build.
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub entries: Vec<(PathBuf, CheckStatus)>,
}

impl CheckReport {
    pub fn count(&self, status: CheckStatus) -> usize {
        self.entries.iter().filter(|(_, s)| *s == status).count()
    }
}

/// Compare every manifest entry against the ledger without writing anything.
pub fn check(config: &RunConfig) -> Result<CheckReport, ManifestError> {
    let manifest = manifest::load_manifest(&config.manifest_path)?;
    let ledger = Ledger::load(&config.ledger_path);

    let entries = manifest
        .entries
        .iter()
        .map(|entry| {
            let status = match ledger::hash_file(&entry.file) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => CheckStatus::Missing,
                Err(err) => {
                    tracing::warn!("cannot hash {}: {err}", entry.file.display());
                    CheckStatus::Missing
                }
                Ok(hash) if ledger.is_unchanged(&entry.file.to_string_lossy(), &hash) => {
                    CheckStatus::Unchanged
                }
                Ok(_) => CheckStatus::Changed,
            };
            (entry.file.clone(), status)
        })
        .collect();

    Ok(CheckReport { entries })
}
