//! The post manifest: which Markdown files make up the blog.
//!
//! The manifest is a YAML file listing source paths, in publishing order:
//!
//! ```yaml
//! markdown_files:
//!   - file: posts/01-hello-world.md
//!   - file: posts/02-notes-on-rust.md
//! ```
//!
//! A bare list (without the `markdown_files` key) is accepted too. Paths are
//! kept exactly as written; they double as ledger keys.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default manifest filename, looked up in the working directory.
pub const MANIFEST_FILENAME: &str = "md_files.yml";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub file: PathBuf,
}

/// Ordered list of posts to build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawManifest {
    Keyed { markdown_files: Vec<ManifestEntry> },
    Bare(Vec<ManifestEntry>),
}

impl Manifest {
    /// Parse manifest YAML text.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null; treat it as no posts.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries = match serde_yaml::from_str::<RawManifest>(content)? {
            RawManifest::Keyed { markdown_files } => markdown_files,
            RawManifest::Bare(entries) => entries,
        };
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read and parse the manifest at `path`.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest = Manifest::parse(&content).map_err(|source| ManifestError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("manifest {} lists {} posts", path.display(), manifest.len());
    Ok(manifest)
}
