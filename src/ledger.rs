//! Checksum ledger for incremental builds.
//!
//! Rendering a post means spawning the Markdown converter, copying its assets
//! and rewriting its output directory. This module lets the build skip all of
//! that when the source file has not changed since the last run.
//!
//! # Design
//!
//! The ledger maps each source path (exactly as written in the manifest) to
//! the SHA-256 of the file's contents. Content-based rather than mtime-based
//! so it survives `git checkout`, which resets modification times.
//!
//! A post is rebuilt when its current hash differs from the recorded one or
//! when it has no entry at all. The first run, or a run after the ledger file
//! was deleted, therefore rebuilds everything.
//!
//! ## Storage
//!
//! Plain text, one entry per line:
//!
//! ```text
//! posts/03-my-first-post.md~9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//! posts/04-second.md~60303ae22b998861bce3b28f33eec1be758a213c86c93c076dbe9f558c11c752
//! ```
//!
//! The file is read once at startup and rewritten in full once at the end of
//! the run. Entries for posts that were missing this run are kept.
//!
//! ## Failure handling
//!
//! Reading never fails: a missing or unreadable file yields an empty ledger
//! and malformed lines are skipped. Writing returns the I/O error and leaves
//! the decision to the caller.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Separator between path and hash on each ledger line.
const SEPARATOR: char = '~';

/// In-memory view of the checksum ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<String, String>,
}

impl Ledger {
    /// An empty ledger.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the ledger from `path`. Returns an empty ledger if the file
    /// doesn't exist or can't be read.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    "no checksum ledger at {}, every post will be rebuilt",
                    path.display()
                );
                return Self::empty();
            }
            Err(err) => {
                tracing::error!("error reading checksum ledger {}: {err}", path.display());
                return Self::empty();
            }
        };
        Self::parse(&content)
    }

    /// Parse ledger text, skipping lines that are not `<path>~<hash>`.
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.rsplit_once(SEPARATOR) {
                Some((path, hash)) if !path.is_empty() && !hash.is_empty() => {
                    entries.insert(path.to_string(), hash.to_string());
                }
                _ => tracing::warn!("skipping malformed ledger line {}: {line:?}", lineno + 1),
            }
        }
        Self { entries }
    }

    /// Whether `path` was recorded with exactly `hash`.
    pub fn is_unchanged(&self, path: &str, hash: &str) -> bool {
        self.entries.get(path).is_some_and(|h| h == hash)
    }

    /// Record (or replace) the hash for `path`.
    pub fn record(&mut self, path: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(path.into(), hash.into());
    }

    /// Recorded hash for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to ledger text, one line per entry, sorted by path.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(path, hash)| format!("{path}{SEPARATOR}{hash}\n"))
            .collect()
    }

    /// Overwrite the ledger file with the full current map.
    pub fn persist(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_text())
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// Per-run counters for the end-of-build summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub built: u32,
    pub skipped: u32,
    pub missing: u32,
    pub assets: u32,
}

impl BuildStats {
    pub fn total(&self) -> u32 {
        self.built + self.skipped + self.missing
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} built, {} unchanged ({} total)",
            self.built,
            self.skipped,
            self.total()
        )?;
        if self.assets > 0 {
            write!(f, ", {} assets copied", self.assets)?;
        }
        if self.missing > 0 {
            write!(f, ", {} missing", self.missing)?;
        }
        Ok(())
    }
}
