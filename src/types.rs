//! Shared types passed between pipeline stages.
//!
//! A post moves through three shapes during a build:
//! [`SourceDocument`] (read from the manifest) → [`RenderedPage`] (in memory)
//! → [`PublishedPage`] (on disk). The index stage works from [`IndexEntry`]
//! values recovered from the published tree, not from these in-memory types,
//! so unchanged posts from earlier runs are listed too.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// A Markdown post named in the manifest, with its current content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path exactly as written in the manifest. Also the ledger key.
    pub path: PathBuf,
    /// Hex content hash computed this run.
    pub hash: String,
}

impl SourceDocument {
    /// Directory containing the post; asset references resolve against it.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Filename of the post (`03-my-first-post.md`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Ledger key for this document.
    pub fn key(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// A complete HTML document for one post, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
}

/// A post written to `target/YYYY/MM/DD/<slug>/index.html`.
#[derive(Debug, Clone)]
pub struct PublishedPage {
    /// Creation date the page is filed under.
    pub date: NaiveDate,
    /// True when the page had no creation marker and fell back to the sentinel.
    pub undated: bool,
    pub slug: String,
    /// The page directory (`.../YYYY/MM/DD/<slug>`).
    pub dir: PathBuf,
    /// The written `index.html`.
    pub html_path: PathBuf,
    /// Number of image/video files copied next to the page.
    pub assets_copied: usize,
}

/// One line of the blog index and sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub date: NaiveDate,
    pub slug: String,
    /// Absolute URL of the published page.
    pub url: String,
    /// Link text: `YYYY-MM-DD - Label`.
    pub label: String,
}
