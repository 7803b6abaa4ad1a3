//! Shared test utilities for the postpress test suite.
//!
//! [`SiteFixture`] lays out a throwaway site in a temp directory: a posts
//! directory, an index template, and a manifest that is rewritten every time
//! a post is added. Manifest entries are absolute paths, so tests don't
//! depend on the working directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new();
//! site.post("03-my-first-post.md", "- Created - 2024/01/01\n\nHello");
//! let report = build(&site.config(), &BuiltinConverter, BuildOptions::default()).unwrap();
//! assert!(site.page("2024/01/01/03-my-first-post").exists());
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{CliOverrides, ConverterBackend, DeployTarget, RunConfig, SiteConfig};

pub const TEMPLATE: &str = "<html><body><h1>Posts</h1>[[links]]</body></html>";

pub struct SiteFixture {
    tmp: TempDir,
    entries: RefCell<Vec<PathBuf>>,
}

impl SiteFixture {
    /// Empty site with an index template and an empty manifest.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("posts")).unwrap();
        fs::write(tmp.path().join("blog_template.html"), TEMPLATE).unwrap();
        let site = Self {
            tmp,
            entries: RefCell::new(Vec::new()),
        };
        site.write_manifest();
        site
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root().join("posts")
    }

    /// Write a post and add it to the manifest. Returns its path.
    ///
    /// Writing an existing post again changes its content without adding a
    /// second manifest entry.
    pub fn post(&self, name: &str, body: &str) -> PathBuf {
        let path = self.posts_dir().join(name);
        fs::write(&path, body).unwrap();
        if !self.entries.borrow().contains(&path) {
            self.manifest_entry(name);
        }
        path
    }

    /// Add a manifest entry under `posts/` without creating the file.
    pub fn manifest_entry(&self, name: &str) {
        self.entries.borrow_mut().push(self.posts_dir().join(name));
        self.write_manifest();
    }

    /// Write a file next to the posts (images, videos).
    pub fn asset(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.posts_dir().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn write_manifest(&self) {
        let mut yaml = String::from("markdown_files:\n");
        for entry in self.entries.borrow().iter() {
            yaml.push_str(&format!("  - file: {}\n", entry.display()));
        }
        if self.entries.borrow().is_empty() {
            yaml = String::from("markdown_files: []\n");
        }
        fs::write(self.root().join("md_files.yml"), yaml).unwrap();
    }

    /// Resolved run config for `example.com`, using the built-in converter.
    pub fn config(&self) -> RunConfig {
        let mut site = SiteConfig::default();
        site.converter.backend = ConverterBackend::Builtin;
        site.site.index_template = self.root().join("blog_template.html");
        let cli = CliOverrides {
            output_dir: Some(self.root().join("site")),
            domain: Some("example.com".to_string()),
            manifest: self.root().join("md_files.yml"),
            ledger: self.root().join(".checksums.txt"),
            ..Default::default()
        };
        RunConfig::resolve(site, cli).unwrap()
    }

    pub fn deploy_target(&self, cli: &str) -> DeployTarget {
        DeployTarget {
            cli: cli.to_string(),
            bucket: "s3://example.com".to_string(),
            distribution_id: "E123".to_string(),
            extensions: vec!["html".to_string()],
        }
    }

    /// Page directory under the blog tree (`2024/01/01/<slug>`).
    pub fn page(&self, rel: &str) -> PathBuf {
        self.config().target_dir.join(rel)
    }
}
