//! Copying images and videos referenced by a post next to its page.
//!
//! Posts reference media relative to the Markdown file, typically
//! `./images/diagram.png`. Each published page lives in its own directory,
//! so every referenced file is copied into that directory under its base
//! name and the page's `src="./images/...` references are later flattened
//! by the publisher.
//!
//! Two reference shapes are recognised:
//!
//! ```html
//! <img src="./images/diagram.png" alt="...">
//! <source src="../media/demo.mp4" type="video/mp4">
//! ```
//!
//! Absolute web URLs are left alone. A reference that cannot be copied fails
//! the build: a published page must not point at a file that isn't there.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static ASSET_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img src="(.*?)"|<source\s+src="(.*?\.mp4)"\s+type="video/mp4">"#)
        .expect("asset reference pattern is valid")
});

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("cannot copy asset {} into {}: {source}", .asset.display(), .dest_dir.display())]
    Copy {
        asset: PathBuf,
        dest_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset reference {0:?} has no file name")]
    NoFileName(String),
}

/// All image and video references in `html`, in document order.
pub fn collect_asset_refs(html: &str) -> Vec<String> {
    ASSET_REF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether a reference points at the web rather than the local tree.
pub fn is_external(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("//")
}

/// Resolve a reference against the directory of the Markdown file.
///
/// Leading `../` and `./` segments are dropped before joining:
/// `("posts", "../images/a.png")` → `posts/images/a.png`.
pub fn resolve_asset(markdown_dir: &Path, reference: &str) -> PathBuf {
    let mut rest = reference;
    loop {
        if let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else {
            break;
        }
    }
    markdown_dir.join(rest)
}

/// Copy every local asset referenced by `html` into `page_dir`.
///
/// Returns the number of files copied.
pub fn copy_assets(markdown_dir: &Path, html: &str, page_dir: &Path) -> Result<usize, AssetError> {
    let mut count = 0;
    for reference in collect_asset_refs(html) {
        if is_external(&reference) {
            tracing::debug!("skipping external asset {reference}");
            continue;
        }

        let asset = resolve_asset(markdown_dir, &reference);
        let file_name = asset
            .file_name()
            .ok_or_else(|| AssetError::NoFileName(reference.clone()))?;
        let dest = page_dir.join(file_name);

        fs::copy(&asset, &dest).map_err(|source| AssetError::Copy {
            asset: asset.clone(),
            dest_dir: page_dir.to_path_buf(),
            source,
        })?;
        tracing::info!("copied {} → {}", asset.display(), page_dir.display());
        count += 1;
    }
    Ok(count)
}
