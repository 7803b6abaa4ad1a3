//! Writing rendered posts into the date-partitioned blog tree.
//!
//! ## Output Structure
//!
//! ```text
//! <output_dir>/blog/
//! ├── 2024/
//! │   └── 03/
//! │       └── 10/
//! │           └── 03-my-first-post/
//! │               ├── index.html
//! │               └── diagram.png      # copied asset
//! └── 1900/01/01/                      # posts without a creation marker
//!     └── untitled-draft/
//!         └── index.html
//! ```
//!
//! The creation date comes from a marker the post carries in its body,
//! rendered as `<li>Created - 2024/03/10</li>`. Posts without one are filed
//! under the epoch sentinel `1900/01/01`, which sorts them after every dated
//! post in the index.
//!
//! A page directory belongs entirely to one post: it is deleted and recreated
//! whenever the post is rebuilt, so assets the post no longer references do
//! not linger. A slug has exactly one directory in the tree; when a post's
//! date changes (typically a draft gaining its creation marker), the copy
//! under the old date is removed too.

use crate::assets::{self, AssetError};
use crate::naming;
use crate::types::{PublishedPage, RenderedPage, SourceDocument};
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

static CREATED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<li>Created - (\d{4}/\d{2}/\d{2})</li>").expect("created marker pattern is valid")
});

/// Rewritten to `src="` so images resolve next to the page's `index.html`.
const NESTED_IMAGE_SRC: &str = r#"src="./images/"#;

/// Name of the HTML file inside each page directory.
pub const PAGE_FILENAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("cannot prepare page directory {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot scan {path} for earlier copies: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Date assigned to posts that carry no creation marker.
pub fn epoch_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid date")
}

/// Find the `<li>Created - YYYY/MM/DD</li>` marker in rendered HTML.
///
/// Returns `None` when there is no marker or the marker is not a real
/// calendar date (`2024/02/30`).
pub fn extract_creation_date(html: &str) -> Option<NaiveDate> {
    let raw = CREATED_MARKER.captures(html)?.get(1)?.as_str();
    match NaiveDate::parse_from_str(raw, "%Y/%m/%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!("ignoring creation marker {raw:?}: {err}");
            None
        }
    }
}

/// `<target>/YYYY/MM/DD/<slug>`.
pub fn page_dir(target: &Path, date: NaiveDate, slug: &str) -> PathBuf {
    target
        .join(date.format("%Y").to_string())
        .join(date.format("%m").to_string())
        .join(date.format("%d").to_string())
        .join(slug)
}

/// Point `./images/` references at the page directory, where assets are copied.
pub fn flatten_image_paths(html: &str) -> String {
    html.replace(NESTED_IMAGE_SRC, r#"src=""#)
}

/// Publish one rendered post under `target`.
///
/// Replaces any previous version of the page directory, copies referenced
/// assets, then writes `index.html`.
pub fn publish(
    page: &RenderedPage,
    source: &SourceDocument,
    target: &Path,
) -> Result<PublishedPage, PublishError> {
    let found = extract_creation_date(&page.html);
    let undated = found.is_none();
    let date = found.unwrap_or_else(epoch_sentinel);
    if undated {
        tracing::warn!(
            "{} has no creation marker, filing under {}",
            source.path.display(),
            date.format("%Y/%m/%d")
        );
    }

    let slug = naming::slug(&source.file_name());
    let dir = page_dir(target, date, &slug);
    remove_stale_pages(target, &slug, &dir)?;
    recreate_dir(&dir)?;

    let assets_copied = assets::copy_assets(source.dir(), &page.html, &dir)?;

    let html_path = dir.join(PAGE_FILENAME);
    fs::write(&html_path, flatten_image_paths(&page.html)).map_err(|err| {
        PublishError::Write {
            path: html_path.clone(),
            source: err,
        }
    })?;

    Ok(PublishedPage {
        date,
        undated,
        slug,
        dir,
        html_path,
        assets_copied,
    })
}

/// Delete every `<target>/*/*/*/<slug>` directory other than `keep`.
///
/// Returns the number of directories removed.
fn remove_stale_pages(target: &Path, slug: &str, keep: &Path) -> Result<usize, PublishError> {
    if !target.is_dir() {
        return Ok(0);
    }
    let mut stale = Vec::new();
    for entry in WalkDir::new(target).min_depth(4).max_depth(4) {
        let entry = entry.map_err(|source| PublishError::Walk {
            path: target.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() && entry.file_name() == slug && entry.path() != keep {
            stale.push(entry.into_path());
        }
    }
    for old in &stale {
        tracing::info!("removing earlier copy of {slug} at {}", old.display());
        fs::remove_dir_all(old).map_err(|source| PublishError::Dir {
            path: old.clone(),
            source,
        })?;
    }
    Ok(stale.len())
}

/// Delete `dir` if it exists, then create it (and any missing parents).
fn recreate_dir(dir: &Path) -> Result<(), PublishError> {
    let to_err = |source| PublishError::Dir {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(to_err)?;
    }
    fs::create_dir_all(dir).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn page(html: &str) -> RenderedPage {
        RenderedPage {
            title: "T".to_string(),
            html: html.to_string(),
        }
    }

    fn doc(path: PathBuf) -> SourceDocument {
        SourceDocument {
            path,
            hash: "h".to_string(),
        }
    }

    #[test]
    fn extracts_marker_date() {
        let html = "<ul>\n<li>Created - 2024/03/10</li>\n</ul>";
        assert_eq!(extract_creation_date(html), Some(date(2024, 3, 10)));
    }

    #[test]
    fn first_marker_wins() {
        let html = "<li>Created - 2021/01/01</li><li>Created - 2022/02/02</li>";
        assert_eq!(extract_creation_date(html), Some(date(2021, 1, 1)));
    }

    #[test]
    fn missing_marker_is_none() {
        assert_eq!(extract_creation_date("<p>no date</p>"), None);
    }

    #[test]
    fn impossible_marker_date_is_none() {
        assert_eq!(extract_creation_date("<li>Created - 2024/02/30</li>"), None);
    }

    #[test]
    fn page_dir_is_date_partitioned() {
        assert_eq!(
            page_dir(Path::new("site/blog"), date(2024, 3, 5), "my-post"),
            PathBuf::from("site/blog/2024/03/05/my-post")
        );
    }

    #[test]
    fn flatten_rewrites_only_dot_images() {
        let html = r#"<img src="./images/a.png"><img src="images/b.png">"#;
        assert_eq!(
            flatten_image_paths(html),
            r#"<img src="a.png"><img src="images/b.png">"#
        );
    }

    #[test]
    fn publish_writes_dated_page() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        let src = doc(tmp.path().join("03-my-first-post.md"));

        let published = publish(&page("<li>Created - 2024/01/01</li>"), &src, &target).unwrap();

        assert_eq!(published.date, date(2024, 1, 1));
        assert!(!published.undated);
        assert_eq!(published.slug, "03-my-first-post");
        assert_eq!(
            published.html_path,
            target.join("2024/01/01/03-my-first-post/index.html")
        );
        assert!(published.html_path.exists());
    }

    #[test]
    fn publish_without_marker_uses_sentinel_partition() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        let src = doc(tmp.path().join("draft.md"));

        let published = publish(&page("<p>undated</p>"), &src, &target).unwrap();

        assert!(published.undated);
        assert_eq!(published.date, epoch_sentinel());
        assert!(target.join("1900/01/01/draft/index.html").exists());
    }

    #[test]
    fn publish_replaces_previous_directory() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        let md_dir = tmp.path().join("posts");
        fs::create_dir_all(md_dir.join("images")).unwrap();
        fs::write(md_dir.join("images/image_new.png"), "new").unwrap();
        let src = doc(md_dir.join("post.md"));

        let old_dir = target.join("2024/01/01/post");
        fs::create_dir_all(&old_dir).unwrap();
        fs::write(old_dir.join("image_old.png"), "old").unwrap();

        let html = r#"<li>Created - 2024/01/01</li><img src="./images/image_new.png">"#;
        let published = publish(&page(html), &src, &target).unwrap();

        assert_eq!(published.assets_copied, 1);
        assert!(!old_dir.join("image_old.png").exists());
        assert!(old_dir.join("image_new.png").exists());
        let written = fs::read_to_string(old_dir.join(PAGE_FILENAME)).unwrap();
        assert!(written.contains(r#"<img src="image_new.png">"#));
    }

    #[test]
    fn publish_moves_page_when_date_changes() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        let src = doc(tmp.path().join("draft.md"));

        publish(&page("<p>undated</p>"), &src, &target).unwrap();
        let old_dir = target.join("1900/01/01/draft");
        assert!(old_dir.exists());

        let moved = publish(&page("<li>Created - 2024/05/01</li>"), &src, &target).unwrap();

        assert_eq!(moved.dir, target.join("2024/05/01/draft"));
        assert!(moved.html_path.exists());
        assert!(!old_dir.exists());
    }

    #[test]
    fn stale_sweep_leaves_other_slugs_alone() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        fs::create_dir_all(target.join("2023/01/01/other")).unwrap();
        fs::create_dir_all(target.join("2023/01/01/draft")).unwrap();
        let keep = target.join("2024/05/01/draft");

        let removed = remove_stale_pages(&target, "draft", &keep).unwrap();

        assert_eq!(removed, 1);
        assert!(target.join("2023/01/01/other").exists());
        assert!(!target.join("2023/01/01/draft").exists());
    }

    #[test]
    fn stale_sweep_on_missing_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("blog");
        assert_eq!(remove_stale_pages(&target, "x", &target.join("x")).unwrap(), 0);
    }

    #[test]
    fn publish_fails_on_missing_asset() {
        let tmp = TempDir::new().unwrap();
        let src = doc(tmp.path().join("post.md"));
        let err = publish(&page(r#"<img src="./images/gone.png">"#), &src, tmp.path()).unwrap_err();
        assert!(matches!(err, PublishError::Asset(AssetError::Copy { .. })));
    }
}
