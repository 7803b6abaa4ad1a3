//! Blog index page and sitemap.
//!
//! Both are built from the published tree on disk rather than from the posts
//! rendered this run, so posts skipped as unchanged are still listed.
//!
//! Each page's date and slug are recovered from its location:
//!
//! ```text
//! <target>/2024/03/10/03-my-first-post/index.html
//!          ^^^^ ^^ ^^ ^^^^^^^^^^^^^^^^
//!          date       slug
//! ```
//!
//! Anything that doesn't have exactly that shape is still listed, but under
//! the epoch sentinel date, and an error is logged so the stray file gets
//! noticed.
//!
//! The index page is a template with a placeholder (`[[links]]` by default)
//! replaced by a `<ul>` of links, newest first. The sitemap is plain text, one
//! absolute URL per line, in the same order.

use crate::config::RunConfig;
use crate::naming;
use crate::publish::epoch_sentinel;
use crate::types::IndexEntry;
use chrono::NaiveDate;
use maud::{Markup, html};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot read index template {path}: {source}")]
    Template {
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
}

/// Why a published path couldn't be mapped back to a date and slug.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathShapeError {
    #[error("{0} is not inside the blog directory")]
    OutsideTarget(PathBuf),
    #[error("{path} has {depth} segments, expected YYYY/MM/DD/<slug>/<file>")]
    Depth { path: PathBuf, depth: usize },
    #[error("{path} does not encode a valid date")]
    Date { path: PathBuf },
}

/// Summary of an index/sitemap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub entries: Vec<IndexEntry>,
    pub index_page: PathBuf,
    pub sitemap: PathBuf,
    /// Entries whose path didn't encode a date.
    pub misfiled: usize,
}

/// Recover `(date, slug)` from a published HTML path.
pub fn parse_page_path(target: &Path, html_path: &Path) -> Result<(NaiveDate, String), PathShapeError> {
    let relative = html_path
        .strip_prefix(target)
        .map_err(|_| PathShapeError::OutsideTarget(html_path.to_path_buf()))?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    let [year, month, day, slug, _file] = segments.as_slice() else {
        return Err(PathShapeError::Depth {
            path: relative.to_path_buf(),
            depth: segments.len(),
        });
    };

    let date_err = || PathShapeError::Date {
        path: relative.to_path_buf(),
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return Err(date_err());
    }
    let y: i32 = year.parse().map_err(|_| date_err())?;
    let m: u32 = month.parse().map_err(|_| date_err())?;
    let d: u32 = day.parse().map_err(|_| date_err())?;
    let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(date_err)?;
    Ok((date, slug.clone()))
}

/// Absolute URL of a published file: `<blog_url>/<relative path>`.
fn page_url(blog_url: &str, target: &Path, html_path: &Path) -> String {
    let relative = html_path.strip_prefix(target).unwrap_or(html_path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    format!("{}/{}", blog_url.trim_end_matches('/'), parts.join("/"))
}

/// Whether a walked HTML file belongs in the index.
fn is_listed(target: &Path, path: &Path, exclusions: &[String]) -> bool {
    if path == target.join("index.html") {
        return false;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !exclusions.iter().any(|e| *e == name)
}

/// Walk `target` for published pages, newest first.
///
/// Returns the entries and the number that fell back to the sentinel date.
pub fn collect_pages(
    target: &Path,
    exclusions: &[String],
    blog_url: &str,
) -> Result<(Vec<IndexEntry>, usize), IndexError> {
    let mut entries = Vec::new();
    let mut misfiled = 0;

    if !target.exists() {
        tracing::warn!("{} does not exist yet, index will be empty", target.display());
        return Ok((entries, misfiled));
    }

    for entry in WalkDir::new(target).follow_links(false) {
        let entry = entry.map_err(|source| IndexError::Walk {
            path: target.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().is_none_or(|ext| ext != "html")
            || !is_listed(target, path, exclusions)
        {
            continue;
        }

        let (date, slug) = match parse_page_path(target, path) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!("error converting path to date: {err}");
                misfiled += 1;
                let slug = path
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                (epoch_sentinel(), slug)
            }
        };

        let label = format!("{} - {}", date.format("%Y-%m-%d"), naming::index_label(&slug));
        entries.push(IndexEntry {
            date,
            slug,
            url: page_url(blog_url, target, path),
            label,
        });
    }

    sort_entries(&mut entries);
    Ok((entries, misfiled))
}

/// Newest first; equal dates ordered by URL so output is stable across runs.
pub fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url.cmp(&b.url)));
}

/// `<ul>` of links, one per entry.
pub fn render_link_list(entries: &[IndexEntry]) -> Markup {
    html! {
        ul {
            @for entry in entries {
                li { a href=(entry.url) target="_blank" { (entry.label) } }
            }
        }
    }
}

/// Substitute the link list into the index template and write the page.
pub fn write_index(
    template_path: &Path,
    placeholder: &str,
    entries: &[IndexEntry],
    out_path: &Path,
) -> Result<(), IndexError> {
    let template = fs::read_to_string(template_path).map_err(|source| IndexError::Template {
        path: template_path.to_path_buf(),
        source,
    })?;
    if !template.contains(placeholder) {
        tracing::warn!(
            "index template {} has no {placeholder} placeholder, links will be missing",
            template_path.display()
        );
    }
    let page = template.replace(placeholder, &render_link_list(entries).into_string());
    write_file(out_path, &page)?;
    tracing::info!("index page written to {}", out_path.display());
    Ok(())
}

/// Sitemap text: one URL per line.
pub fn sitemap_text(entries: &[IndexEntry]) -> String {
    entries.iter().map(|e| format!("{}\n", e.url)).collect()
}

/// Write the plain-text sitemap.
pub fn write_sitemap(entries: &[IndexEntry], out_path: &Path) -> Result<(), IndexError> {
    write_file(out_path, &sitemap_text(entries))?;
    tracing::info!("sitemap written to {}", out_path.display());
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), IndexError> {
    let to_err = |source| IndexError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(to_err)?;
    }
    fs::write(path, content).map_err(to_err)
}

/// Build the index page and sitemap for the whole published tree.
pub fn build_index(config: &RunConfig) -> Result<IndexReport, IndexError> {
    let (entries, misfiled) =
        collect_pages(&config.target_dir, &config.exclusions, &config.blog_url())?;
    tracing::info!("{} pages found under {}", entries.len(), config.target_dir.display());

    write_index(
        &config.index_template,
        &config.placeholder,
        &entries,
        &config.index_page_path,
    )?;
    write_sitemap(&entries, &config.sitemap_path)?;

    Ok(IndexReport {
        entries,
        index_page: config.index_page_path.clone(),
        sitemap: config.sitemap_path.clone(),
        misfiled,
    })
}
