//! CLI output formatting for build, index and check runs.
//!
//! Output is **post-centric, not file-centric**: each manifest entry is shown
//! by its positional index and title, with the source path and what happened
//! to it as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Posts
//! 001 My first post → 2024/01/01/03-my-first-post/index.html
//!     Source: posts/03-my-first-post.md
//!     Assets: 2 copied
//! 002 Summer trip (unchanged)
//!     Source: posts/summer-trip.md
//! 003 Draft → 1900/01/01/draft/index.html
//!     Source: posts/draft.md
//!     Undated: no creation marker
//! 004 Gone (missing)
//!     Source: posts/gone.md
//!
//! Index
//!     site/blog.html (3 links)
//!     site/sitemap.txt
//!
//! Deploy (dry run)
//!     aws s3 sync site s3://example.com --exclude "*" --include "*.html"
//!     aws cloudfront create-invalidation --distribution-id E123 --paths "/*"
//!
//! Build: 2 built, 1 unchanged (4 total), 2 assets copied, 1 missing
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 My first post: unchanged
//!     Source: posts/03-my-first-post.md
//! 002 Summer trip: changed
//!     Source: posts/summer-trip.md
//! 1 changed, 1 unchanged, 0 missing
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::deploy::DeployPlan;
use crate::index::IndexReport;
use crate::naming;
use crate::pipeline::{BuildReport, CheckReport, CheckStatus, DeployStatus, DocumentOutcome};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn post_title(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = naming::page_title(&file_name);
    if title.is_empty() { file_name } else { title }
}

fn source_line(path: &Path) -> String {
    format!("{}Source: {}", indent(1), path.display())
}

/// Format the index section shared by `build` and `index`.
pub fn format_index_report(report: &IndexReport) -> Vec<String> {
    let mut lines = vec!["Index".to_string()];
    lines.push(format!(
        "{}{} ({} links)",
        indent(1),
        report.index_page.display(),
        report.entries.len()
    ));
    lines.push(format!("{}{}", indent(1), report.sitemap.display()));
    if report.misfiled > 0 {
        lines.push(format!(
            "{}{} pages outside YYYY/MM/DD/<slug>/ listed as 1900-01-01",
            indent(1),
            report.misfiled
        ));
    }
    lines
}

fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    vec![
        format!("{}{}", indent(1), plan.sync.display()),
        format!("{}{}", indent(1), plan.invalidate.display()),
    ]
}

/// Format the result of a full build.
pub fn format_build_report(report: &BuildReport, target_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.documents.is_empty() {
        lines.push("Posts".to_string());
    }
    for (i, doc) in report.documents.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), post_title(&doc.path));
        match &doc.outcome {
            DocumentOutcome::Built(page) => {
                let rel = page
                    .html_path
                    .strip_prefix(target_dir)
                    .unwrap_or(&page.html_path);
                lines.push(format!("{header} \u{2192} {}", rel.display()));
                lines.push(source_line(&doc.path));
                if page.assets_copied > 0 {
                    lines.push(format!("{}Assets: {} copied", indent(1), page.assets_copied));
                }
                if page.undated {
                    lines.push(format!("{}Undated: no creation marker", indent(1)));
                }
            }
            DocumentOutcome::Unchanged => {
                lines.push(format!("{header} (unchanged)"));
                lines.push(source_line(&doc.path));
            }
            DocumentOutcome::Missing => {
                lines.push(format!("{header} (missing)"));
                lines.push(source_line(&doc.path));
            }
        }
    }

    lines.push(String::new());
    lines.extend(format_index_report(&report.index));

    match &report.deploy {
        DeployStatus::Skipped => {}
        DeployStatus::Planned(plan) => {
            lines.push(String::new());
            lines.push("Deploy (dry run)".to_string());
            lines.extend(format_deploy_plan(plan));
        }
        DeployStatus::Completed(plan) => {
            lines.push(String::new());
            lines.push("Deploy".to_string());
            lines.extend(format_deploy_plan(plan));
        }
    }

    lines.push(String::new());
    if !report.ledger_saved {
        lines.push("Warning: checksum ledger not saved, next build rebuilds everything".to_string());
    }
    lines.push(format!("Build: {}", report.stats));

    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport, target_dir: &Path) {
    for line in format_build_report(report, target_dir) {
        println!("{}", line);
    }
}

/// Print the index section to stdout.
pub fn print_index_report(report: &IndexReport) {
    for line in format_index_report(report) {
        println!("{}", line);
    }
}

/// Format a ledger comparison.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (path, status)) in report.entries.iter().enumerate() {
        let label = match status {
            CheckStatus::Missing => "missing",
            CheckStatus::Unchanged => "unchanged",
            CheckStatus::Changed => "changed",
        };
        lines.push(format!("{} {}: {label}", format_index(i + 1), post_title(path)));
        lines.push(source_line(path));
    }
    lines.push(format!(
        "{} changed, {} unchanged, {} missing",
        report.count(CheckStatus::Changed),
        report.count(CheckStatus::Unchanged),
        report.count(CheckStatus::Missing)
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
