//! End-to-end builds over the posts in `fixtures/`.
//!
//! Every test copies the fixtures into a temp directory, writes a manifest
//! with absolute paths, and builds with the in-process converter so no
//! external tools are needed.

use postpress::config::{CliOverrides, ConverterBackend, RunConfig, SiteConfig};
use postpress::ledger::Ledger;
use postpress::pipeline::{self, BuildOptions, BuildReport, DocumentOutcome};
use postpress::render::BuiltinConverter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

const POSTS: &[&str] = &[
    "03-my-first-post.md",
    "spring-notes.md",
    "summer-trip.md",
    "untitled-draft.md",
];

struct Site {
    tmp: TempDir,
}

impl Site {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        copy_dir_recursive(&fixtures, tmp.path()).unwrap();

        let mut yaml = String::from("markdown_files:\n");
        for post in POSTS {
            yaml.push_str(&format!("  - file: {}\n", tmp.path().join("posts").join(post).display()));
        }
        fs::write(tmp.path().join("md_files.yml"), yaml).unwrap();
        Self { tmp }
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    fn post(&self, name: &str) -> PathBuf {
        self.root().join("posts").join(name)
    }

    fn config(&self) -> RunConfig {
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

    fn build(&self) -> BuildReport {
        pipeline::build(&self.config(), &BuiltinConverter, BuildOptions::default()).unwrap()
    }

    fn blog(&self, rel: &str) -> PathBuf {
        self.root().join("site/blog").join(rel)
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

fn modified(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

#[test]
fn builds_date_partitioned_tree() {
    let site = Site::new();
    let report = site.build();

    assert_eq!(report.stats.built, 4);
    assert!(site.blog("2024/01/01/03-my-first-post/index.html").exists());
    assert!(site.blog("2024/03/10/spring-notes/index.html").exists());
    assert!(site.blog("2023/06/15/summer-trip/index.html").exists());
}

#[test]
fn page_carries_title_and_shell() {
    let site = Site::new();
    site.build();

    let html = fs::read_to_string(site.blog("2024/01/01/03-my-first-post/index.html")).unwrap();
    assert!(html.contains("<title>My first post</title>"));
    assert!(html.contains(r#"href="https://example.com/css/style.css""#));
    assert!(html.contains("<li>Created - 2024/01/01</li>"));
}

#[test]
fn copies_local_assets_and_flattens_image_paths() {
    let site = Site::new();
    let report = site.build();

    let page_dir = site.blog("2024/01/01/03-my-first-post");
    assert!(page_dir.join("diagram.png").exists());
    let html = fs::read_to_string(page_dir.join("index.html")).unwrap();
    assert!(html.contains(r#"src="diagram.png""#));

    assert!(site.blog("2024/03/10/spring-notes/demo.mp4").exists());
    assert_eq!(report.stats.assets, 2);
}

#[test]
fn external_references_are_not_copied() {
    let site = Site::new();
    site.build();

    let page_dir = site.blog("2024/01/01/03-my-first-post");
    let files: Vec<String> = fs::read_dir(&page_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(!files.iter().any(|f| f.contains("badge")));
    assert_eq!(files.len(), 2);
}

#[test]
fn undated_post_lands_in_sentinel_partition() {
    let site = Site::new();
    let report = site.build();

    assert!(site.blog("1900/01/01/untitled-draft/index.html").exists());
    let draft = report
        .documents
        .iter()
        .find_map(|d| match &d.outcome {
            DocumentOutcome::Built(page) if page.slug == "untitled-draft" => Some(page),
            _ => None,
        })
        .unwrap();
    assert!(draft.undated);
}

#[test]
fn index_lists_newest_first() {
    let site = Site::new();
    let report = site.build();

    let labels: Vec<&str> = report.index.entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "2024-03-10 - Spring notes",
            "2024-01-01 - My first post",
            "2023-06-15 - Summer trip",
            "1900-01-01 - Untitled draft",
        ]
    );

    let index = fs::read_to_string(site.root().join("site/blog.html")).unwrap();
    assert!(!index.contains("[[links]]"));
    let spring = index.find("Spring notes").unwrap();
    let summer = index.find("Summer trip").unwrap();
    assert!(spring < summer);
    assert!(index.contains(
        r#"<a href="https://example.com/blog/2024/01/01/03-my-first-post/index.html" target="_blank">"#
    ));
}

#[test]
fn sitemap_matches_index_order() {
    let site = Site::new();
    site.build();

    let sitemap = fs::read_to_string(site.root().join("site/sitemap.txt")).unwrap();
    let lines: Vec<&str> = sitemap.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "https://example.com/blog/2024/03/10/spring-notes/index.html"
    );
    assert!(lines[3].contains("/1900/01/01/"));
}

#[test]
fn second_build_leaves_unchanged_pages_alone() {
    let site = Site::new();
    site.build();
    let page = site.blog("2023/06/15/summer-trip/index.html");
    let before = modified(&page);

    let report = site.build();

    assert_eq!(report.stats.built, 0);
    assert_eq!(report.stats.skipped, 4);
    assert_eq!(modified(&page), before);
    // Index is rebuilt from disk, so it still lists everything.
    assert_eq!(report.index.entries.len(), 4);
}

#[test]
fn changed_post_replaces_page_directory() {
    let site = Site::new();
    site.build();
    let page_dir = site.blog("2024/01/01/03-my-first-post");
    assert!(page_dir.join("diagram.png").exists());

    fs::write(site.root().join("posts/images/image_new.png"), b"new").unwrap();
    fs::write(
        site.post("03-my-first-post.md"),
        "- Created - 2024/01/01\n\n![new](./images/image_new.png)\n",
    )
    .unwrap();
    let report = site.build();

    assert_eq!(report.stats.built, 1);
    assert_eq!(report.stats.skipped, 3);
    assert!(page_dir.join("image_new.png").exists());
    assert!(!page_dir.join("diagram.png").exists());
}

#[test]
fn ledger_survives_round_trip() {
    let site = Site::new();
    site.build();

    let path = site.config().ledger_path;
    let ledger = Ledger::load(&path);
    assert_eq!(ledger.len(), 4);

    ledger.persist(&path).unwrap();
    let reloaded = Ledger::load(&path);
    assert_eq!(reloaded, ledger);
}

#[test]
fn check_reports_edits_without_writing() {
    let site = Site::new();
    site.build();
    fs::write(site.post("summer-trip.md"), "- Created - 2023/06/15\n\nEdited.\n").unwrap();
    let ledger_before = fs::read_to_string(site.config().ledger_path).unwrap();

    let report = pipeline::check(&site.config()).unwrap();

    assert_eq!(report.count(pipeline::CheckStatus::Changed), 1);
    assert_eq!(report.count(pipeline::CheckStatus::Unchanged), 3);
    assert_eq!(
        fs::read_to_string(site.config().ledger_path).unwrap(),
        ledger_before
    );
}

#[test]
fn dating_a_draft_moves_it_out_of_the_sentinel_partition() {
    let site = Site::new();
    site.build();
    let sentinel = site.blog("1900/01/01/untitled-draft");
    assert!(sentinel.join("index.html").exists());

    fs::write(
        site.post("untitled-draft.md"),
        "- Created - 2024/05/01\n\nFinally dated.\n",
    )
    .unwrap();
    let report = site.build();

    assert_eq!(report.stats.built, 1);
    assert!(site.blog("2024/05/01/untitled-draft/index.html").exists());
    assert!(!sentinel.exists());

    let drafts: Vec<&str> = report
        .index
        .entries
        .iter()
        .map(|e| e.label.as_str())
        .filter(|label| label.ends_with("Untitled draft"))
        .collect();
    assert_eq!(drafts, vec!["2024-05-01 - Untitled draft"]);

    let sitemap = fs::read_to_string(site.root().join("site/sitemap.txt")).unwrap();
    assert_eq!(sitemap.lines().count(), 4);
    assert!(!sitemap.contains("/1900/01/01/"));
}
