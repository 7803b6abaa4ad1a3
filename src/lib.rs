//! # postpress
//!
//! A small static blog builder. A YAML manifest lists Markdown posts; each post
//! is converted to HTML, wrapped in the site shell and filed under the date it
//! declares:
//!
//! ```text
//! md_files.yml ─┐
//! posts/*.md   ─┼─▶ site/blog/YYYY/MM/DD/<slug>/index.html (+ images, videos)
//! .checksums.txt┘   site/blog.html   (index page, newest first)
//!                   site/sitemap.txt (one URL per line)
//! ```
//!
//! Optionally the output directory is synced to object storage and the CDN
//! in front of it is invalidated.
//!
//! # Incremental Builds
//!
//! A checksum ledger (`.checksums.txt`) maps each post's path to the hash of
//! its content at the last successful build. Posts whose hash matches are
//! skipped entirely: no conversion, no asset copy, and their page directory is
//! left as it is. Changed posts get their page directory deleted and
//! rewritten, so images a post no longer references disappear with it.
//!
//! The index page and sitemap are always rebuilt from the published tree on
//! disk, so they list skipped posts too.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | One build run: ledger, per-post state machine, index, deploy |
//! | [`ledger`] | Checksum ledger load/persist and content hashing |
//! | [`manifest`] | `md_files.yml` parsing |
//! | [`render`] | Markdown converter backends and the Maud page shell |
//! | [`assets`] | Finds `<img>`/`<source>` references and copies them next to the page |
//! | [`publish`] | Creation-date extraction and the `YYYY/MM/DD/<slug>` layout |
//! | [`index`] | Index page and sitemap from the published tree |
//! | [`deploy`] | Storage sync and CDN invalidation through the cloud CLI |
//! | [`command`] | Blocking subprocess execution with captured stderr |
//! | [`config`] | `postpress.toml` loading, validation, and CLI merge |
//! | [`naming`] | Title, slug and index label derivation from filenames |
//! | [`types`] | Shapes a post takes between stages |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Dates Live in the Post
//!
//! A post declares its creation date with a list item in its body:
//!
//! ```markdown
//! - Created - 2024/03/10
//! ```
//!
//! File timestamps change on checkout and copy; the marker travels with the
//! text. Posts without one are filed under `1900/01/01` and sort last.
//!
//! ## Converter Behind a Trait
//!
//! By default posts go through an external `markdown` binary, matching what
//! the site's stylesheets were written against. The [`render::MarkdownConverter`]
//! trait also has an in-process pulldown-cmark backend, which is what the test
//! suite uses so it runs without any external tools.

pub mod assets;
pub mod command;
pub mod config;
pub mod deploy;
pub mod index;
pub mod ledger;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
