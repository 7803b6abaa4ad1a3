//! Markdown rendering: converter backends and the page shell.
//!
//! The [`MarkdownConverter`] trait turns one Markdown file into an HTML
//! fragment. Two implementations exist:
//!
//! | Backend | How |
//! |---|---|
//! | [`ExternalConverter`] | spawns `markdown --extension-set GitHubFlavored <file>` (configurable) |
//! | [`BuiltinConverter`] | in-process `pulldown-cmark` with GitHub-flavored extensions |
//!
//! [`render_page`] wraps the fragment in the site shell: a head block with
//! stylesheets, scripts and navigation, and a tail block with the
//! table-of-contents container and footer. The fragment is inserted
//! verbatim; its structure is not validated.

use crate::command::{self, CommandError};
use crate::config::{ConverterBackend, ConverterConfig, NavLink, RunConfig};
use crate::naming;
use crate::types::RenderedPage;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Markdown conversion failed for {path}: {source}")]
    Command {
        path: PathBuf,
        #[source]
        source: CommandError,
    },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for Markdown-to-HTML converters.
pub trait MarkdownConverter {
    /// Convert the Markdown file at `source` into an HTML fragment.
    fn convert(&self, source: &Path) -> Result<String, RenderError>;
}

/// Runs an external converter once per file and reads its stdout.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    pub program: String,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
}

impl ExternalConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for ExternalConverter {
    fn default() -> Self {
        let config = ConverterConfig::default();
        Self::new(config.command, config.args)
    }
}

impl MarkdownConverter for ExternalConverter {
    fn convert(&self, source: &Path) -> Result<String, RenderError> {
        let mut args: Vec<&OsStr> = self.args.iter().map(OsStr::new).collect();
        args.push(source.as_os_str());

        let output = command::run(None, &self.program, &args).map_err(|source_err| {
            RenderError::Command {
                path: source.to_path_buf(),
                source: source_err,
            }
        })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Converts in-process with pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConverter;

impl BuiltinConverter {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
    }

    /// Convert Markdown text (no file involved).
    pub fn convert_str(markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Self::options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        md_html::push_html(&mut out, parser);
        out
    }
}

impl MarkdownConverter for BuiltinConverter {
    fn convert(&self, source: &Path) -> Result<String, RenderError> {
        let markdown = fs::read_to_string(source).map_err(|err| RenderError::Io {
            path: source.to_path_buf(),
            source: err,
        })?;
        Ok(Self::convert_str(&markdown))
    }
}

/// Build the converter selected in config.
pub fn converter_from_config(config: &ConverterConfig) -> Box<dyn MarkdownConverter> {
    match config.backend {
        ConverterBackend::External => Box::new(ExternalConverter::new(
            config.command.clone(),
            config.args.clone(),
        )),
        ConverterBackend::Builtin => Box::new(BuiltinConverter),
    }
}

/// Site-wide values every page shell needs.
#[derive(Debug, Clone)]
pub struct PageShell {
    /// Scheme + domain (+ port), no trailing slash.
    pub base_url: String,
    /// Logo text in the navigation bar.
    pub site_name: String,
    /// `keywords` meta tag content; omitted when empty.
    pub keywords: String,
    /// Index page filename, target of the "Blog" nav entry.
    pub index_page: String,
    /// Extra navigation links.
    pub nav: Vec<NavLink>,
}

impl PageShell {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            site_name: config.site_name.clone(),
            keywords: config.keywords.clone(),
            index_page: config.index_page.clone(),
            nav: config.nav.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Render one post into a complete HTML document.
///
/// The title comes from the filename (see [`naming::page_title`]); asset and
/// navigation URLs are rooted at the shell's base URL.
pub fn render_page(
    converter: &dyn MarkdownConverter,
    source: &Path,
    shell: &PageShell,
) -> Result<RenderedPage, RenderError> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = naming::page_title(&file_name);
    let body = converter.convert(source)?;
    let html = page_document(shell, &title, &body).into_string();
    Ok(RenderedPage { title, html })
}

/// The full page: head block, converter output, tail block.
fn page_document(shell: &PageShell, title: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            (page_head(shell, title))
            body {
                (site_nav(shell))
                section {
                    div class="content-section" {
                        div class="container-1" {
                            (PreEscaped(body))
                        }
                        // Filled in client-side by app.js
                        div class="container-2" {
                            aside {
                                div id="toc-container" {}
                            }
                        }
                    }
                }
                (site_footer())
                script src=(shell.url("js/app.js")) {}
            }
        }
    }
}

fn page_head(shell: &PageShell, title: &str) -> Markup {
    html! {
        head {
            meta charset="UTF-8";
            meta name="viewport" content="width=device-width, initial-scale=1.0";
            meta name="description" content=(title);
            @if !shell.keywords.is_empty() {
                meta name="keywords" content=(shell.keywords);
            }
            link rel="shortcut icon" type="image/png" href=(shell.url("images/logo.png"));
            title { (title) }
            link rel="stylesheet" href=(shell.url("css/prism.css"));
            link rel="stylesheet" href=(shell.url("css/style.css"));
            link rel="stylesheet" media="screen and (max-width: 1024px)" href=(shell.url("css/mobile.css"));
            script src=(shell.url("js/prism.js")) {}
        }
    }
}

fn site_nav(shell: &PageShell) -> Markup {
    html! {
        nav id="main-nav" {
            div class="container" {
                div class="logo" { (shell.site_name) }
                ul {
                    li { a href="#" { "Home" } }
                    li { a class="current" href=(shell.url(&shell.index_page)) { "Blog" } }
                    li { a href=(shell.url("about.html")) { "About" } }
                    @for link in &shell.nav {
                        li { a href=(link.url) target="_blank" { (link.label) } }
                    }
                }
            }
        }
    }
}

fn site_footer() -> Markup {
    html! {
        footer id="main-footer" {
            div class="container" {
                div class="footer-container" {
                    div { "Generated using postpress" }
                }
            }
        }
    }
}
