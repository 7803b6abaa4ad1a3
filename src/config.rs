//! Site configuration module.
//!
//! Two layers feed a build:
//!
//! 1. [`SiteConfig`]: the optional `postpress.toml` next to the manifest.
//!    Holds everything that rarely changes between runs (layout names,
//!    exclusions, converter command, deploy settings).
//! 2. Command-line flags ([`CliOverrides`]): output directory, domain, port
//!    and distribution id. Flags win over the file.
//!
//! [`RunConfig::resolve`] merges both into the one explicit structure that
//! every pipeline component receives. Nothing reads configuration from
//! globals.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # domain = "example.com"      # may also come from --domain
//! # output_dir = "site"         # may also come from --output-dir
//! # port = 8000                 # localhost default
//!
//! [site]
//! name = "Blog"                 # logo text in the nav bar
//! keywords = ""                 # <meta name="keywords">, omitted when empty
//! nav = []                      # extra links: [{ label = "GitHub", url = "https://..." }]
//! blog_dir = "blog"             # posts go to <output_dir>/blog/YYYY/MM/DD/<slug>/
//! index_page = "blog.html"
//! index_template = "blog_template.html"
//! placeholder = "[[links]]"
//! sitemap = "sitemap.txt"
//! exclusions = ["policy.html", "index_template.html", "graph_viz.html"]
//!
//! [converter]
//! backend = "external"          # or "builtin"
//! command = "markdown"
//! args = ["--extension-set", "GitHubFlavored"]
//!
//! [deploy]
//! cli = "aws"
//! # bucket = "s3://example.com" # defaults to s3://<domain>
//! # distribution_id = "E123"    # deploy runs only when set
//! extensions = ["html", "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "mp4", "txt", "xml", "json"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config filename, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "postpress.toml";

/// Port used for `localhost` domains when none is given.
pub const LOCALHOST_PORT: u16 = 8000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Settings loaded from `postpress.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site domain (`example.com`, `localhost`).
    pub domain: Option<String>,
    /// Directory receiving the index page, sitemap and blog tree.
    pub output_dir: Option<PathBuf>,
    /// Port appended to the base URL.
    pub port: Option<u16>,
    /// Output layout and index settings.
    pub site: LayoutConfig,
    /// Markdown converter selection.
    pub converter: ConverterConfig,
    /// Storage sync and CDN invalidation.
    pub deploy: DeployConfig,
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let blog_dir = Path::new(&self.site.blog_dir);
        if self.site.blog_dir.is_empty() || blog_dir.is_absolute() {
            return Err(ConfigError::Validation(
                "site.blog_dir must be a non-empty relative path".into(),
            ));
        }
        if self.site.placeholder.is_empty() {
            return Err(ConfigError::Validation(
                "site.placeholder must not be empty".into(),
            ));
        }
        if self.site.index_page.is_empty() || self.site.sitemap.is_empty() {
            return Err(ConfigError::Validation(
                "site.index_page and site.sitemap must not be empty".into(),
            ));
        }
        if self.converter.backend == ConverterBackend::External
            && self.converter.command.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "converter.command must not be empty for the external backend".into(),
            ));
        }
        if self.deploy.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "deploy.extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .deploy
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.contains(['/', '*', '.']))
        {
            return Err(ConfigError::Validation(format!(
                "deploy.extensions entries must be bare extensions, got {ext:?}"
            )));
        }
        Ok(())
    }
}

/// Where things land inside the output directory, and how pages look.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Logo text shown in the navigation bar.
    pub name: String,
    /// Content of the `keywords` meta tag. Omitted when empty.
    pub keywords: String,
    /// Extra navigation links after Home, Blog and About.
    pub nav: Vec<NavLink>,
    /// Subdirectory holding the date-partitioned posts.
    pub blog_dir: String,
    /// Filename of the generated index page.
    pub index_page: String,
    /// Template the index page is produced from.
    pub index_template: PathBuf,
    /// Token in the template replaced by the link list.
    pub placeholder: String,
    /// Filename of the plain-text sitemap.
    pub sitemap: String,
    /// HTML filenames never listed in the index or sitemap.
    pub exclusions: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            name: "Blog".to_string(),
            keywords: String::new(),
            nav: Vec::new(),
            blog_dir: "blog".to_string(),
            index_page: "blog.html".to_string(),
            index_template: PathBuf::from("blog_template.html"),
            placeholder: "[[links]]".to_string(),
            sitemap: "sitemap.txt".to_string(),
            exclusions: vec![
                "policy.html".to_string(),
                "index_template.html".to_string(),
                "graph_viz.html".to_string(),
            ],
        }
    }
}

/// A navigation bar entry. External links open in a new tab.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    pub label: String,
    pub url: String,
}

/// Which Markdown converter renders post bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterBackend {
    /// Spawn `command args... <file>` and read its stdout.
    #[default]
    External,
    /// Convert in-process with pulldown-cmark.
    Builtin,
}

/// Markdown converter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub backend: ConverterBackend,
    /// Program to run for the external backend.
    pub command: String,
    /// Arguments placed before the Markdown file path.
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            backend: ConverterBackend::External,
            command: "markdown".to_string(),
            args: vec!["--extension-set".to_string(), "GitHubFlavored".to_string()],
        }
    }
}

/// Deploy settings. Deploy runs only when a distribution id is known.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Cloud CLI used for both the sync and the invalidation.
    pub cli: String,
    /// Sync destination. Defaults to `s3://<domain>`.
    pub bucket: Option<String>,
    /// CDN distribution to invalidate.
    pub distribution_id: Option<String>,
    /// File extensions included in the sync; everything else is excluded.
    pub extensions: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            cli: "aws".to_string(),
            bucket: None,
            distribution_id: None,
            extensions: [
                "html", "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "mp4", "txt",
                "xml", "json",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Load `postpress.toml` from `path`.
///
/// A missing file yields the stock defaults. A file that exists but fails to
/// parse or validate is an error.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        let config = SiteConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub domain: Option<String>,
    pub port: Option<u16>,
    pub distribution_id: Option<String>,
    pub manifest: PathBuf,
    pub ledger: PathBuf,
}

/// Resolved deploy target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub cli: String,
    pub bucket: String,
    pub distribution_id: String,
    pub extensions: Vec<String>,
}

/// Everything a run needs, resolved once at startup and passed explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the published site (index page, sitemap, blog tree).
    pub output_dir: PathBuf,
    /// `<output_dir>/<blog_dir>`, holding `YYYY/MM/DD/<slug>/` directories.
    pub target_dir: PathBuf,
    pub blog_dir: String,
    pub domain: String,
    /// Scheme + domain (+ port), no trailing slash.
    pub base_url: String,
    pub manifest_path: PathBuf,
    pub ledger_path: PathBuf,
    pub index_template: PathBuf,
    /// Index page filename, linked from every page's navigation.
    pub index_page: String,
    pub index_page_path: PathBuf,
    pub placeholder: String,
    pub sitemap_path: PathBuf,
    pub exclusions: Vec<String>,
    pub site_name: String,
    pub keywords: String,
    pub nav: Vec<NavLink>,
    pub converter: ConverterConfig,
    /// Present only when a distribution id was configured.
    pub deploy: Option<DeployTarget>,
}

impl RunConfig {
    /// Merge CLI flags over the site config.
    ///
    /// Fails before any work starts when the output directory or the domain
    /// is missing from both sources.
    pub fn resolve(site: SiteConfig, cli: CliOverrides) -> Result<Self, ConfigError> {
        let output_dir = cli
            .output_dir
            .or(site.output_dir)
            .ok_or(ConfigError::Missing("output directory (--output-dir)"))?;
        let domain = cli
            .domain
            .or(site.domain)
            .filter(|d| !d.trim().is_empty())
            .ok_or(ConfigError::Missing("domain (--domain)"))?;
        let port = cli.port.or(site.port);
        let base_url = base_url(&domain, port);

        let deploy = cli
            .distribution_id
            .or(site.deploy.distribution_id)
            .map(|distribution_id| DeployTarget {
                cli: site.deploy.cli.clone(),
                bucket: site
                    .deploy
                    .bucket
                    .clone()
                    .unwrap_or_else(|| format!("s3://{domain}")),
                distribution_id,
                extensions: site.deploy.extensions.clone(),
            });

        let layout = site.site;
        Ok(Self {
            target_dir: output_dir.join(&layout.blog_dir),
            index_page_path: output_dir.join(&layout.index_page),
            sitemap_path: output_dir.join(&layout.sitemap),
            output_dir,
            blog_dir: layout.blog_dir,
            domain,
            base_url,
            manifest_path: cli.manifest,
            ledger_path: cli.ledger,
            index_template: layout.index_template,
            index_page: layout.index_page,
            placeholder: layout.placeholder,
            exclusions: layout.exclusions,
            site_name: layout.name,
            keywords: layout.keywords,
            nav: layout.nav,
            converter: site.converter,
            deploy,
        })
    }

    /// URL prefix of the blog tree (`https://example.com/blog`).
    pub fn blog_url(&self) -> String {
        format!("{}/{}", self.base_url, self.blog_dir.trim_matches('/'))
    }
}

/// Build the site base URL from a domain and optional port.
///
/// - `"example.com", None` → `"https://example.com"`
/// - `"example.com", Some(8443)` → `"https://example.com:8443"`
/// - `"localhost", None` → `"http://localhost:8000"`
/// - `"localhost", Some(3000)` → `"http://localhost:3000"`
pub fn base_url(domain: &str, port: Option<u16>) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.contains("localhost") {
        format!("http://{domain}:{}", port.unwrap_or(LOCALHOST_PORT))
    } else {
        match port {
            Some(p) => format!("https://{domain}:{p}"),
            None => format!("https://{domain}"),
        }
    }
}

/// Returns a fully-commented stock `postpress.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# postpress configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--domain, --output-dir, --port, --distribution-id)
# override the matching keys here.
# Unknown keys will cause an error.

# Site domain. Domains containing "localhost" are served over http on port 8000.
# domain = "example.com"

# Directory receiving the index page, sitemap and blog tree.
# output_dir = "site"

# Port appended to the base URL.
# port = 8000

# ---------------------------------------------------------------------------
# Output layout
# ---------------------------------------------------------------------------
[site]
# Logo text shown in the navigation bar.
name = "Blog"

# Content of the <meta name="keywords"> tag. Omitted when empty.
keywords = ""

# Extra navigation links, shown after Home, Blog and About.
nav = []
# nav = [{ label = "GitHub", url = "https://github.com/you" }]

# Posts are published to <output_dir>/<blog_dir>/YYYY/MM/DD/<slug>/index.html
blog_dir = "blog"

# Index page written to <output_dir>/<index_page> from the template below.
index_page = "blog.html"
index_template = "blog_template.html"

# Token in the template replaced by the generated list of links.
placeholder = "[[links]]"

# Plain-text sitemap, one absolute URL per line.
sitemap = "sitemap.txt"

# HTML filenames never listed in the index or sitemap.
exclusions = ["policy.html", "index_template.html", "graph_viz.html"]

# ---------------------------------------------------------------------------
# Markdown converter
# ---------------------------------------------------------------------------
[converter]
# "external" runs the command below once per changed post.
# "builtin" converts in-process (GitHub-flavored tables, task lists, etc).
backend = "external"
command = "markdown"
args = ["--extension-set", "GitHubFlavored"]

# ---------------------------------------------------------------------------
# Deploy (runs only when a distribution id is set)
# ---------------------------------------------------------------------------
[deploy]
cli = "aws"
# Sync destination. Defaults to s3://<domain>.
# bucket = "s3://example.com"
# distribution_id = "E2EXAMPLE"
extensions = ["html", "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "mp4", "txt", "xml", "json"]
"##
}
