use clap::{Parser, Subcommand};
use postpress::config::{self, CliOverrides, ConfigError, RunConfig};
use postpress::manifest::MANIFEST_FILENAME;
use postpress::pipeline::{self, BuildOptions};
use postpress::{output, render};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "postpress")]
#[command(about = "Incremental static blog builder")]
#[command(long_about = "\
Incremental static blog builder

Markdown posts listed in a YAML manifest become HTML pages filed by the date
they declare, plus an index page and a sitemap. Unchanged posts are skipped
using a checksum ledger.

Layout:

  md_files.yml                     # markdown_files: [{ file: posts/a.md }, ...]
  .checksums.txt                   # ledger: <path>~<hash> per line
  blog_template.html               # index template containing [[links]]
  postpress.toml                   # optional settings
  posts/
  ├── 03-my-first-post.md          # contains `- Created - 2024/03/10`
  └── images/diagram.png           # referenced as ./images/diagram.png

Output:

  <output-dir>/
  ├── blog.html                    # index page, newest first
  ├── sitemap.txt
  └── blog/2024/03/10/03-my-first-post/
      ├── index.html
      └── diagram.png

Run 'postpress gen-config' to generate a documented postpress.toml.")]
#[command(version)]
struct Cli {
    /// Root directory for the index page, sitemap and blog tree
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Site domain (example.com, localhost)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Port appended to the site URL
    #[arg(long, global = true)]
    port: Option<u16>,

    /// CDN distribution to invalidate after syncing; enables deploy
    #[arg(long, global = true)]
    distribution_id: Option<String>,

    /// YAML list of posts to build
    #[arg(long, default_value = MANIFEST_FILENAME, global = true)]
    manifest: PathBuf,

    /// Checksum ledger for incremental builds
    #[arg(long, default_value = ".checksums.txt", global = true)]
    ledger: PathBuf,

    /// Site config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build changed posts, then the index page and sitemap; deploy if configured
    Build {
        /// Rebuild every post regardless of the ledger
        #[arg(long)]
        force: bool,
        /// Print the deploy commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },
    /// Rebuild only the index page and sitemap
    Index,
    /// Report which posts would be rebuilt, without writing anything
    Check,
    /// Print a stock postpress.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Build { force, dry_run } => {
            let run_config = resolve_config(&cli)?;
            println!(
                "==> Building {} \u{2192} {}",
                run_config.manifest_path.display(),
                run_config.target_dir.display()
            );
            let converter = render::converter_from_config(&run_config.converter);
            let options = BuildOptions {
                force: *force,
                deploy: true,
                dry_run: *dry_run,
            };
            let report = pipeline::build(&run_config, converter.as_ref(), options)?;
            output::print_build_report(&report, &run_config.target_dir);
        }
        Command::Index => {
            let run_config = resolve_config(&cli)?;
            println!("==> Indexing {}", run_config.target_dir.display());
            let report = pipeline::rebuild_index(&run_config)?;
            output::print_index_report(&report);
        }
        Command::Check => {
            let run_config = resolve_config(&cli)?;
            println!(
                "==> Checking {} against {}",
                run_config.manifest_path.display(),
                run_config.ledger_path.display()
            );
            let report = pipeline::check(&run_config)?;
            output::print_check_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `postpress.toml` and merge the command-line flags over it.
fn resolve_config(cli: &Cli) -> Result<RunConfig, ConfigError> {
    let site = config::load_config(&cli.config)?;
    let overrides = CliOverrides {
        output_dir: cli.output_dir.clone(),
        domain: cli.domain.clone(),
        port: cli.port,
        distribution_id: cli.distribution_id.clone(),
        manifest: cli.manifest.clone(),
        ledger: cli.ledger.clone(),
    };
    RunConfig::resolve(site, overrides)
}
