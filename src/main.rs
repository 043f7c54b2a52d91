//! docker-desktop-links main entry point
//!
//! This is the command-line interface for the Docker Desktop direct-link tracker.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use docker_desktop_links::catalog::load_catalog;
use docker_desktop_links::config::{load_config_with_hash, Config};
use docker_desktop_links::output::{
    compute_statistics, generate_markdown_catalog, print_run_report, print_statistics,
};
use docker_desktop_links::pipeline::{run_refresh, run_until_interrupted, RefreshOptions};
use docker_desktop_links::{ReleaseVersion, VersionScope};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code of a run interrupted with Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// docker-desktop-links: direct download links for every Docker Desktop release
///
/// Reads the official release notes, derives the installer URL of every
/// platform for every release, checks that each one exists and keeps the
/// confirmed links in a YAML catalog.
#[derive(Parser, Debug)]
#[command(name = "docker-desktop-links")]
#[command(version)]
#[command(about = "Tracks direct download links for Docker Desktop releases", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover releases, verify their links and update the catalog
    Refresh(RefreshArgs),

    /// Show statistics of the catalog
    Show(CatalogArgs),

    /// Render the catalog as a markdown download listing
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct RefreshArgs {
    /// Only process this version
    #[arg(long, value_name = "VERSION", conflicts_with_all = ["from", "to"])]
    version: Option<ReleaseVersion>,

    /// Only process versions at or after this one
    #[arg(long, value_name = "VERSION")]
    from: Option<ReleaseVersion>,

    /// Only process versions at or before this one
    #[arg(long, value_name = "VERSION")]
    to: Option<ReleaseVersion>,

    /// Verify links without writing the catalog
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Catalog file (overrides output.catalog-path)
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Markdown file to write (overrides output.summary-path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl CatalogArgs {
    fn path(&self, config: &Config) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.catalog_path))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Refresh(args) => handle_refresh(&config, args).await,
        Command::Show(args) => {
            handle_show(&config, &args)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Export(args) => {
            handle_export(&config, &args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docker_desktop_links=info,warn"),
            1 => EnvFilter::new("docker_desktop_links=debug,info"),
            2 => EnvFilter::new("docker_desktop_links=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the refresh command
///
/// Ctrl-C aborts every in-flight check; nothing is merged or written.
async fn handle_refresh(config: &Config, args: RefreshArgs) -> anyhow::Result<ExitCode> {
    let scope = match args.version {
        Some(version) => VersionScope::single(version),
        None => VersionScope::range(args.from, args.to),
    };
    if let (Some(from), Some(to)) = (&scope.from, &scope.to) {
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
    }

    let options = RefreshOptions {
        catalog_path: args.catalog.path(config),
        scope,
        dry_run: args.dry_run,
    };
    tracing::info!(
        "Refreshing {} for {}{}",
        options.catalog_path.display(),
        options.scope,
        if options.dry_run { " (dry run)" } else { "" }
    );

    let interrupt = async {
        let signal = tokio::signal::ctrl_c().await;
        if let Err(e) = &signal {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        }
        signal
    };

    match run_until_interrupted(run_refresh(config, &options), interrupt).await {
        Some(result) => {
            let report = result.context("Refresh failed")?;
            print_run_report(&report, options.dry_run);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            tracing::warn!("Interrupted, catalog left untouched");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

/// Handles the show command: prints catalog statistics
fn handle_show(config: &Config, args: &CatalogArgs) -> anyhow::Result<()> {
    let path = args.path(config);
    println!("Catalog: {}\n", path.display());

    let catalog = load_catalog(&path)?;
    print_statistics(&compute_statistics(&catalog));

    Ok(())
}

/// Handles the export command: writes the markdown listing
fn handle_export(config: &Config, args: &ExportArgs) -> anyhow::Result<()> {
    let path = args.catalog.path(config);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.summary_path));

    let catalog = load_catalog(&path)?;

    tracing::info!("Generating markdown listing...");
    generate_markdown_catalog(&catalog, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✓ Listing of {} releases exported to: {}", catalog.len(), output.display());

    Ok(())
}
