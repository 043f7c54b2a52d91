//! Refresh pipeline
//!
//! This module orchestrates a refresh:
//! 1. Load the existing catalog (a corrupt catalog stops here)
//! 2. Discover releases and resolve their identifiers
//! 3. Check every candidate link with bounded concurrency
//! 4. Merge the results and write the catalog back

mod coordinator;
mod report;

pub use coordinator::{run_once, Coordinator, RunOutcome};
pub use report::{ReleaseOutcome, ReleaseReport, RunReport};

use crate::catalog::{catalog_fingerprint, load_catalog, save_catalog};
use crate::config::Config;
use crate::version::VersionScope;
use crate::Result;
use std::future::Future;
use std::io;
use std::path::PathBuf;

/// Options of one `refresh` invocation
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Catalog file read at the start and written at the end
    pub catalog_path: PathBuf,

    /// Versions the run is limited to
    pub scope: VersionScope,

    /// Run every check but leave the catalog file untouched
    pub dry_run: bool,
}

/// Runs a complete refresh operation
///
/// This is the main entry point for updating the catalog. It will:
/// 1. Load the catalog from `options.catalog_path`
/// 2. Fetch the release notes and resolve identifiers
/// 3. Verify candidate links
/// 4. Merge and, unless this is a dry run, save the catalog
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `options` - Catalog location, scope and dry-run flag
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed; per-release failures are in the report
/// * `Err(LinksError)` - The catalog, configuration or release notes were unusable
pub async fn run_refresh(config: &Config, options: &RefreshOptions) -> Result<RunReport> {
    let existing = load_catalog(&options.catalog_path)?;
    let before = catalog_fingerprint(&existing)?;

    let outcome = run_once(config, &existing, &options.scope).await?;
    let after = catalog_fingerprint(&outcome.catalog)?;

    if options.dry_run {
        tracing::info!(
            "Dry run: catalog {} not written ({})",
            options.catalog_path.display(),
            if before == after { "unchanged" } else { "would change" }
        );
    } else if before == after && options.catalog_path.exists() {
        tracing::info!("Catalog unchanged, fingerprint {}", &after[..12]);
    } else {
        save_catalog(&options.catalog_path, &outcome.catalog)?;
        tracing::info!("Catalog fingerprint {}", &after[..12]);
    }

    Ok(outcome.report)
}

/// Drives `refresh` to completion unless `interrupt` fires first
///
/// Returns `None` when interrupted; the refresh future is dropped with every
/// in-flight task. An interrupt source that fails (for instance a signal
/// handler that cannot be installed) is ignored and the refresh runs on.
pub async fn run_until_interrupted<T>(
    refresh: impl Future<Output = T>,
    interrupt: impl Future<Output = io::Result<()>>,
) -> Option<T> {
    tokio::select! {
        result = refresh => Some(result),
        Ok(()) = interrupt => None,
    }
}
