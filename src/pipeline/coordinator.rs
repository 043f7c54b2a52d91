//! Refresh coordinator - main release tracking logic
//!
//! This module runs one refresh end to end:
//! - Fetching and parsing the release notes
//! - Selecting releases at or after the baseline and inside the scope
//! - Resolving routing identifiers
//! - Checking every candidate link under a shared concurrency limit
//! - Merging the results into the catalog once all checks are done

use crate::catalog::{merge, Catalog, ReleaseResult};
use crate::config::Config;
use crate::pipeline::report::{ReleaseOutcome, ReleaseReport, RunReport};
use crate::source::{
    build_http_client, IdentifierExtractor, Release, ReleaseSection, ReleaseSource,
};
use crate::template::{DownloadTarget, UrlTemplate};
use crate::verify::{CandidateLink, LinkVerifier, VerifiedLink};
use crate::version::{ReleaseVersion, VersionScope};
use crate::{ConfigError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of a completed run: the merged catalog and what happened
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub catalog: Catalog,
    pub report: RunReport,
}

/// Main refresh coordinator structure
pub struct Coordinator {
    source: ReleaseSource,
    template: UrlTemplate,
    verifier: LinkVerifier,
    baseline: ReleaseVersion,
    semaphore: Arc<Semaphore>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LinksError)` - The HTTP client or a configured value could not be set up
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.verifier)?;
        let template = UrlTemplate::new(&config.source.download_base)?;

        let extractor = IdentifierExtractor::new(template.clone())
            .with_known_identifiers(&config.known_identifiers)?;
        let source = ReleaseSource::new(client.clone(), &config.source, extractor)?;

        let verifier = LinkVerifier::new(client).with_retry(config.verifier.retry_policy());

        let baseline = config
            .source
            .baseline_version
            .parse::<ReleaseVersion>()
            .map_err(|e| ConfigError::InvalidVersion(format!("baseline-version: {}", e)))?;

        let permits = config.verifier.max_concurrent_checks.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(permits));

        Ok(Self {
            source,
            template,
            verifier,
            baseline,
            semaphore,
        })
    }

    /// Runs one refresh against an existing catalog
    ///
    /// The existing catalog is not modified; the merged copy is returned.
    /// Failures of individual releases or checks are recorded in the report.
    /// Only an unreachable or unparseable release-notes page fails the run.
    pub async fn run(&self, existing: &Catalog, scope: &VersionScope) -> Result<RunOutcome> {
        let start_time = Instant::now();

        let notes = self.source.fetch_release_notes().await?;
        let (sections, out_of_scope) = self.select(&notes.sections, scope);
        tracing::info!(
            "Processing {} releases ({} outside baseline {} or scope {})",
            sections.len(),
            out_of_scope,
            self.baseline,
            scope
        );

        let releases = self.resolve_releases(sections).await;
        let candidates = self.build_candidates(&releases)?;
        tracing::info!("Checking {} candidate links", candidates.len());

        let mut verified = self.verify_all(candidates).await;
        verified.sort_by(|a, b| (&a.version, a.target).cmp(&(&b.version, b.target)));

        let mut results = Vec::with_capacity(releases.len());
        let mut reports = Vec::with_capacity(releases.len());
        for release in &releases {
            let links: Vec<VerifiedLink> = verified
                .iter()
                .filter(|l| l.version == release.version)
                .cloned()
                .collect();

            let report = ReleaseReport::new(release, &links);
            log_release(&report);
            reports.push(report);

            results.push(ReleaseResult {
                version: release.version.clone(),
                release_date: release.release_date,
                links,
            });
        }

        let (catalog, summary) = merge(existing, &results);

        reports.sort_by(|a, b| b.version.cmp(&a.version));
        let report = RunReport {
            releases: reports,
            out_of_scope,
            merge: summary,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Run completed in {:?}: {} verified, {} partial, {} unconfirmed, {} skipped; {} links added, {} updated",
            report.elapsed,
            report.verified(),
            report.partial(),
            report.unconfirmed(),
            report.skipped(),
            report.merge.added,
            report.merge.updated
        );

        Ok(RunOutcome { catalog, report })
    }

    /// Keeps sections at or after the baseline and inside the scope
    fn select<'a>(
        &self,
        sections: &'a [ReleaseSection],
        scope: &VersionScope,
    ) -> (Vec<&'a ReleaseSection>, usize) {
        let selected: Vec<&ReleaseSection> = sections
            .iter()
            .filter(|s| s.version >= self.baseline && scope.contains(&s.version))
            .collect();
        let out_of_scope = sections.len() - selected.len();
        (selected, out_of_scope)
    }

    /// Resolves identifiers for every selected release, in document order
    ///
    /// A release whose task fails is kept without an identifier.
    async fn resolve_releases(&self, sections: Vec<&ReleaseSection>) -> Vec<Release> {
        let mut tasks = JoinSet::new();

        for (index, section) in sections.iter().enumerate() {
            let source = self.source.clone();
            let section = (*section).clone();
            let semaphore = Arc::clone(&self.semaphore);

            tasks.spawn(async move {
                // Permit is dropped when this block exits
                let _permit = semaphore.acquire_owned().await.ok();
                (index, source.resolve(&section).await)
            });
        }

        let mut resolved = Vec::with_capacity(sections.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => resolved.push(entry),
                Err(e) => tracing::warn!("Release resolution task failed: {}", e),
            }
        }

        assemble_releases(&sections, resolved)
    }

    /// Builds one candidate per target for every release with an identifier
    fn build_candidates(&self, releases: &[Release]) -> Result<Vec<CandidateLink>> {
        let mut candidates = Vec::new();
        for release in releases {
            let Some(routing_id) = &release.routing_identifier else {
                continue;
            };
            for target in DownloadTarget::all() {
                let url = self.template.url_for(target, routing_id)?;
                candidates.push(CandidateLink {
                    version: release.version.clone(),
                    target,
                    url,
                });
            }
        }
        Ok(candidates)
    }

    /// Checks every candidate, at most `max-concurrent-checks` at a time
    ///
    /// Results come back in completion order.
    async fn verify_all(&self, candidates: Vec<CandidateLink>) -> Vec<VerifiedLink> {
        let mut tasks = JoinSet::new();

        for candidate in candidates {
            let verifier = self.verifier.clone();
            let semaphore = Arc::clone(&self.semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                verifier.verify_candidate(candidate).await
            });
        }

        let mut verified = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(link) => verified.push(link),
                Err(e) => tracing::warn!("Link check task failed: {}", e),
            }
        }
        verified
    }
}

/// Puts resolved releases back in section order
///
/// Sections with no resolved entry become releases without an identifier.
fn assemble_releases(
    sections: &[&ReleaseSection],
    resolved: Vec<(usize, Release)>,
) -> Vec<Release> {
    let mut slots: Vec<Option<Release>> = vec![None; sections.len()];
    for (index, release) in resolved {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(release);
        }
    }

    sections
        .iter()
        .zip(slots)
        .map(|(section, slot)| {
            slot.unwrap_or_else(|| Release {
                version: section.version.clone(),
                release_date: section.release_date,
                routing_identifier: None,
                identifier_source: None,
            })
        })
        .collect()
}

fn log_release(report: &ReleaseReport) {
    match report.outcome {
        ReleaseOutcome::Verified => {
            tracing::info!("{}: all {} links present", report.version, report.present)
        }
        ReleaseOutcome::Partial => tracing::info!(
            "{}: {} present, {} absent, {} indeterminate",
            report.version,
            report.present,
            report.absent,
            report.indeterminate
        ),
        ReleaseOutcome::Unconfirmed => tracing::warn!(
            "{}: no link confirmed ({} absent, {} indeterminate)",
            report.version,
            report.absent,
            report.indeterminate
        ),
        ReleaseOutcome::Skipped => {
            tracing::warn!("{}: no routing identifier found, skipped", report.version)
        }
    }
}

/// Runs a refresh with a fresh coordinator
///
/// # Example
///
/// ```no_run
/// use docker_desktop_links::catalog::Catalog;
/// use docker_desktop_links::pipeline::run_once;
/// use docker_desktop_links::{Config, VersionScope};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_once(&Config::default(), &Catalog::new(), &VersionScope::all()).await?;
/// println!("{} releases tracked", outcome.catalog.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_once(
    config: &Config,
    existing: &Catalog,
    scope: &VersionScope,
) -> Result<RunOutcome> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run(existing, scope).await
}
