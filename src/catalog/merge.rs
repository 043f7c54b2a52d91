//! Merging verified links into the catalog
//!
//! The merge is a pure function of the existing catalog and this run's
//! results. Only present links are written; absent or indeterminate checks
//! never remove or overwrite what an earlier run confirmed, and releases this
//! run did not look at are carried forward unchanged.

use crate::catalog::Catalog;
use crate::verify::VerifiedLink;
use crate::version::ReleaseVersion;
use chrono::NaiveDate;

/// Everything one run learned about a single release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResult {
    pub version: ReleaseVersion,
    pub release_date: Option<NaiveDate>,
    pub links: Vec<VerifiedLink>,
}

/// Counts of what a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Releases that entered the catalog
    pub new_releases: usize,
    /// Links that were not in the catalog before
    pub added: usize,
    /// Links whose URL changed
    pub updated: usize,
    /// Present links already recorded with the same URL
    pub unchanged: usize,
    /// Releases whose release date was filled in or corrected
    pub dates_updated: usize,
}

impl MergeSummary {
    /// Whether the merge altered the catalog at all
    pub fn has_changes(&self) -> bool {
        self.new_releases + self.added + self.updated + self.dates_updated > 0
    }
}

/// Merges one run's results into a copy of the catalog
///
/// # Arguments
///
/// * `existing` - The catalog as loaded at the start of the run
/// * `results` - Per-release verification results
///
/// # Returns
///
/// The merged catalog and a summary of the changes
pub fn merge(existing: &Catalog, results: &[ReleaseResult]) -> (Catalog, MergeSummary) {
    let mut catalog = existing.clone();
    let mut summary = MergeSummary::default();

    for result in results {
        let present: Vec<&VerifiedLink> = result
            .links
            .iter()
            .filter(|link| link.version == result.version && link.outcome.is_present())
            .collect();

        // A release enters the catalog with its first confirmed link
        if present.is_empty() && !catalog.contains(&result.version) {
            continue;
        }

        if !catalog.contains(&result.version) {
            summary.new_releases += 1;
        }
        let entry = catalog.entry_mut(result.version.clone());

        if let Some(date) = result.release_date {
            if entry.release_date != Some(date) {
                entry.release_date = Some(date);
                summary.dates_updated += 1;
            }
        }

        for link in present {
            let url = link.url.to_string();
            match entry.links.insert(link.target, url.clone()) {
                None => summary.added += 1,
                Some(previous) if previous == url => summary.unchanged += 1,
                Some(_) => summary.updated += 1,
            }
        }
    }

    (catalog, summary)
}
