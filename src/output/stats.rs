//! Statistics and run reports
//!
//! This module provides functionality for summarizing the catalog and the
//! outcome of a refresh on stdout.

use crate::catalog::Catalog;
use crate::pipeline::{ReleaseOutcome, RunReport};
use crate::template::DownloadTarget;
use crate::version::ReleaseVersion;
use std::collections::BTreeMap;

/// Catalog statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Number of releases in the catalog
    pub releases: usize,

    /// Total number of confirmed links
    pub links: usize,

    /// Releases with a confirmed link, per target
    pub links_by_target: BTreeMap<DownloadTarget, usize>,

    /// Releases with a link for every target
    pub complete_releases: usize,

    /// Releases whose date is unknown
    pub releases_without_date: usize,

    pub earliest: Option<ReleaseVersion>,
    pub latest: Option<ReleaseVersion>,
}

/// Computes statistics over a catalog
pub fn compute_statistics(catalog: &Catalog) -> CatalogStatistics {
    let mut stats = CatalogStatistics {
        releases: catalog.len(),
        links: catalog.link_count(),
        earliest: catalog.releases().next().map(|(v, _)| v.clone()),
        latest: catalog.latest().cloned(),
        ..CatalogStatistics::default()
    };

    for target in DownloadTarget::all() {
        stats.links_by_target.insert(target, 0);
    }

    for (_, release) in catalog.releases() {
        for target in release.links.keys() {
            *stats.links_by_target.entry(*target).or_insert(0) += 1;
        }
        if release.links.len() == DownloadTarget::ALL.len() {
            stats.complete_releases += 1;
        }
        if release.release_date.is_none() {
            stats.releases_without_date += 1;
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Releases: {}", stats.releases);
    println!("  Confirmed links: {}", stats.links);
    if let (Some(earliest), Some(latest)) = (&stats.earliest, &stats.latest) {
        println!("  Versions: {} to {}", earliest, latest);
    }
    println!(
        "  Complete releases: {} ({} without a release date)",
        stats.complete_releases, stats.releases_without_date
    );
    println!();

    println!("Coverage by Target:");
    for (target, count) in &stats.links_by_target {
        let percentage = if stats.releases > 0 {
            (*count as f64 / stats.releases as f64) * 100.0
        } else {
            0.0
        };
        println!("  {:<16} {:>4} ({:.1}%)", target.to_string(), count, percentage);
    }
}

/// Prints the outcome of a refresh to stdout
///
/// Releases that were not fully verified are listed one per line.
pub fn print_run_report(report: &RunReport, dry_run: bool) {
    println!("=== Refresh Report ===\n");

    println!("Releases:");
    println!("  Verified: {}", report.verified());
    println!("  Partial: {}", report.partial());
    println!("  Unconfirmed: {}", report.unconfirmed());
    println!("  Skipped: {}", report.skipped());
    println!("  Outside baseline or scope: {}", report.out_of_scope);
    println!();

    println!("Catalog{}:", if dry_run { " (dry run, not written)" } else { "" });
    println!("  New releases: {}", report.merge.new_releases);
    println!("  Links added: {}", report.merge.added);
    println!("  Links updated: {}", report.merge.updated);
    println!("  Links unchanged: {}", report.merge.unchanged);
    println!();

    let attention: Vec<_> = report
        .releases
        .iter()
        .filter(|r| r.outcome != ReleaseOutcome::Verified)
        .collect();
    if !attention.is_empty() {
        println!("Needs Attention:");
        for release in attention {
            match release.outcome {
                ReleaseOutcome::Skipped => {
                    println!("  {} {}: no routing identifier", release.version, release.outcome)
                }
                _ => println!(
                    "  {} {}: {} present, {} absent, {} indeterminate",
                    release.version,
                    release.outcome,
                    release.present,
                    release.absent,
                    release.indeterminate
                ),
            }
            for (target, reason) in &release.problems {
                println!("    {}: {}", target, reason);
            }
        }
        println!();
    }

    println!(
        "Checked {} links in {:.1}s",
        report.checks(),
        report.elapsed.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRelease;
    use crate::template::{Architecture, Os};

    #[test]
    fn test_statistics() {
        let mut complete = CatalogRelease::default();
        for target in DownloadTarget::all() {
            complete
                .links
                .insert(target, format!("https://desktop.docker.com/{}", target));
        }
        let mut partial = CatalogRelease {
            release_date: chrono::NaiveDate::from_ymd_opt(2021, 9, 30),
            ..CatalogRelease::default()
        };
        partial.links.insert(
            DownloadTarget::new(Os::Mac, Architecture::Arm64).unwrap(),
            "https://desktop.docker.com/mac/main/arm64/69386/Docker.dmg".to_string(),
        );

        let catalog: Catalog = [
            (ReleaseVersion::new(4, 0, 0), complete),
            (ReleaseVersion::new(4, 1, 0), partial),
        ]
        .into_iter()
        .collect();

        let stats = compute_statistics(&catalog);
        assert_eq!(stats.releases, 2);
        assert_eq!(stats.links, 8);
        assert_eq!(stats.complete_releases, 1);
        assert_eq!(stats.releases_without_date, 1);
        assert_eq!(stats.earliest, Some(ReleaseVersion::new(4, 0, 0)));
        assert_eq!(stats.latest, Some(ReleaseVersion::new(4, 1, 0)));
        assert_eq!(
            stats.links_by_target[&DownloadTarget::new(Os::Mac, Architecture::Arm64).unwrap()],
            2
        );
        assert_eq!(
            stats.links_by_target[&DownloadTarget::new(Os::LinuxRpm, Architecture::Amd64).unwrap()],
            1
        );
    }

    #[test]
    fn test_empty_catalog_statistics() {
        let stats = compute_statistics(&Catalog::new());
        assert_eq!(stats.releases, 0);
        assert_eq!(stats.links_by_target.len(), 7);
        assert!(stats.latest.is_none());
    }
}
