//! Run reporting
//!
//! Every completed run accounts for each release it looked at, whether or not
//! anything ended up in the catalog.

use crate::catalog::MergeSummary;
use crate::source::{IdentifierSource, Release};
use crate::template::{DownloadTarget, RoutingId};
use crate::verify::{Verification, VerifiedLink};
use crate::version::ReleaseVersion;
use std::fmt;
use std::time::Duration;

/// What a run established about one release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseOutcome {
    /// Every target's link is present
    Verified,
    /// At least one link is present, not all
    Partial,
    /// An identifier was found but no link was confirmed
    Unconfirmed,
    /// No identifier could be found, nothing was checked
    Skipped,
}

impl ReleaseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseOutcome::Verified => "verified",
            ReleaseOutcome::Partial => "partial",
            ReleaseOutcome::Unconfirmed => "unconfirmed",
            ReleaseOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ReleaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-release line of a run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub version: ReleaseVersion,
    pub outcome: ReleaseOutcome,
    pub routing_identifier: Option<RoutingId>,
    pub identifier_source: Option<IdentifierSource>,
    pub present: usize,
    pub absent: usize,
    pub indeterminate: usize,
    /// Reasons of indeterminate checks, per target
    pub problems: Vec<(DownloadTarget, String)>,
}

impl ReleaseReport {
    /// Builds the report line of a release from its check results
    pub fn new(release: &Release, links: &[VerifiedLink]) -> Self {
        let mut report = Self {
            version: release.version.clone(),
            outcome: ReleaseOutcome::Skipped,
            routing_identifier: release.routing_identifier.clone(),
            identifier_source: release.identifier_source,
            present: 0,
            absent: 0,
            indeterminate: 0,
            problems: Vec::new(),
        };

        if release.routing_identifier.is_none() {
            return report;
        }

        for link in links.iter().filter(|l| l.version == release.version) {
            match &link.outcome {
                Verification::Present => report.present += 1,
                Verification::Absent => report.absent += 1,
                Verification::Indeterminate(reason) => {
                    report.indeterminate += 1;
                    report.problems.push((link.target, reason.clone()));
                }
            }
        }

        report.outcome = if report.present == DownloadTarget::ALL.len() {
            ReleaseOutcome::Verified
        } else if report.present > 0 {
            ReleaseOutcome::Partial
        } else {
            ReleaseOutcome::Unconfirmed
        };
        report
    }
}

/// Summary of one refresh run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Release lines, newest first
    pub releases: Vec<ReleaseReport>,
    /// Releases listed upstream but older than the baseline or outside the scope
    pub out_of_scope: usize,
    pub merge: MergeSummary,
    pub elapsed: Duration,
}

impl RunReport {
    fn count(&self, outcome: ReleaseOutcome) -> usize {
        self.releases.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn verified(&self) -> usize {
        self.count(ReleaseOutcome::Verified)
    }

    pub fn partial(&self) -> usize {
        self.count(ReleaseOutcome::Partial)
    }

    pub fn unconfirmed(&self) -> usize {
        self.count(ReleaseOutcome::Unconfirmed)
    }

    pub fn skipped(&self) -> usize {
        self.count(ReleaseOutcome::Skipped)
    }

    /// Number of link checks performed
    pub fn checks(&self) -> usize {
        self.releases
            .iter()
            .map(|r| r.present + r.absent + r.indeterminate)
            .sum()
    }

    pub fn release(&self, version: &ReleaseVersion) -> Option<&ReleaseReport> {
        self.releases.iter().find(|r| &r.version == version)
    }
}
