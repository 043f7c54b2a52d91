//! The persisted catalog of confirmed download links
//!
//! The catalog maps each release version to its confirmed links. It is the
//! only durable state: loaded once at the start of a run, merged in memory and
//! written back once at the end.
//!
//! ```yaml
//! 4.0.0:
//!   release-date: 2021-08-31
//!   links:
//!     mac/amd64: https://desktop.docker.com/mac/main/amd64/67817/Docker.dmg
//! ```

mod merge;
mod store;

pub use merge::{merge, MergeSummary, ReleaseResult};
pub use store::{catalog_fingerprint, load_catalog, render_catalog, save_catalog};

use crate::template::DownloadTarget;
use crate::version::ReleaseVersion;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confirmed links of every tracked release, ordered by version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    releases: BTreeMap<ReleaseVersion, CatalogRelease>,
}

/// Catalog entry for one release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRelease {
    #[serde(
        rename = "release-date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<NaiveDate>,

    /// Confirmed download URL per target
    #[serde(default)]
    pub links: BTreeMap<DownloadTarget, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of releases
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Total number of confirmed links across all releases
    pub fn link_count(&self) -> usize {
        self.releases.values().map(|r| r.links.len()).sum()
    }

    pub fn get(&self, version: &ReleaseVersion) -> Option<&CatalogRelease> {
        self.releases.get(version)
    }

    pub fn contains(&self, version: &ReleaseVersion) -> bool {
        self.releases.contains_key(version)
    }

    /// Looks up the confirmed link of one release and target
    pub fn link(&self, version: &ReleaseVersion, target: DownloadTarget) -> Option<&str> {
        self.releases
            .get(version)
            .and_then(|r| r.links.get(&target))
            .map(String::as_str)
    }

    /// Releases in ascending version order
    pub fn releases(&self) -> impl DoubleEndedIterator<Item = (&ReleaseVersion, &CatalogRelease)> {
        self.releases.iter()
    }

    /// The highest version in the catalog
    pub fn latest(&self) -> Option<&ReleaseVersion> {
        self.releases.keys().next_back()
    }

    pub(crate) fn entry_mut(&mut self, version: ReleaseVersion) -> &mut CatalogRelease {
        self.releases.entry(version).or_default()
    }
}

impl FromIterator<(ReleaseVersion, CatalogRelease)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (ReleaseVersion, CatalogRelease)>>(iter: I) -> Self {
        Self {
            releases: iter.into_iter().collect(),
        }
    }
}
