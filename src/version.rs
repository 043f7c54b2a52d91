//! Release version handling
//!
//! Docker Desktop versions are plain `MAJOR.MINOR.PATCH` strings. They are used
//! as catalog keys, so ordering must follow release chronology rather than
//! string order (`4.10.0` comes after `4.9.0`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)]
static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d+\.\d+\.\d+)(?:$|[^\d.]|\.(?:\D|$))")
        .expect("version token regex is valid")
});

/// Error returned when a string is not a release version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a release version: {reason}")]
pub struct VersionError {
    pub input: String,
    pub reason: String,
}

/// A Docker Desktop release version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion(semver::Version);

impl ReleaseVersion {
    /// Creates a version from its numeric components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Finds the first `X.Y.Z` version token in free text
    ///
    /// Release-notes headings are not guaranteed to contain only the version
    /// (e.g. "Docker Desktop 4.37.2"), so callers search rather than parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use docker_desktop_links::ReleaseVersion;
    ///
    /// let version = ReleaseVersion::find_in("Docker Desktop 4.37.2 (hotfix)").unwrap();
    /// assert_eq!(version.to_string(), "4.37.2");
    /// assert!(ReleaseVersion::find_in("Known issues").is_none());
    /// ```
    pub fn find_in(text: &str) -> Option<Self> {
        VERSION_TOKEN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// The version without dots, as used in release-notes anchors (`4.37.2` -> `4372`)
    pub fn anchor(&self) -> String {
        format!("{}{}{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        semver::Version::parse(trimmed)
            .map(Self)
            .map_err(|e| VersionError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReleaseVersion> for String {
    fn from(value: ReleaseVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Inclusive range of versions a refresh is limited to
///
/// An unbounded scope (the default) covers every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionScope {
    pub from: Option<ReleaseVersion>,
    pub to: Option<ReleaseVersion>,
}

impl VersionScope {
    /// Scope covering every version
    pub fn all() -> Self {
        Self::default()
    }

    /// Scope covering exactly one version
    pub fn single(version: ReleaseVersion) -> Self {
        Self {
            from: Some(version.clone()),
            to: Some(version),
        }
    }

    /// Scope covering `from..=to`, either bound optional
    pub fn range(from: Option<ReleaseVersion>, to: Option<ReleaseVersion>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, version: &ReleaseVersion) -> bool {
        self.from.as_ref().map_or(true, |from| version >= from)
            && self.to.as_ref().map_or(true, |to| version <= to)
    }
}

impl fmt::Display for VersionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.from, &self.to) {
            (None, None) => write!(f, "all versions"),
            (Some(from), Some(to)) if from == to => write!(f, "{}", from),
            (Some(from), Some(to)) => write!(f, "{}..={}", from, to),
            (Some(from), None) => write!(f, ">= {}", from),
            (None, Some(to)) => write!(f, "<= {}", to),
        }
    }
}
