use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::template::DEFAULT_DOWNLOAD_BASE;
use crate::verify::RetryPolicy;

/// Main configuration structure
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) describes the official Docker Desktop sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Routing identifiers supplied by hand, keyed by version
    ///
    /// Used only when a release is listed upstream but none of the extraction
    /// strategies find its identifier.
    #[serde(default, rename = "known-identifiers")]
    pub known_identifiers: BTreeMap<String, String>,
}

/// Where releases are discovered and where installers are downloaded from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Release-notes page listing every version
    #[serde(rename = "release-notes-url")]
    pub release_notes_url: String,

    /// Per-version page tried when the release notes carry no download link
    ///
    /// `{version}` expands to `4.37.2`, `{anchor}` to `4372`.
    #[serde(rename = "subpage-pattern")]
    pub subpage_pattern: String,

    /// Earliest version tracked; older releases are never processed
    #[serde(rename = "baseline-version")]
    pub baseline_version: String,

    /// Scheme and host (plus optional path prefix) of the download CDN
    #[serde(rename = "download-base")]
    pub download_base: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            release_notes_url: "https://docs.docker.com/desktop/release-notes/".to_string(),
            subpage_pattern: "https://docs.docker.com/desktop/release-notes/{version}/"
                .to_string(),
            baseline_version: "4.0.0".to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
        }
    }
}

/// Link verification behavior
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Total time allowed for one request (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Time allowed to establish a connection (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of link checks in flight at once
    #[serde(rename = "max-concurrent-checks")]
    pub max_concurrent_checks: u32,

    /// Attempts per link, counting the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause between attempts on the same link (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            connect_timeout_ms: 5_000,
            max_concurrent_checks: 8,
            max_attempts: 2,
            retry_delay_ms: 1_000,
        }
    }
}

impl VerifierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the tool
    pub name: String,

    /// Version of the tool
    pub version: String,

    /// URL with information about the tool
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/docker-desktop-links/docker-desktop-links"
                .to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the YAML catalog of confirmed links
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,

    /// Path to the markdown rendering of the catalog
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: "DockerDesktop.yaml".to_string(),
            summary_path: "DOWNLOADS.md".to_string(),
        }
    }
}
