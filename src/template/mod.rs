//! Download URL templating
//!
//! Docker Desktop installers live at deterministic URLs:
//!
//! ```text
//! {base}/{os}/main/{arch}/{routing-id}/{file}
//! ```
//!
//! This module builds those URLs and recognises them inside release-notes
//! markup. Nothing here touches the network.

mod target;

pub use target::{Architecture, DownloadTarget, FileKind, Os, RoutingId};

use regex::Regex;
use thiserror::Error;
use url::Url;

/// Default scheme and host of the download CDN
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://desktop.docker.com";

/// Release channel segment of every download URL
pub const CHANNEL: &str = "main";

/// Errors raised while building download URLs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid combination: {os} is not published for {architecture}")]
    InvalidCombination { os: Os, architecture: Architecture },

    #[error("invalid combination: {os} is not published as {file_kind}")]
    FileKindMismatch { os: Os, file_kind: FileKind },

    #[error("unknown download target: {0}")]
    UnknownTarget(String),

    #[error("routing identifier {0:?} is not a valid path segment")]
    InvalidIdentifier(String),

    #[error("invalid download base {base}: {message}")]
    InvalidBase { base: String, message: String },
}

/// Builds and recognises download URLs
///
/// URLs are always built under the configured base. Recognition accepts both
/// that base and the official CDN, which upstream notes link regardless of
/// any mirror.
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    base: String,
    pattern: Regex,
}

impl UrlTemplate {
    /// Creates a template rooted at `base` (scheme, host and optional path prefix)
    pub fn new(base: &str) -> Result<Self, TemplateError> {
        let parsed = Url::parse(base).map_err(|e| TemplateError::InvalidBase {
            base: base.to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TemplateError::InvalidBase {
                base: base.to_string(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let base = parsed.as_str().trim_end_matches('/').to_string();

        // os/channel/arch, then the routing identifier, then the file.
        // Either scheme is accepted.
        let pattern = format!(
            r"https?://(?:{})/(?:[A-Za-z0-9_.-]+/){{3}}([A-Za-z0-9_-]+)/",
            recognised_hosts(&base)
        );
        let pattern = Regex::new(&pattern).map_err(|e| TemplateError::InvalidBase {
            base: base.clone(),
            message: e.to_string(),
        })?;

        Ok(Self { base, pattern })
    }

    /// Creates a template for the official download CDN
    pub fn official() -> Result<Self, TemplateError> {
        Self::new(DEFAULT_DOWNLOAD_BASE)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Builds the download URL for an explicit (os, architecture, file) triple
    ///
    /// Fails with [`TemplateError::InvalidCombination`] when the pair is not
    /// published and [`TemplateError::FileKindMismatch`] when `file_kind` does
    /// not belong to `os`.
    pub fn build_url(
        &self,
        os: Os,
        architecture: Architecture,
        routing_id: &RoutingId,
        file_kind: FileKind,
    ) -> Result<Url, TemplateError> {
        let target = DownloadTarget::new(os, architecture)?;
        if target.file_kind() != file_kind {
            return Err(TemplateError::FileKindMismatch { os, file_kind });
        }
        self.url_for(target, routing_id)
    }

    /// Builds the download URL of `target` for one release
    pub fn url_for(
        &self,
        target: DownloadTarget,
        routing_id: &RoutingId,
    ) -> Result<Url, TemplateError> {
        let raw = format!(
            "{}/{}/{}/{}/{}/{}",
            self.base,
            target.os().path_segment(),
            CHANNEL,
            target.architecture(),
            routing_id,
            target.file_kind().file_name()
        );

        Url::parse(&raw).map_err(|e| TemplateError::InvalidBase {
            base: self.base.clone(),
            message: e.to_string(),
        })
    }

    /// Returns the routing identifiers of every template-shaped URL in `text`,
    /// in document order
    pub fn find_identifiers<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = RoutingId> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| RoutingId::new(m.as_str()).ok())
    }

    /// Returns the routing identifier of the first template-shaped URL in `text`
    pub fn find_identifier(&self, text: &str) -> Option<RoutingId> {
        self.find_identifiers(text).next()
    }
}

/// Regex alternation of the configured base and the official CDN, without scheme
fn recognised_hosts(base: &str) -> String {
    let strip = |url: &str| -> String {
        url.split_once("://")
            .map_or(url, |(_, rest)| rest)
            .to_string()
    };

    let configured = strip(base);
    let official = strip(DEFAULT_DOWNLOAD_BASE);
    if configured == official {
        regex::escape(&configured)
    } else {
        format!("{}|{}", regex::escape(&configured), regex::escape(&official))
    }
}

/// Builds an official download URL
///
/// # Examples
///
/// ```
/// use docker_desktop_links::{build_url, Architecture, FileKind, Os, RoutingId};
///
/// let id = RoutingId::new("67817").unwrap();
/// let url = build_url(Os::Mac, Architecture::Amd64, &id, FileKind::DiskImage).unwrap();
/// assert_eq!(url.as_str(), "https://desktop.docker.com/mac/main/amd64/67817/Docker.dmg");
///
/// assert!(build_url(Os::LinuxDeb, Architecture::Arm64, &id, FileKind::DebPackage).is_err());
/// ```
pub fn build_url(
    os: Os,
    architecture: Architecture,
    routing_id: &RoutingId,
    file_kind: FileKind,
) -> Result<Url, TemplateError> {
    UrlTemplate::official()?.build_url(os, architecture, routing_id, file_kind)
}
