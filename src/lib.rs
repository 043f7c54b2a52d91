//! Docker Desktop direct-link tracker
//!
//! This crate discovers Docker Desktop releases from the official release notes,
//! derives the direct download URL of every installer for every release, checks
//! that each URL actually resolves and keeps the confirmed links in a catalog
//! file that only ever grows.

pub mod catalog;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod template;
pub mod verify;
pub mod version;

use thiserror::Error;

/// Main error type for link tracking operations
#[derive(Debug, Error)]
pub enum LinksError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Release notes unreachable at {url}: {message}")]
    SourceUnreachable { url: String, message: String },

    #[error("Release notes at {url} could not be parsed: {message}")]
    SourceParse { url: String, message: String },

    #[error("Catalog file {path} is corrupt: {message}")]
    CatalogCorrupt { path: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] template::TemplateError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Catalog serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid version in config: {0}")]
    InvalidVersion(String),
}

/// Result type alias for link tracking operations
pub type Result<T> = std::result::Result<T, LinksError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::Config;
pub use template::{build_url, Architecture, DownloadTarget, FileKind, Os, RoutingId, UrlTemplate};
pub use verify::Verification;
pub use version::{ReleaseVersion, VersionScope};
