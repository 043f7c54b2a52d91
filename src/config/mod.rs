//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All sections are optional; missing values fall back to the official Docker
//! Desktop sources.
//!
//! # Example
//!
//! ```no_run
//! use docker_desktop_links::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("links.toml")).unwrap();
//! println!("Tracking releases since {}", config.source.baseline_version);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, SourceConfig, UserAgentConfig, VerifierConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
