//! Output module for catalog listings and run reports
//!
//! This module handles:
//! - Printing run reports after a refresh
//! - Computing and printing catalog statistics
//! - Rendering the catalog as a markdown download listing

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_catalog, generate_markdown_catalog};
pub use stats::{compute_statistics, print_run_report, print_statistics, CatalogStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
