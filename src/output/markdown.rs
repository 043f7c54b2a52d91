//! Markdown download listing
//!
//! This module renders the catalog as a human-readable page: one table per
//! release, newest release first.

use crate::catalog::Catalog;
use crate::output::{OutputError, OutputResult};
use crate::template::{Architecture, Os};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown listing of a catalog
///
/// # Arguments
///
/// * `catalog` - The catalog to render
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the listing
/// * `Err(OutputError)` - Failed to write the listing
pub fn generate_markdown_catalog(catalog: &Catalog, output_path: &Path) -> OutputResult<()> {
    if output_path.as_os_str().is_empty() {
        return Err(OutputError::Write("output path is empty".to_string()));
    }

    let markdown = format_markdown_catalog(catalog);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a catalog as markdown
///
/// # Arguments
///
/// * `catalog` - The catalog to render
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_catalog(catalog: &Catalog) -> String {
    let mut md = String::new();

    md.push_str("# Docker Desktop Direct Downloads\n\n");
    md.push_str(&format!(
        "{} releases, {} confirmed links.\n\n",
        catalog.len(),
        catalog.link_count()
    ));

    for (version, release) in catalog.releases().rev() {
        md.push_str(&format!("## {}\n\n", version));
        if let Some(date) = release.release_date {
            md.push_str(&format!("Released {}\n\n", date.format("%Y-%m-%d")));
        }

        md.push_str("| Platform | Architecture | Download |\n");
        md.push_str("|----------|--------------|----------|\n");
        for (target, url) in &release.links {
            md.push_str(&format!(
                "| {} | {} | [{}]({}) |\n",
                platform_name(target.os()),
                architecture_name(target.architecture()),
                target.file_kind().display_name(),
                url
            ));
        }
        md.push('\n');
    }

    md
}

fn platform_name(os: Os) -> &'static str {
    match os {
        Os::Windows => "Windows",
        Os::Mac => "macOS",
        Os::LinuxDeb => "Debian / Ubuntu",
        Os::LinuxRpm => "Fedora / RHEL",
        Os::LinuxArch => "Arch Linux",
    }
}

fn architecture_name(architecture: Architecture) -> &'static str {
    match architecture {
        Architecture::Amd64 => "x86-64",
        Architecture::Arm64 => "ARM64",
    }
}
