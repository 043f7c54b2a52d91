//! Catalog persistence
//!
//! The catalog is a YAML file. Keys are emitted in sorted order, so the same
//! logical content always renders to the same bytes. Writes go to a temporary
//! sibling file that is then renamed over the catalog.

use crate::catalog::Catalog;
use crate::{LinksError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Loads the catalog at `path`
///
/// # Returns
///
/// * `Ok(Catalog)` - The parsed catalog; empty when the file does not exist
/// * `Err(LinksError::CatalogCorrupt)` - The file exists but cannot be read
///   or parsed
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No catalog at {}, starting empty", path.display());
            return Ok(Catalog::new());
        }
        Err(e) => return Err(corrupt(path, e.to_string())),
    };

    if content.trim().is_empty() {
        return Ok(Catalog::new());
    }

    let catalog: Catalog =
        serde_yaml::from_str(&content).map_err(|e| corrupt(path, e.to_string()))?;

    tracing::debug!(
        "Loaded catalog from {}: {} releases, {} links",
        path.display(),
        catalog.len(),
        catalog.link_count()
    );
    Ok(catalog)
}

/// Renders the catalog as YAML
pub fn render_catalog(catalog: &Catalog) -> Result<String> {
    Ok(serde_yaml::to_string(catalog)?)
}

/// Writes the catalog atomically
///
/// A crash leaves either the previous file or the new one, never a partial
/// write.
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let rendered = render_catalog(catalog)?;
    let temp_path = temp_path_for(path);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(rendered.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::info!(
        "Wrote catalog to {}: {} releases, {} links",
        path.display(),
        catalog.len(),
        catalog.link_count()
    );
    Ok(())
}

/// SHA-256 of the rendered catalog, hex encoded
pub fn catalog_fingerprint(catalog: &Catalog) -> Result<String> {
    let rendered = render_catalog(catalog)?;
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

fn corrupt(path: &Path, message: String) -> LinksError {
    LinksError::CatalogCorrupt {
        path: path.display().to_string(),
        message,
    }
}
