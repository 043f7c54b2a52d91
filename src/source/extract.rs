//! Routing identifier extraction
//!
//! A release's identifier is recovered from the first template-shaped download
//! URL found by an ordered list of strategies. Strategies over the release-notes
//! section are plain functions; the sub-page and hand-supplied fallbacks need
//! I/O or configuration and are driven by [`crate::source::ReleaseSource`].

use crate::source::parser::{parse_page, ReleaseSection};
use crate::template::{RoutingId, UrlTemplate};
use crate::version::ReleaseVersion;
use crate::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error returned when no strategy yields an identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no routing identifier found for {0}")]
    NotFound(ReleaseVersion),
}

/// Where an identifier was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierSource {
    /// A download link inside the release-notes section
    SectionLinks,
    /// A download URL written as text in the release-notes section
    SectionText,
    /// A download URL on the per-version sub-page
    SubPage,
    /// The `known-identifiers` configuration table
    Known,
}

impl IdentifierSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierSource::SectionLinks => "section-links",
            IdentifierSource::SectionText => "section-text",
            IdentifierSource::SubPage => "sub-page",
            IdentifierSource::Known => "known-identifiers",
        }
    }
}

impl fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy over one release-notes section
pub type SectionStrategy = fn(&UrlTemplate, &ReleaseSection) -> Vec<RoutingId>;

/// Section strategies in the order they are tried
pub const SECTION_STRATEGIES: [(IdentifierSource, SectionStrategy); 2] = [
    (IdentifierSource::SectionLinks, from_section_links),
    (IdentifierSource::SectionText, from_section_text),
];

/// Identifiers of template-shaped `<a href>` targets, in document order
fn from_section_links(template: &UrlTemplate, section: &ReleaseSection) -> Vec<RoutingId> {
    section
        .links
        .iter()
        .filter_map(|link| template.find_identifier(link))
        .collect()
}

/// Identifiers of template-shaped URLs anywhere in the section
fn from_section_text(template: &UrlTemplate, section: &ReleaseSection) -> Vec<RoutingId> {
    let mut found: Vec<RoutingId> = template.find_identifiers(&section.markup).collect();
    found.extend(template.find_identifiers(&section.text));
    found
}

/// Picks the first identifier, noting any disagreement
fn first_in_document_order(
    version: &ReleaseVersion,
    source: IdentifierSource,
    candidates: Vec<RoutingId>,
) -> Option<RoutingId> {
    let mut candidates = candidates.into_iter();
    let first = candidates.next()?;
    let others: Vec<RoutingId> = candidates.filter(|id| id != &first).collect();
    if !others.is_empty() {
        tracing::debug!(
            "{} has inconsistent identifiers via {}: using {}, ignoring {:?}",
            version,
            source,
            first,
            others.iter().map(RoutingId::as_str).collect::<Vec<_>>()
        );
    }
    Some(first)
}

/// Runs the extraction strategies for one release
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    template: UrlTemplate,
    known: BTreeMap<ReleaseVersion, RoutingId>,
}

impl IdentifierExtractor {
    /// Creates an extractor with no hand-supplied identifiers
    pub fn new(template: UrlTemplate) -> Self {
        Self {
            template,
            known: BTreeMap::new(),
        }
    }

    /// Adds hand-supplied identifiers, keyed by version
    pub fn with_known_identifiers(
        mut self,
        entries: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        for (version, identifier) in entries {
            let version: ReleaseVersion = version
                .parse()
                .map_err(|e| ConfigError::InvalidVersion(format!("known-identifiers: {}", e)))?;
            let identifier = RoutingId::new(identifier.as_str())
                .map_err(|e| ConfigError::Validation(format!("known-identifiers: {}", e)))?;
            self.known.insert(version, identifier);
        }
        Ok(self)
    }

    /// Extracts the identifier of a release from its release-notes section
    ///
    /// # Returns
    ///
    /// * `Ok((RoutingId, IdentifierSource))` - The first strategy that matched
    /// * `Err(ExtractError::NotFound)` - No section strategy matched
    pub fn extract_identifier(
        &self,
        section: &ReleaseSection,
    ) -> Result<(RoutingId, IdentifierSource), ExtractError> {
        SECTION_STRATEGIES
            .iter()
            .find_map(|(source, strategy)| {
                let candidates = strategy(&self.template, section);
                first_in_document_order(&section.version, *source, candidates)
                    .map(|id| (id, *source))
            })
            .ok_or_else(|| ExtractError::NotFound(section.version.clone()))
    }

    /// Extracts an identifier from a per-version sub-page body
    pub fn extract_from_subpage(
        &self,
        version: &ReleaseVersion,
        html: &str,
        page_url: &Url,
    ) -> Result<RoutingId, ExtractError> {
        let (links, text) = parse_page(html, page_url);
        let mut candidates: Vec<RoutingId> = links
            .iter()
            .filter_map(|link| self.template.find_identifier(link))
            .collect();
        candidates.extend(self.template.find_identifiers(&text));
        candidates.extend(self.template.find_identifiers(html));

        first_in_document_order(version, IdentifierSource::SubPage, candidates)
            .ok_or_else(|| ExtractError::NotFound(version.clone()))
    }

    /// Looks up a hand-supplied identifier
    pub fn known_identifier(&self, version: &ReleaseVersion) -> Result<RoutingId, ExtractError> {
        self.known
            .get(version)
            .cloned()
            .ok_or_else(|| ExtractError::NotFound(version.clone()))
    }
}

/// Expands the sub-page pattern for one version
///
/// `{version}` becomes `4.37.2` and `{anchor}` becomes `4372`.
pub fn subpage_url(pattern: &str, version: &ReleaseVersion) -> Result<Url, url::ParseError> {
    let expanded = pattern
        .replace("{version}", &version.to_string())
        .replace("{anchor}", &version.anchor());
    Url::parse(&expanded)
}
