//! Release discovery
//!
//! This module turns the upstream documentation into releases:
//! - Fetching the release-notes page (and per-version sub-pages)
//! - Splitting the page into one section per release
//! - Recovering each release's routing identifier through ordered fallbacks

mod extract;
mod fetcher;
mod parser;

pub use extract::{
    subpage_url, ExtractError, IdentifierExtractor, IdentifierSource, SectionStrategy,
    SECTION_STRATEGIES,
};
pub use fetcher::{build_http_client, fetch_page, FetchResult, MAX_REDIRECTS};
pub use parser::{parse_page, parse_release_notes, ReleaseNotes, ReleaseSection};

use crate::config::SourceConfig;
use crate::template::RoutingId;
use crate::version::ReleaseVersion;
use crate::{ConfigError, LinksError, Result};
use chrono::NaiveDate;
use reqwest::Client;
use url::Url;

/// A release discovered upstream
///
/// `routing_identifier` is `None` when every extraction strategy failed; it is
/// never filled with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: ReleaseVersion,
    pub release_date: Option<NaiveDate>,
    pub routing_identifier: Option<RoutingId>,
    pub identifier_source: Option<IdentifierSource>,
}

/// The upstream release-notes site
#[derive(Debug, Clone)]
pub struct ReleaseSource {
    client: Client,
    release_notes_url: Url,
    subpage_pattern: String,
    extractor: IdentifierExtractor,
}

impl ReleaseSource {
    /// Creates a source from configuration
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `config` - Source URLs
    /// * `extractor` - Identifier extraction strategies
    pub fn new(client: Client, config: &SourceConfig, extractor: IdentifierExtractor) -> Result<Self> {
        let release_notes_url = Url::parse(&config.release_notes_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid release-notes-url '{}': {}",
                config.release_notes_url, e
            ))
        })?;

        Ok(Self {
            client,
            release_notes_url,
            subpage_pattern: config.subpage_pattern.clone(),
            extractor,
        })
    }

    /// Fetches and parses the release-notes page
    ///
    /// # Returns
    ///
    /// * `Ok(ReleaseNotes)` - At least one release section was found
    /// * `Err(LinksError::SourceUnreachable)` - The page could not be fetched
    /// * `Err(LinksError::SourceParse)` - The page names no release
    pub async fn fetch_release_notes(&self) -> Result<ReleaseNotes> {
        tracing::info!("Fetching release notes from {}", self.release_notes_url);

        let (final_url, body) = match fetch_page(&self.client, &self.release_notes_url).await {
            FetchResult::Success { final_url, body } => (final_url, body),
            failure => {
                return Err(LinksError::SourceUnreachable {
                    url: self.release_notes_url.to_string(),
                    message: failure.failure_reason().unwrap_or_default(),
                })
            }
        };

        let notes = parse_release_notes(&body, &final_url);
        if notes.is_empty() {
            return Err(LinksError::SourceParse {
                url: final_url.to_string(),
                message: "no release headings found".to_string(),
            });
        }

        tracing::info!("Found {} releases in the release notes", notes.len());
        Ok(notes)
    }

    /// Resolves one release section into a release
    ///
    /// Strategies: section links, section text, the version's sub-page, then
    /// the hand-supplied table. Failure of every strategy is not an error.
    pub async fn resolve(&self, section: &ReleaseSection) -> Release {
        let found = match self.extractor.extract_identifier(section) {
            Ok(found) => Some(found),
            Err(_) => self
                .from_subpage(&section.version)
                .await
                .map(|id| (id, IdentifierSource::SubPage))
                .or_else(|| {
                    self.extractor
                        .known_identifier(&section.version)
                        .ok()
                        .map(|id| (id, IdentifierSource::Known))
                }),
        };

        match &found {
            Some((id, source)) => {
                tracing::debug!("{}: identifier {} via {}", section.version, id, source)
            }
            None => tracing::debug!("{}: no identifier found", section.version),
        }

        let (routing_identifier, identifier_source) = found.unzip();
        Release {
            version: section.version.clone(),
            release_date: section.release_date,
            routing_identifier,
            identifier_source,
        }
    }

    async fn from_subpage(&self, version: &ReleaseVersion) -> Option<RoutingId> {
        let url = match subpage_url(&self.subpage_pattern, version) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("{}: cannot build sub-page URL: {}", version, e);
                return None;
            }
        };

        match fetch_page(&self.client, &url).await {
            FetchResult::Success { final_url, body } => self
                .extractor
                .extract_from_subpage(version, &body, &final_url)
                .ok(),
            failure => {
                tracing::debug!(
                    "{}: sub-page {} unavailable: {}",
                    version,
                    url,
                    failure.failure_reason().unwrap_or_default()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UserAgentConfig, VerifierConfig};
    use crate::template::UrlTemplate;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer, known: &BTreeMap<String, String>) -> ReleaseSource {
        let config = SourceConfig {
            release_notes_url: format!("{}/release-notes/", server.uri()),
            subpage_pattern: format!("{}/release-notes/{{version}}/", server.uri()),
            ..SourceConfig::default()
        };
        let client =
            build_http_client(&UserAgentConfig::default(), &VerifierConfig::default()).unwrap();
        let extractor = IdentifierExtractor::new(UrlTemplate::official().unwrap())
            .with_known_identifiers(known)
            .unwrap();
        ReleaseSource::new(client, &config, extractor).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_release_notes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = source_for(&server, &BTreeMap::new());
        let result = source.fetch_release_notes().await;
        assert!(matches!(result, Err(LinksError::SourceUnreachable { .. })));
    }

    #[tokio::test]
    async fn test_page_without_releases() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h2>Maintenance</h2>"))
            .mount(&server)
            .await;

        let source = source_for(&server, &BTreeMap::new());
        let result = source.fetch_release_notes().await;
        assert!(matches!(result, Err(LinksError::SourceParse { .. })));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_subpage_then_known() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/release-notes/4.5.0/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://desktop.docker.com/mac/main/amd64/74594/Docker.dmg">Mac</a>"#,
            ))
            .mount(&server)
            .await;

        let mut known = BTreeMap::new();
        known.insert("4.4.0".to_string(), "73305".to_string());
        let source = source_for(&server, &known);

        let base = Url::parse(&format!("{}/release-notes/", server.uri())).unwrap();
        let notes = parse_release_notes(
            "<h2>4.5.0</h2><p>2022-01-27</p><h2>4.4.0</h2><h2>4.3.0</h2>",
            &base,
        );

        let subpage = source.resolve(&notes.sections[0]).await;
        assert_eq!(subpage.routing_identifier.unwrap().as_str(), "74594");
        assert_eq!(subpage.identifier_source, Some(IdentifierSource::SubPage));
        assert_eq!(subpage.release_date, NaiveDate::from_ymd_opt(2022, 1, 27));

        let known = source.resolve(&notes.sections[1]).await;
        assert_eq!(known.routing_identifier.unwrap().as_str(), "73305");
        assert_eq!(known.identifier_source, Some(IdentifierSource::Known));

        let missing = source.resolve(&notes.sections[2]).await;
        assert_eq!(missing.routing_identifier, None);
        assert_eq!(missing.identifier_source, None);
    }
}
