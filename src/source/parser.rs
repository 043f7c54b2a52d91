//! HTML parser for the release-notes page
//!
//! This module splits the release-notes document into one section per release:
//! - Every `<h2>` naming an `X.Y.Z` version opens a section
//! - A section runs over the heading's following siblings until the next `<h2>`
//! - Links, raw markup, text and the release date are collected per section

use crate::version::ReleaseVersion;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

#[allow(clippy::expect_used)]
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("heading selector is valid"));

#[allow(clippy::expect_used)]
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

#[allow(clippy::expect_used)]
static RELEASE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[-/](\d{2})[-/](\d{2})").expect("release date regex is valid")
});

/// One release as it appears on the release-notes page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSection {
    /// Version named by the heading
    pub version: ReleaseVersion,

    /// Date in the heading, or else in the first block after it
    pub release_date: Option<NaiveDate>,

    /// Absolute link targets in document order
    pub links: Vec<String>,

    /// Raw HTML of the section body
    pub markup: String,

    /// Visible text of the section body
    pub text: String,
}

/// All release sections of a release-notes document, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub sections: Vec<ReleaseSection>,
}

impl ReleaseNotes {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Looks up the section of one version
    pub fn get(&self, version: &ReleaseVersion) -> Option<&ReleaseSection> {
        self.sections.iter().find(|s| &s.version == version)
    }
}

/// Parses a release-notes document into release sections
///
/// Headings without a version close the previous section but open none. When
/// a version appears under two headings the first one wins.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use docker_desktop_links::source::parse_release_notes;
/// use url::Url;
///
/// let html = r#"<h2>4.0.0</h2><p>2021-08-31</p><h2>4.1.0</h2>"#;
/// let base = Url::parse("https://docs.docker.com/desktop/release-notes/").unwrap();
/// let notes = parse_release_notes(html, &base);
/// assert_eq!(notes.len(), 2);
/// ```
pub fn parse_release_notes(html: &str, base_url: &Url) -> ReleaseNotes {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut sections = Vec::new();

    for heading in document.select(&HEADING) {
        let heading_text = heading.text().collect::<String>();
        let Some(version) = ReleaseVersion::find_in(&heading_text) else {
            continue;
        };

        if !seen.insert(version.clone()) {
            tracing::debug!("Ignoring repeated heading for {}", version);
            continue;
        }

        let section = collect_section(heading, version, &heading_text, base_url);
        sections.push(section);
    }

    ReleaseNotes { sections }
}

/// Parses a per-version sub-page, returning its links and visible text
pub fn parse_page(html: &str, base_url: &Url) -> (Vec<String>, String) {
    let document = Html::parse_document(html);
    let links = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect();
    let text = document.root_element().text().collect::<String>();
    (links, text)
}

/// Gathers everything between `heading` and the next `<h2>`
fn collect_section(
    heading: ElementRef<'_>,
    version: ReleaseVersion,
    heading_text: &str,
    base_url: &Url,
) -> ReleaseSection {
    let mut links = Vec::new();
    let mut markup = String::new();
    let mut text = String::new();
    let mut lead: Option<String> = None;

    for sibling in heading.next_siblings() {
        match sibling.value() {
            Node::Element(element) if element.name() == "h2" => break,
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(sibling) else {
                    continue;
                };
                if element.value().name() == "a" {
                    push_link(element, base_url, &mut links);
                }
                for anchor in element.select(&ANCHOR) {
                    push_link(anchor, base_url, &mut links);
                }
                let block: String = element.text().collect();
                if lead.is_none() && !block.trim().is_empty() {
                    lead = Some(block.clone());
                }
                markup.push_str(&element.html());
                text.push_str(&block);
            }
            Node::Text(fragment) => {
                if lead.is_none() && !fragment.trim().is_empty() {
                    lead = Some(fragment.to_string());
                }
                markup.push_str(fragment);
                text.push_str(fragment);
            }
            _ => {}
        }
    }

    // Only the heading and the first block carry the release date
    let release_date =
        find_release_date(heading_text).or_else(|| lead.as_deref().and_then(find_release_date));

    ReleaseSection {
        version,
        release_date,
        links,
        markup,
        text,
    }
}

fn push_link(element: ElementRef<'_>, base_url: &Url, links: &mut Vec<String>) {
    if let Some(href) = element.value().attr("href") {
        if let Some(absolute_url) = resolve_link(href, base_url) {
            links.push(absolute_url);
        }
    }
}

/// Returns the first valid calendar date in `text`
fn find_release_date(text: &str) -> Option<NaiveDate> {
    RELEASE_DATE.captures_iter(text).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
