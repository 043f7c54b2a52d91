//! Integration tests for the refresh pipeline
//!
//! These tests use wiremock to serve both the release-notes pages and the
//! download CDN, and run full refreshes against a catalog in a temp dir.

use docker_desktop_links::catalog::{load_catalog, save_catalog, Catalog};
use docker_desktop_links::config::Config;
use docker_desktop_links::pipeline::{run_refresh, ReleaseOutcome, RefreshOptions};
use docker_desktop_links::source::IdentifierSource;
use docker_desktop_links::{
    Architecture, DownloadTarget, LinksError, Os, ReleaseVersion, VersionScope,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a configuration pointing every URL at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.source.release_notes_url = format!("{}/release-notes/", server.uri());
    config.source.subpage_pattern = format!("{}/release-notes/{{version}}/", server.uri());
    config.source.download_base = server.uri();
    config.verifier.request_timeout_ms = 2_000;
    config.verifier.connect_timeout_ms = 1_000;
    config.verifier.max_attempts = 1;
    config.verifier.retry_delay_ms = 0;
    config
}

fn options(dir: &TempDir) -> RefreshOptions {
    RefreshOptions {
        catalog_path: dir.path().join("DockerDesktop.yaml"),
        scope: VersionScope::all(),
        dry_run: false,
    }
}

fn v(s: &str) -> ReleaseVersion {
    s.parse().unwrap()
}

fn mac_amd64() -> DownloadTarget {
    DownloadTarget::new(Os::Mac, Architecture::Amd64).unwrap()
}

/// Serves the release-notes page
async fn mount_release_notes(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/release-notes/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answers 200 to HEAD checks of every file under one routing identifier
async fn mount_all_present(server: &MockServer, routing_id: &str) {
    Mock::given(method("HEAD"))
        .and(path_regex(format!("^/[a-z]+/main/[a-z0-9]+/{}/", routing_id)))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Answers 200 to the HEAD check of a single file
async fn mount_present(server: &MockServer, file_path: &str) {
    Mock::given(method("HEAD"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Answers 200 after a fixed delay and records when each request arrived
#[derive(Clone)]
struct ArrivalLog {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl ArrivalLog {
    fn new(delay: Duration) -> Self {
        Self {
            arrivals: Arc::new(Mutex::new(Vec::new())),
            delay,
        }
    }

    fn count(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }

    /// Asserts no request arrived before the previous response was sent
    fn assert_one_at_a_time(&self) {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort();
        for pair in arrivals.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= self.delay,
                "requests overlapped: {:?} apart, each takes {:?}",
                gap,
                self.delay
            );
        }
    }
}

impl Respond for ArrivalLog {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200).set_delay(self.delay)
    }
}

fn release_notes(base: &str) -> String {
    format!(
        r#"<html><body><article>
        <h1>Docker Desktop release notes</h1>
        <h2 id="410">4.1.0</h2>
        <p>2021-09-30</p>
        <blockquote>
            <a href="{base}/win/main/amd64/69386/Docker%20Desktop%20Installer.exe">Windows</a> |
            <a href="{base}/mac/main/amd64/69386/Docker.dmg">Mac with Intel chip</a>
        </blockquote>
        <h2 id="400">4.0.0</h2>
        <p>2021-08-31</p>
        <blockquote>
            <a href="{base}/mac/main/amd64/67817/Docker.dmg">Mac with Intel chip</a>
        </blockquote>
        <h2 id="360">3.6.0</h2>
        <p>2021-07-27</p>
        <blockquote>
            <a href="{base}/mac/main/amd64/67351/Docker.dmg">Mac with Intel chip</a>
        </blockquote>
        </article></body></html>"#,
        base = base
    )
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[tokio::test]
async fn test_full_refresh() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    mount_all_present(&server, "69386").await;
    mount_present(&server, "/mac/main/amd64/67817/Docker.dmg").await;
    mount_all_present(&server, "67351").await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    assert_eq!(report.verified(), 1);
    assert_eq!(report.partial(), 1);
    assert_eq!(report.out_of_scope, 1);
    assert_eq!(report.checks(), 14);
    assert_eq!(
        report.release(&v("4.0.0")).unwrap().identifier_source,
        Some(IdentifierSource::SectionLinks)
    );

    let catalog = load_catalog(&options.catalog_path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get(&v("4.1.0")).unwrap().links.len(), 7);
    assert!(!catalog.contains(&v("3.6.0")));

    let release = catalog.get(&v("4.0.0")).unwrap();
    assert_eq!(release.links.len(), 1);
    assert_eq!(
        release.release_date,
        chrono::NaiveDate::from_ymd_opt(2021, 8, 31)
    );
    assert_eq!(
        catalog.link(&v("4.0.0"), mac_amd64()),
        Some(format!("{}/mac/main/amd64/67817/Docker.dmg", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_unreachable_source_leaves_catalog_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/release-notes/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    std::fs::write(
        &options.catalog_path,
        "4.0.0:\n  links:\n    mac/amd64: https://desktop.docker.com/mac/main/amd64/67817/Docker.dmg\n",
    )
    .unwrap();
    let before = read(&options.catalog_path);

    let result = run_refresh(&create_test_config(&server), &options).await;

    assert!(matches!(result, Err(LinksError::SourceUnreachable { .. })));
    assert_eq!(read(&options.catalog_path), before);
}

#[tokio::test]
async fn test_page_without_releases_is_fatal() {
    let server = MockServer::start().await;
    mount_release_notes(&server, "<html><body><h2>Coming soon</h2></body></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let result = run_refresh(&create_test_config(&server), &options).await;

    assert!(matches!(result, Err(LinksError::SourceParse { .. })));
    assert!(!options.catalog_path.exists());
}

#[tokio::test]
async fn test_corrupt_catalog_is_fatal_and_kept() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    std::fs::write(&options.catalog_path, "4.0.0: [unterminated").unwrap();
    let before = read(&options.catalog_path);

    let result = run_refresh(&create_test_config(&server), &options).await;

    assert!(matches!(result, Err(LinksError::CatalogCorrupt { .. })));
    assert_eq!(read(&options.catalog_path), before);
}

#[tokio::test]
async fn test_two_runs_are_byte_identical() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    mount_all_present(&server, "69386").await;
    mount_present(&server, "/mac/main/amd64/67817/Docker.dmg").await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let config = create_test_config(&server);

    run_refresh(&config, &options).await.unwrap();
    let first = read(&options.catalog_path);

    let report = run_refresh(&config, &options).await.unwrap();
    let second = read(&options.catalog_path);

    assert_eq!(first, second);
    assert!(!report.merge.has_changes());
}

#[tokio::test]
async fn test_indeterminate_checks_preserve_existing_links() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);

    let existing: Catalog = serde_yaml::from_str(&format!(
        "4.0.0:\n  release-date: 2021-08-31\n  links:\n    mac/amd64: {}/mac/main/amd64/67817/Docker.dmg\n",
        server.uri()
    ))
    .unwrap();
    save_catalog(&options.catalog_path, &existing).unwrap();

    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    let release = report.release(&v("4.0.0")).unwrap();
    assert_eq!(release.outcome, ReleaseOutcome::Unconfirmed);
    assert_eq!(release.indeterminate, 7);
    assert_eq!(release.problems.len(), 7);

    assert_eq!(load_catalog(&options.catalog_path).unwrap(), existing);
}

#[tokio::test]
async fn test_release_without_identifier_is_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<h2>4.2.0</h2><p>2021-11-01</p><p>Bug fixes only.</p>
           <h2>4.1.0</h2><a href="{}/mac/main/amd64/69386/Docker.dmg">Mac</a>"#,
        server.uri()
    );
    mount_release_notes(&server, body).await;
    mount_all_present(&server, "69386").await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    assert_eq!(report.skipped(), 1);
    assert_eq!(
        report.release(&v("4.2.0")).unwrap().outcome,
        ReleaseOutcome::Skipped
    );

    let catalog = load_catalog(&options.catalog_path).unwrap();
    assert!(!catalog.contains(&v("4.2.0")));
    assert!(catalog.contains(&v("4.1.0")));
}

#[tokio::test]
async fn test_subpage_fallback() {
    let server = MockServer::start().await;
    mount_release_notes(
        &server,
        "<h2>4.3.0</h2><p>See the dedicated page.</p>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/release-notes/4.3.0/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><code>{}/linux/main/amd64/72729/docker-desktop-amd64.deb</code></body></html>"#,
            server.uri()
        )))
        .mount(&server)
        .await;
    mount_all_present(&server, "72729").await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    let release = report.release(&v("4.3.0")).unwrap();
    assert_eq!(release.outcome, ReleaseOutcome::Verified);
    assert_eq!(release.identifier_source, Some(IdentifierSource::SubPage));
    assert_eq!(
        load_catalog(&options.catalog_path)
            .unwrap()
            .get(&v("4.3.0"))
            .unwrap()
            .links
            .len(),
        7
    );
}

#[tokio::test]
async fn test_known_identifier_fallback() {
    let server = MockServer::start().await;
    mount_release_notes(&server, "<h2>4.4.0</h2><p>2022-01-13</p>".to_string()).await;
    mount_present(&server, "/mac/main/arm64/73305/Docker.dmg").await;

    let mut config = create_test_config(&server);
    config
        .known_identifiers
        .insert("4.4.0".to_string(), "73305".to_string());

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let report = run_refresh(&config, &options).await.unwrap();

    let release = report.release(&v("4.4.0")).unwrap();
    assert_eq!(release.outcome, ReleaseOutcome::Partial);
    assert_eq!(release.identifier_source, Some(IdentifierSource::Known));

    let catalog = load_catalog(&options.catalog_path).unwrap();
    let arm = DownloadTarget::new(Os::Mac, Architecture::Arm64).unwrap();
    assert!(catalog.link(&v("4.4.0"), arm).is_some());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    mount_all_present(&server, "69386").await;

    let dir = TempDir::new().unwrap();
    let options = RefreshOptions {
        dry_run: true,
        ..options(&dir)
    };
    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    assert_eq!(report.verified(), 1);
    assert!(report.merge.has_changes());
    assert!(!options.catalog_path.exists());
}

#[tokio::test]
async fn test_single_version_scope() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    mount_all_present(&server, "69386").await;
    mount_all_present(&server, "67817").await;

    let dir = TempDir::new().unwrap();
    let options = RefreshOptions {
        scope: VersionScope::single(v("4.0.0")),
        ..options(&dir)
    };
    let report = run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    assert_eq!(report.releases.len(), 1);
    assert_eq!(report.out_of_scope, 2);

    let catalog = load_catalog(&options.catalog_path).unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.contains(&v("4.0.0")));
}

#[tokio::test]
async fn test_previous_releases_carried_forward() {
    let server = MockServer::start().await;
    mount_release_notes(&server, release_notes(&server.uri())).await;
    mount_all_present(&server, "69386").await;

    let dir = TempDir::new().unwrap();
    let options = options(&dir);

    // A release no longer listed upstream
    let existing: Catalog = serde_yaml::from_str(
        "3.5.0:\n  links:\n    windows/amd64: https://desktop.docker.com/win/main/amd64/66501/Docker%20Desktop%20Installer.exe\n",
    )
    .unwrap();
    save_catalog(&options.catalog_path, &existing).unwrap();

    run_refresh(&create_test_config(&server), &options)
        .await
        .unwrap();

    let catalog = load_catalog(&options.catalog_path).unwrap();
    assert_eq!(catalog.get(&v("3.5.0")), existing.get(&v("3.5.0")));
    assert!(catalog.contains(&v("4.1.0")));
}

#[tokio::test]
async fn test_official_links_resolve_under_mirror_base() {
    let docs = MockServer::start().await;
    let mirror = MockServer::start().await;
    mount_release_notes(&docs, release_notes("https://desktop.docker.com")).await;
    mount_all_present(&mirror, "69386").await;
    mount_all_present(&mirror, "67817").await;

    let mut config = create_test_config(&docs);
    config.source.download_base = mirror.uri();

    let dir = TempDir::new().unwrap();
    let options = options(&dir);
    let report = run_refresh(&config, &options).await.unwrap();

    assert_eq!(report.skipped(), 0);
    assert_eq!(report.verified(), 2);
    assert_eq!(report.checks(), 14);

    let catalog = load_catalog(&options.catalog_path).unwrap();
    assert_eq!(
        catalog.link(&v("4.0.0"), mac_amd64()),
        Some(format!("{}/mac/main/amd64/67817/Docker.dmg", mirror.uri()).as_str())
    );
}

#[tokio::test]
async fn test_checks_respect_concurrency_limit() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<h2>4.1.0</h2><a href="{}/mac/main/amd64/69386/Docker.dmg">Mac</a>"#,
        server.uri()
    );
    mount_release_notes(&server, body).await;

    let log = ArrivalLog::new(Duration::from_millis(100));
    Mock::given(method("HEAD"))
        .respond_with(log.clone())
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.verifier.max_concurrent_checks = 1;

    let dir = TempDir::new().unwrap();
    let report = run_refresh(&config, &options(&dir)).await.unwrap();

    assert_eq!(report.verified(), 1);
    assert_eq!(log.count(), 7);
    log.assert_one_at_a_time();
}

#[tokio::test]
async fn test_subpage_fetches_share_concurrency_limit() {
    let server = MockServer::start().await;
    mount_release_notes(
        &server,
        "<h2>4.5.0</h2><h2>4.4.0</h2><h2>4.3.0</h2>".to_string(),
    )
    .await;

    let log = ArrivalLog::new(Duration::from_millis(100));
    Mock::given(method("GET"))
        .and(path_regex(r"^/release-notes/4\.[345]\.0/$"))
        .respond_with(log.clone())
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.verifier.max_concurrent_checks = 1;

    let dir = TempDir::new().unwrap();
    let report = run_refresh(&config, &options(&dir)).await.unwrap();

    assert_eq!(report.skipped(), 3);
    assert_eq!(log.count(), 3);
    log.assert_one_at_a_time();
}
