//! Link verification
//!
//! This module checks whether a candidate download URL exists without
//! downloading it:
//! - HEAD requests with redirects followed and a bounded timeout
//! - Classification into present, absent or indeterminate
//! - Optional retries of indeterminate outcomes

mod retry;

pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

use crate::template::DownloadTarget;
use crate::version::ReleaseVersion;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::fmt;
use url::Url;

/// Outcome of one existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The server confirmed the resource exists
    Present,

    /// The server explicitly answered that the resource does not exist
    Absent,

    /// No definite answer: transport failure, timeout or unexpected status
    Indeterminate(String),
}

impl Verification {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate(_))
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Indeterminate(reason) => write!(f, "indeterminate ({})", reason),
        }
    }
}

/// A download URL derived for one release and target, not yet checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub version: ReleaseVersion,
    pub target: DownloadTarget,
    pub url: Url,
}

/// A candidate link together with the outcome of its check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLink {
    pub version: ReleaseVersion,
    pub target: DownloadTarget,
    pub url: Url,
    pub outcome: Verification,
    pub checked_at: DateTime<Utc>,
}

impl VerifiedLink {
    /// Pairs a candidate with an outcome, stamped with the current time
    pub fn new(candidate: CandidateLink, outcome: Verification) -> Self {
        Self {
            version: candidate.version,
            target: candidate.target,
            url: candidate.url,
            outcome,
            checked_at: Utc::now(),
        }
    }
}

/// Maps an HTTP status to a verification outcome
///
/// | Status | Outcome |
/// |--------|---------|
/// | 2xx | Present |
/// | 404, 410 | Absent |
/// | anything else | Indeterminate |
pub fn classify_status(status: StatusCode) -> Verification {
    if status.is_success() {
        Verification::Present
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Verification::Absent
    } else {
        Verification::Indeterminate(format!("HTTP {}", status.as_u16()))
    }
}

/// Maps a transport error to an indeterminate outcome
pub fn classify_error(error: &reqwest::Error) -> Verification {
    let reason = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_redirect() {
        "redirect limit exceeded".to_string()
    } else {
        error.to_string()
    };
    Verification::Indeterminate(reason)
}

/// Checks download URLs with HEAD requests
///
/// Cloning is cheap; the underlying client is shared.
#[derive(Debug, Clone)]
pub struct LinkVerifier {
    client: Client,
    retry: RetryPolicy,
}

impl LinkVerifier {
    /// Creates a verifier that makes a single attempt per link
    ///
    /// Timeouts are those of `client`.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    /// Replaces the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Checks whether `url` exists, retrying indeterminate outcomes per policy
    pub async fn verify(&self, url: &Url) -> Verification {
        let mut attempt = 1;
        loop {
            let outcome = self.check_once(url).await;
            match self.retry.next_delay(&outcome, attempt) {
                Some(delay) => {
                    tracing::debug!(
                        "Attempt {} for {} was {}, retrying in {:?}",
                        attempt,
                        url,
                        outcome,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return outcome,
            }
        }
    }

    /// Checks a candidate and stamps the result
    pub async fn verify_candidate(&self, candidate: CandidateLink) -> VerifiedLink {
        let outcome = self.verify(&candidate.url).await;
        tracing::debug!(
            "{} {} -> {}",
            candidate.version,
            candidate.target,
            outcome
        );
        VerifiedLink::new(candidate, outcome)
    }

    async fn check_once(&self, url: &Url) -> Verification {
        match self.client.head(url.clone()).send().await {
            Ok(response) => classify_status(response.status()),
            Err(e) => classify_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), Verification::Present);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), Verification::Present);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Verification::Absent);
        assert_eq!(classify_status(StatusCode::GONE), Verification::Absent);
        assert!(classify_status(StatusCode::FORBIDDEN).is_indeterminate());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE).is_indeterminate());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_indeterminate());
    }

    #[tokio::test]
    async fn test_verify_present_and_absent() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/mac/main/amd64/1/Docker.dmg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(test_client());
        let present = Url::parse(&format!("{}/mac/main/amd64/1/Docker.dmg", server.uri())).unwrap();
        let absent = Url::parse(&format!("{}/mac/main/arm64/1/Docker.dmg", server.uri())).unwrap();

        assert_eq!(verifier.verify(&present).await, Verification::Present);
        assert_eq!(verifier.verify(&absent).await, Verification::Absent);
    }

    #[tokio::test]
    async fn test_verify_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(test_client());
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        assert_eq!(verifier.verify(&url).await, Verification::Present);
    }

    #[tokio::test]
    async fn test_server_error_is_indeterminate_and_retried() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(test_client())
            .with_retry(RetryPolicy::new(3, Duration::from_millis(5)));
        let url = Url::parse(&format!("{}/win/main/amd64/1/x.exe", server.uri())).unwrap();

        assert_eq!(
            verifier.verify(&url).await,
            Verification::Indeterminate("HTTP 503".to_string())
        );
    }

    #[tokio::test]
    async fn test_absent_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(test_client())
            .with_retry(RetryPolicy::new(3, Duration::from_millis(5)));
        let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();

        assert_eq!(verifier.verify(&url).await, Verification::Absent);
    }

    #[tokio::test]
    async fn test_timeout_is_indeterminate() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let verifier = LinkVerifier::new(test_client());
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();

        assert!(verifier.verify(&url).await.is_indeterminate());
    }

    #[tokio::test]
    async fn test_connection_failure_is_indeterminate() {
        let verifier = LinkVerifier::new(test_client());
        // Port 9 (discard) on localhost is not served in test environments
        let url = Url::parse("http://127.0.0.1:9/mac/main/amd64/1/Docker.dmg").unwrap();

        assert!(verifier.verify(&url).await.is_indeterminate());
    }
}
