//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with browser-equivalent headers
//! - GET requests with per-request Referer propagation
//! - Retry logic for transient failures
//! - Error classification
//!
//! The target site serves a reduced page to obvious bots, so every request
//! carries the header set a desktop browser would send on a top-level
//! navigation.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::FetcherConfig;

/// Delay before the first retry; later retries wait proportionally longer
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Non-success HTTP status after retries were exhausted
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the request timed out
        timed_out: bool,
    },
}

impl FetchResult {
    /// Conditions that may clear up on a retry
    fn is_transient(&self) -> bool {
        match self {
            FetchResult::Success { .. } => false,
            FetchResult::HttpError { status_code } => *status_code >= 500 || *status_code == 429,
            FetchResult::NetworkError { .. } => true,
        }
    }
}

/// Builds the HTTP client used for all page fetches
///
/// Compression is enabled and redirects are followed, with the final URL
/// reported on the fetch result.
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Headers a desktop browser sends on a top-level navigation
fn browser_headers(referrer: Option<&Url>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );

    if let Some(referrer) = referrer {
        if let Ok(value) = HeaderValue::from_str(referrer.as_str()) {
            headers.insert(header::REFERER, value);
        }
    }

    headers
}

/// Fetches a URL with retry logic for transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Success |
/// | 4xx (except 429) | Immediate HttpError |
/// | 429 / 5xx | Retry up to `retries` times |
/// | Network error / timeout | Retry up to `retries` times |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `referrer` - Page that linked here, sent as the Referer header
/// * `retries` - Number of additional attempts after the first
pub async fn fetch_url(
    client: &Client,
    url: &Url,
    referrer: Option<&Url>,
    retries: u32,
) -> FetchResult {
    let attempts = retries + 1;
    let mut attempt = 1;

    loop {
        let result = send_once(client, url, referrer).await;

        if attempt >= attempts || !result.is_transient() {
            return result;
        }

        debug!(url = %url, attempt, "Transient fetch failure, retrying");
        tokio::time::sleep(RETRY_DELAY * attempt).await;
        attempt += 1;
    }
}

/// Sends a single GET request and classifies the outcome
async fn send_once(client: &Client, url: &Url, referrer: Option<&Url>) -> FetchResult {
    let request = client.get(url.clone()).headers(browser_headers(referrer));

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                    timed_out: e.is_timeout(),
                },
            }
        }
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: e.is_timeout(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> FetcherConfig {
        FetcherConfig {
            concurrency: 5,
            timeout_secs: 30,
            retries: 2,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) TestClient/1.0".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_browser_headers_without_referrer() {
        let headers = browser_headers(None);

        assert!(headers.get(header::ACCEPT).is_some());
        assert_eq!(
            headers.get(header::ACCEPT_LANGUAGE).unwrap(),
            "de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7"
        );
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert!(headers.get(header::REFERER).is_none());
    }

    #[test]
    fn test_browser_headers_with_referrer() {
        let referrer = Url::parse("https://geizhals.eu/?cat=hvent").unwrap();
        let headers = browser_headers(Some(&referrer));

        assert_eq!(
            headers.get(header::REFERER).unwrap(),
            "https://geizhals.eu/?cat=hvent"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();

        match fetch_url(&client, &url, None, 0).await {
            FetchResult::Success {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(body, "<html>ok</html>");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();

        match fetch_url(&client, &url, None, 2).await {
            FetchResult::HttpError { status_code } => assert_eq!(status_code, 404),
            other => panic!("expected http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();

        match fetch_url(&client, &url, None, 2).await {
            FetchResult::Success { body, .. } => assert_eq!(body, "recovered"),
            other => panic!("expected success after retries, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_referrer_header_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail"))
            .and(header("referer", "https://geizhals.eu/?cat=hvent"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let url = Url::parse(&format!("{}/detail", server.uri())).unwrap();
        let referrer = Url::parse("https://geizhals.eu/?cat=hvent").unwrap();

        let result = fetch_url(&client, &url, Some(&referrer), 0).await;
        assert!(matches!(result, FetchResult::Success { .. }));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchResult::HttpError { status_code: 503 }.is_transient());
        assert!(FetchResult::HttpError { status_code: 429 }.is_transient());
        assert!(!FetchResult::HttpError { status_code: 404 }.is_transient());
        assert!(!FetchResult::HttpError { status_code: 403 }.is_transient());
        assert!(FetchResult::NetworkError {
            error: "connection refused".to_string(),
            timed_out: false,
        }
        .is_transient());
    }
}
