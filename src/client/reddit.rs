//! Reddit JSON API client
//!
//! Anonymous read access to the listing and comment endpoints. The server
//! throttles aggressively (~1 request/second average), so every successful
//! request is followed by an enforced minimum sleep plus jitter, and
//! throttling responses back off exponentially before giving up for the
//! cycle.

use crate::client::{build_http_client, RetryPolicy};
use crate::config::{RedditConfig, UserAgentConfig};
use crate::{DriftnetError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Client for the reddit JSON endpoints
#[derive(Debug, Clone)]
pub struct RedditClient {
    http: Client,
    base: Url,
    listing_limit: u32,
    comment_limit: u32,
    min_spacing: Duration,
    spacing_jitter: Duration,
    retry: RetryPolicy,
}

impl RedditClient {
    /// Creates a client from configuration
    pub fn new(config: &RedditConfig, user_agent: &UserAgentConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(user_agent)?,
            base: Url::parse(&config.base_url)?,
            listing_limit: config.listing_limit,
            comment_limit: config.comment_limit,
            min_spacing: Duration::from_millis(config.min_spacing_ms),
            spacing_jitter: Duration::from_millis(config.spacing_jitter_ms),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy (tests shrink the delays)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches one page of the newest submissions in a subreddit
    ///
    /// # Arguments
    ///
    /// * `subreddit` - Community name without the `r/` prefix
    /// * `after` - Opaque pagination cursor from the previous page, if any
    ///
    /// # Returns
    ///
    /// * `Ok(Some(payload))` - The raw listing payload
    /// * `Ok(None)` - Gone, throttled past the retry budget, or unreachable
    ///   this cycle; the next scheduled listing retries naturally
    pub async fn list_new(&self, subreddit: &str, after: Option<&str>) -> Result<Option<Value>> {
        let mut url = self
            .base
            .join(&format!("r/{}/new.json", subreddit))
            .map_err(|e| DriftnetError::BadEndpoint(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.listing_limit.to_string())
            .append_pair("raw_json", "1");
        if let Some(after) = after {
            url.query_pairs_mut().append_pair("after", after);
        }
        self.get_json(url).await
    }

    /// Fetches a submission together with its first-level comments
    ///
    /// The payload is a two-node array: node 0 holds the submission, node 1
    /// (when present) holds the comment listing.
    pub async fn comments(&self, post_id: &str) -> Result<Option<Value>> {
        let mut url = self
            .base
            .join(&format!("comments/{}.json", post_id))
            .map_err(|e| DriftnetError::BadEndpoint(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("sort", "new")
            .append_pair("depth", "1")
            .append_pair("limit", &self.comment_limit.to_string())
            .append_pair("raw_json", "1");
        self.get_json(url).await
    }

    /// GET with pacing, bounded backoff, and absent-on-exhaustion semantics
    async fn get_json(&self, url: Url) -> Result<Option<Value>> {
        for attempt in 0..self.retry.max_attempts {
            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND {
                        tracing::info!("404 for {}", url);
                        return Ok(None);
                    }

                    // 429/403: backoff and retry
                    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
                        let wait = self.retry.with_jitter(self.retry.throttle_delay(attempt));
                        tracing::warn!("{} on {}; sleeping {:?}", status.as_u16(), url, wait);
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if !status.is_success() {
                        let wait = self.retry.with_jitter(self.retry.network_delay(attempt));
                        tracing::warn!("HTTP {} on {}; retry in {:?}", status.as_u16(), url, wait);
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    match response.json::<Value>().await {
                        Ok(payload) => {
                            self.pace().await;
                            return Ok(Some(payload));
                        }
                        Err(e) => {
                            let wait = self.retry.with_jitter(self.retry.network_delay(attempt));
                            tracing::warn!("bad body from {}: {}; retry in {:?}", url, e, wait);
                            tokio::time::sleep(wait).await;
                        }
                    }
                }
                Err(e) => {
                    let wait = self.retry.with_jitter(self.retry.network_delay(attempt));
                    tracing::warn!("HTTP error {}; retry in {:?}", e, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }

        tracing::error!("giving up on {}", url);
        Ok(None)
    }

    /// Minimum inter-request spacing, applied after every successful fetch
    async fn pace(&self) {
        let wait = super::retry::jittered(self.min_spacing, self.spacing_jitter);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> RedditClient {
        let config = RedditConfig {
            base_url: base_url.to_string(),
            subreddits: vec![],
            listing_limit: 100,
            comment_limit: 500,
            min_spacing_ms: 0,
            spacing_jitter_ms: 0,
        };
        let user_agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        RedditClient::new(&config, &user_agent)
            .unwrap()
            .with_retry(RetryPolicy::fast())
    }

    #[tokio::test]
    async fn test_list_new_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"children": [], "after": null}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let payload = client.list_new("politics", None).await.unwrap();
        assert!(payload.is_some());
    }

    #[tokio::test]
    async fn test_after_cursor_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .and(query_param("after", "t3_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"children": [], "after": null}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let payload = client.list_new("politics", Some("t3_abc")).await.unwrap();
        assert!(payload.is_some());
    }

    #[tokio::test]
    async fn test_not_found_maps_to_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/deadbeef.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let payload = client.comments("deadbeef").await.unwrap();
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_persistent_throttling_degrades_to_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .respond_with(ResponseTemplate::new(429))
            .expect(6)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        // Exhaustion is not an error, just absent data for this cycle
        let payload = client.list_new("politics", None).await.unwrap();
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_throttle_then_success_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"children": [], "after": null}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let payload = client.list_new("politics", None).await.unwrap();
        assert!(payload.is_some());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/abc.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/comments/abc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let payload = client.comments("abc").await.unwrap();
        assert!(payload.is_some());
    }
}
