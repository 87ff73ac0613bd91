//! Imageboard JSON API client
//!
//! The board API exposes a full snapshot of every live thread per board
//! (no pagination) plus a per-thread detail endpoint. A thread that has
//! fallen off the board 404s; that is the normal end of its life, not an
//! error.

use crate::client::{build_http_client, RetryPolicy};
use crate::config::{ImageboardConfig, UserAgentConfig};
use crate::{DriftnetError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

/// Client for the imageboard read API
#[derive(Debug, Clone)]
pub struct ImageboardClient {
    http: Client,
    base: Url,
    retry: RetryPolicy,
}

impl ImageboardClient {
    /// Creates a client from configuration
    pub fn new(config: &ImageboardConfig, user_agent: &UserAgentConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(user_agent)?,
            base: Url::parse(&config.base_url)?,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy (tests shrink the delays)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches the full thread listing for a board
    ///
    /// The payload is a list of pages, each holding an array of thread stubs.
    pub async fn threads(&self, board: &str) -> Result<Option<Value>> {
        let url = self.endpoint(&[board, "threads.json"])?;
        self.get_json(url).await
    }

    /// Fetches all posts in one thread
    ///
    /// # Returns
    ///
    /// * `Ok(Some(payload))` - `{"posts": [...]}` for a live or archived thread
    /// * `Ok(None)` - The thread is gone (404) or unreachable this cycle
    pub async fn thread(&self, board: &str, thread_no: u64) -> Result<Option<Value>> {
        let url = self.endpoint(&[board, "thread", &format!("{}.json", thread_no)])?;
        self.get_json(url).await
    }

    /// Builds the full endpoint URL from path pieces
    fn endpoint(&self, pieces: &[&str]) -> Result<Url> {
        self.base
            .join(&pieces.join("/"))
            .map_err(|e| DriftnetError::BadEndpoint(e.to_string()))
    }

    /// GET with bounded retry on transient failures; 404 maps to absent
    async fn get_json(&self, url: Url) -> Result<Option<Value>> {
        tracing::info!("api call: {}", url);
        for attempt in 0..self.retry.max_attempts {
            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND {
                        tracing::info!("404 for {}", url);
                        return Ok(None);
                    }

                    if !status.is_success() {
                        let wait = self.retry.with_jitter(self.retry.network_delay(attempt));
                        tracing::warn!("HTTP {} on {}; retry in {:?}", status.as_u16(), url, wait);
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    match response.json::<Value>().await {
                        Ok(payload) => return Ok(Some(payload)),
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
}
