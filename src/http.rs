//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry for platform API reads (max 3 retries)
//! - Single-attempt JSON posts for notifications

use crate::error::{DiscoveryError, NotifyError};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("renovates/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// One page of a paginated API listing
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub headers: HeaderMap,
}

/// HTTP client wrapper with retry logic
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// GET one page of a JSON array, retrying rate limits and network errors
    ///
    /// `build` is called once per attempt so authentication headers can be
    /// attached by the caller.
    pub async fn get_page<T, F>(&self, platform: &str, build: F) -> Result<Page<T>, DiscoveryError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(DiscoveryError::api_error(
                            platform,
                            "rate limit exceeded",
                        ));
                    } else if !status.is_success() {
                        return Err(DiscoveryError::api_error(
                            platform,
                            format!("HTTP {}", status),
                        ));
                    } else {
                        let headers = response.headers().clone();
                        let items = response.json::<Vec<T>>().await.map_err(|e| {
                            DiscoveryError::api_error(
                                platform,
                                format!("failed to parse JSON: {}", e),
                            )
                        })?;
                        return Ok(Page { items, headers });
                    }
                }
                Err(e) => {
                    last_error = Some(DiscoveryError::api_error(platform, e.to_string()));
                }
            }

            if attempt < self.max_retries {
                debug!(platform, attempt, delay_ms = delay, "Retrying platform API request");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| DiscoveryError::api_error(platform, "unknown error")))
    }

    /// POST a JSON payload once, treating any status >= 400 as failure
    pub async fn post_json<P: Serialize + ?Sized>(
        &self,
        notifier: &str,
        url: &str,
        payload: &P,
    ) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(payload).map_err(|e| NotifyError::Marshal {
            notifier: notifier.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| NotifyError::network(notifier, e.to_string()))?;

        if response.status().as_u16() >= 400 {
            return Err(NotifyError::status(notifier, response.status().as_u16()));
        }
        Ok(())
    }
}
