//! HTTP client utilities for network-backed launcher producers.
//!
//! This crate provides a lightweight client used for web-search suggestions
//! and exchange-rate tables. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults (timeout, compression)
//! - Sending a consistent User-Agent and JSON `Accept` header
//! - Rejecting URLs that are not plain `http`/`https`
//!
//! The primary entry point is [`HttpClient`].
//!
//! # Example
//!
//! ```ignore
//! use runbar_api::HttpClient;
//!
//! async fn rates() -> anyhow::Result<serde_json::Value> {
//!     let client = HttpClient::new()?;
//!     client.get_json("https://example.com/rates/usd.json").await
//! }
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Schemes accepted by [`validate_url`].
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client`.
///
/// The client pre-configures default headers and a timeout. Producers never
/// see it directly; they go through the fetch capability on their context.
pub struct HttpClient {
    pub http: Client,
    pub user_agent: String,
}

impl HttpClient {
    /// Construct a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Construct a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            user_agent: format!("runbar/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// Non-success statuses are reported as errors carrying the status code.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let parsed_url = validate_url(url)?;
        debug!(url = %parsed_url, "fetching json");

        let response = self
            .http
            .get(parsed_url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("request to {} returned status {}", url, status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("response from {url} was not valid JSON"))
    }
}

/// Validate and normalise a URL for use by the client.
///
/// The returned URL has a lowercase scheme and host and a percent-encoded
/// path. Rules:
/// - must parse as an absolute URL
/// - scheme must be `http` or `https`
/// - must include a host
pub fn validate_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).map_err(|error| anyhow!("Invalid URL '{}': {}", raw, error))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(anyhow!("URL must use http or https; got '{}://'", parsed.scheme()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(anyhow!("URL '{}' must include a host", raw));
    }

    Ok(parsed)
}
