//! Content fetching from URLs, files, and stdin.
//!
//! This module provides functions for retrieving HTML content from
//! various sources: HTTP/HTTPS URLs (feature `fetch`), local files, and
//! standard input.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use tracing::debug;
#[cfg(feature = "fetch")]
use url::Url;

use crate::{Result, SitemarkError};

/// HTTP client configuration for fetching web pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Sitemark/0.1)".to_string() }
    }
}

/// Fetches HTML content from a URL.
///
/// Performs an HTTP GET with browser-like `Accept` headers, follows
/// redirects and fails on non-success status codes. Only `http` and `https`
/// URLs are accepted.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| SitemarkError::InvalidUrl(format!("{}: {}", url, e)))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(SitemarkError::InvalidUrl(format!("URL must use http:// or https://: {}", url)));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(SitemarkError::HttpError)?;

    debug!(url, timeout = config.timeout, "fetching page");

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() { SitemarkError::Timeout { timeout: config.timeout } } else { SitemarkError::HttpError(e) }
    };

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
        .send()
        .await
        .map_err(map_err)?
        .error_for_status()?;

    let content = response.text().await.map_err(map_err)?;
    debug!(url, bytes = content.len(), "fetched page");

    Ok(content)
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        return Err(SitemarkError::FileNotFound(path_buf));
    }

    let bytes = fs::read(&path_buf)?;
    String::from_utf8(bytes).map_err(|_| SitemarkError::InvalidEncoding)
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;

    String::from_utf8(buffer).map_err(|_| SitemarkError::InvalidEncoding)
}
