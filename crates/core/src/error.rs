//! Error types for Sitemark operations.
//!
//! [`SitemarkError`] covers three groups of failures:
//!
//! - configuration errors, raised while rule files are loaded and the
//!   [`RuleIndex`](crate::RuleIndex) is validated; these are fatal at start-up,
//! - extraction errors, raised when a page cannot be turned into a document,
//! - collaborator errors from fetching pages or writing output.
//!
//! Soft failures such as a selector that matches nothing are not errors; they
//! produce degraded but successful results.
//!
//! # Example
//!
//! ```rust
//! use sitemark_core::{SitemarkError, Result};
//!
//! fn check(html: &str) -> Result<()> {
//!     if html.trim().is_empty() {
//!         return Err(SitemarkError::EmptyDocument);
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rule loading, extraction and fetching.
#[derive(Error, Debug)]
pub enum SitemarkError {
    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a page URL cannot be parsed or cannot serve as a base
    /// for resolving relative links.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, including invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The page body is not valid UTF-8.
    #[error("Invalid character encoding")]
    InvalidEncoding,

    /// The supplied HTML is empty or whitespace only.
    #[error("Document is empty")]
    EmptyDocument,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Rule index validation errors.
    ///
    /// Missing default rule, domain mappings pointing at unknown rules, or
    /// selectors that do not parse.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Rule file syntax errors.
    #[error("Rule file error: {0}")]
    RuleFileError(String),

    /// Response serialization errors.
    #[error("Failed to serialize output: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SitemarkError {
    /// True for errors raised while loading or validating rules.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SitemarkError::ConfigError(_) | SitemarkError::RuleFileError(_))
    }
}

/// Result type alias for SitemarkError.
pub type Result<T> = std::result::Result<T, SitemarkError>;
