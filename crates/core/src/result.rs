//! Extraction results and the response records built from them.
//!
//! [`ExtractionResult`] and [`LinkListing`] are what the pipeline returns.
//! [`ParseResponse`] and [`LinksResponse`] are the wire shapes used by the
//! HTTP server and the CLI's JSON output: on failure `success` is false, the
//! payload fields are empty and `error` carries the message.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SitemarkError;
use crate::formatters::{JsonConfig, JsonFormatter};
use crate::links::Link;

/// Output format options for the CLI and formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Markdown body only.
    #[default]
    Markdown,
    /// The full parse response as JSON.
    Json,
    /// One `url<TAB>title` line per link.
    Links,
}

impl FromStr for OutputFormat {
    type Err = SitemarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "links" => Ok(Self::Links),
            _ => Err(SitemarkError::ConfigError(format!(
                "Invalid format: {}. Valid options: markdown, json, links",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Links => "links",
        };
        f.write_str(name)
    }
}

/// The result of running a page through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Page title, empty when none was found.
    pub title: String,

    /// Markdown rendering of the content root.
    pub markdown: String,

    /// Absolute, de-duplicated links in first-appearance order.
    pub links: Vec<Link>,

    /// The page URL as supplied by the caller.
    pub source_url: String,

    /// Name of the rule that was applied.
    pub rule: String,
}

impl ExtractionResult {
    /// Converts the result to the requested output format.
    pub fn to_format(&self, format: OutputFormat) -> crate::Result<String> {
        match format {
            OutputFormat::Markdown => Ok(self.markdown.clone()),
            OutputFormat::Json => JsonFormatter::new(JsonConfig { pretty: true }).parse_response(self),
            OutputFormat::Links => Ok(links_to_lines(&self.links)),
        }
    }
}

/// The result of the links-only operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkListing {
    pub title: String,
    pub links: Vec<Link>,
    pub source_url: String,
}

/// Render links as tab-separated `url title` lines
pub fn links_to_lines(links: &[Link]) -> String {
    links.iter().map(|link| format!("{}\t{}", link.url, link.title)).collect::<Vec<_>>().join("\n")
}

/// Response body for a parse request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    pub title: String,
    /// Markdown body
    pub content: String,
    pub url: String,
    pub links: Vec<Link>,
    pub error: Option<String>,
}

impl ParseResponse {
    /// A failed response for `url` carrying the error message
    pub fn failure(url: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            title: String::new(),
            content: String::new(),
            url: url.into(),
            links: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Build a response from a pipeline outcome
    pub fn from_result(url: &str, result: crate::Result<ExtractionResult>) -> Self {
        match result {
            Ok(extraction) => extraction.into(),
            Err(e) => Self::failure(url, &e),
        }
    }
}

impl From<ExtractionResult> for ParseResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            success: true,
            title: result.title,
            content: result.markdown,
            url: result.source_url,
            links: result.links,
            error: None,
        }
    }
}

/// Response body for a links-only request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksResponse {
    pub success: bool,
    pub title: String,
    pub links: Vec<Link>,
    pub url: String,
    pub error: Option<String>,
}

impl LinksResponse {
    /// A failed response for `url` carrying the error message
    pub fn failure(url: impl Into<String>, error: impl fmt::Display) -> Self {
        Self { success: false, title: String::new(), links: Vec::new(), url: url.into(), error: Some(error.to_string()) }
    }

    /// Build a response from a links-only outcome
    pub fn from_result(url: &str, result: crate::Result<LinkListing>) -> Self {
        match result {
            Ok(listing) => listing.into(),
            Err(e) => Self::failure(url, &e),
        }
    }
}

impl From<LinkListing> for LinksResponse {
    fn from(listing: LinkListing) -> Self {
        Self { success: true, title: listing.title, links: listing.links, url: listing.source_url, error: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            title: "Title".to_string(),
            markdown: "# Heading\n\nBody".to_string(),
            links: vec![
                Link { url: "https://example.com/a".to_string(), title: "A".to_string() },
                Link { url: "https://example.com/b".to_string(), title: String::new() },
            ],
            source_url: "https://example.com/post".to_string(),
            rule: "default".to_string(),
        }
    }

    #[test]
    fn test_parse_response_from_result() {
        let response = ParseResponse::from(sample());

        assert!(response.success);
        assert_eq!(response.title, "Title");
        assert_eq!(response.content, "# Heading\n\nBody");
        assert_eq!(response.url, "https://example.com/post");
        assert_eq!(response.links.len(), 2);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_parse_response_failure() {
        let response = ParseResponse::from_result("https://example.com/empty", Err(SitemarkError::EmptyDocument));

        assert!(!response.success);
        assert!(response.title.is_empty());
        assert!(response.content.is_empty());
        assert!(response.links.is_empty());
        assert_eq!(response.url, "https://example.com/empty");
        assert_eq!(response.error.as_deref(), Some("Document is empty"));
    }

    #[test]
    fn test_parse_response_wire_shape() {
        let json = serde_json::to_value(ParseResponse::from(sample())).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["content"], "# Heading\n\nBody");
        assert_eq!(json["links"][0]["url"], "https://example.com/a");
        assert_eq!(json["links"][0]["title"], "A");
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_links_response() {
        let listing = LinkListing { title: "T".to_string(), links: sample().links, source_url: "https://example.com".to_string() };
        let response = LinksResponse::from(listing);
        assert!(response.success);
        assert_eq!(response.links.len(), 2);

        let failed = LinksResponse::failure("https://example.com", &SitemarkError::InvalidUrl("bad".to_string()));
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("bad"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Links.to_string(), "links");
        assert!("html".parse::<OutputFormat>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_to_format() {
        let result = sample();

        assert_eq!(result.to_format(OutputFormat::Markdown).unwrap(), "# Heading\n\nBody");
        assert_eq!(
            result.to_format(OutputFormat::Links).unwrap(),
            "https://example.com/a\tA\nhttps://example.com/b\t"
        );

        let json = result.to_format(OutputFormat::Json).unwrap();
        let parsed: ParseResponse = serde_json::from_str(&json).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.title, "Title");
    }
}
