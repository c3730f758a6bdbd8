use crate::Result;
use crate::result::{ExtractionResult, LinkListing, LinksResponse, ParseResponse};
use serde::Serialize;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Serialize any response record
pub fn convert_to_json<T: Serialize>(value: &T, config: &JsonConfig) -> Result<String> {
    if config.pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

/// JSON formatter with configurable options
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Format a parse outcome as a parse response
    pub fn parse_response(&self, result: &ExtractionResult) -> Result<String> {
        convert_to_json(&ParseResponse::from(result.clone()), &self.config)
    }

    /// Format a links-only outcome as a links response
    pub fn links_response(&self, listing: &LinkListing) -> Result<String> {
        convert_to_json(&LinksResponse::from(listing.clone()), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::Link;

    fn result() -> ExtractionResult {
        ExtractionResult {
            title: "Title".to_string(),
            markdown: "Body".to_string(),
            links: vec![Link { url: "https://example.com/".to_string(), title: "Home".to_string() }],
            source_url: "https://example.com/post".to_string(),
            rule: "default".to_string(),
        }
    }

    #[test]
    fn test_convert_to_json_compact() {
        let json = convert_to_json(&ParseResponse::from(result()), &JsonConfig::default()).unwrap();
        assert!(json.starts_with(r#"{"success":true,"title":"Title","content":"Body""#));
        assert!(json.contains(r#""error":null"#));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_convert_to_json_pretty() {
        let json = convert_to_json(&ParseResponse::from(result()), &JsonConfig { pretty: true }).unwrap();
        assert!(json.contains("\n  \"success\": true"));
    }

    #[test]
    fn test_json_formatter() {
        let formatter = JsonFormatter::new(JsonConfig::default());

        let parsed = formatter.parse_response(&result()).unwrap();
        assert!(parsed.contains(r#""url":"https://example.com/post""#));

        let listing =
            LinkListing { title: "T".to_string(), links: result().links, source_url: "https://example.com".to_string() };
        let links = formatter.links_response(&listing).unwrap();
        assert!(links.contains(r#""links":[{"url":"https://example.com/","title":"Home"}]"#));
        assert!(!links.contains("content"));
    }
}
