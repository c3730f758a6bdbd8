use crate::error::{Result, SitemarkError};
use crate::parse::parse_selector;
use serde::Serialize;

/// Name of the rule used when nothing more specific matches.
pub const DEFAULT_RULE_NAME: &str = "default";

/// Represents a single rule file directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// CSS selector for the title element
    Title(String),
    /// CSS selector for the content root
    Body(String),
    /// CSS selector for nodes removed before rendering
    Strip(String),
    /// Host served by this rule
    Domain(String),
}

/// Declarative selector set governing how one site's pages are extracted.
///
/// Empty selectors mean "use the fallback": the page's own title element for
/// the title, the document body for the content root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    pub title_selector: String,
    pub content_selector: String,
    /// Applied in listed order
    pub exclude_selectors: Vec<String>,
    /// Hosts declared by the rule file
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
}

impl Rule {
    /// Create an empty rule that relies on every fallback
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// The rule installed when no `default` rule file exists
    pub fn builtin_default() -> Self {
        Self {
            name: DEFAULT_RULE_NAME.to_string(),
            title_selector: "title".to_string(),
            content_selector: "body".to_string(),
            exclude_selectors: ["script", "style", "nav", "footer"].iter().map(|s| s.to_string()).collect(),
            domains: Vec::new(),
        }
    }

    pub fn with_title(mut self, selector: impl Into<String>) -> Self {
        self.title_selector = selector.into();
        self
    }

    pub fn with_content(mut self, selector: impl Into<String>) -> Self {
        self.content_selector = selector.into();
        self
    }

    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.exclude_selectors.push(selector.into());
        self
    }

    pub fn with_domain(mut self, host: impl Into<String>) -> Self {
        self.domains.push(normalize_host(&host.into()));
        self
    }

    /// Add a directive to this rule
    ///
    /// `title` and `body` may appear at most once per rule.
    pub fn add_directive(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::Title(selector) => {
                if !self.title_selector.is_empty() {
                    return Err(SitemarkError::RuleFileError("title declared more than once".to_string()));
                }
                self.title_selector = selector;
            }
            Directive::Body(selector) => {
                if !self.content_selector.is_empty() {
                    return Err(SitemarkError::RuleFileError("body declared more than once".to_string()));
                }
                self.content_selector = selector;
            }
            Directive::Strip(selector) => self.exclude_selectors.push(selector),
            Directive::Domain(host) => self.domains.push(normalize_host(&host)),
        }
        Ok(())
    }

    /// Check that every non-empty selector parses as CSS
    pub fn validate(&self) -> Result<()> {
        let selectors = [&self.title_selector, &self.content_selector].into_iter().chain(self.exclude_selectors.iter());

        for selector in selectors.filter(|s| !s.is_empty()) {
            parse_selector(selector)
                .map_err(|e| SitemarkError::ConfigError(format!("rule '{}': {}", self.name, e)))?;
        }

        Ok(())
    }
}

/// Lowercase a host and drop a trailing dot
pub(crate) fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Parse a directive line from rule file format
pub fn parse_directive(line: &str) -> Result<Directive> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(SitemarkError::RuleFileError("Empty or comment line".to_string()));
    }

    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| SitemarkError::RuleFileError(format!("Invalid directive format: {}", line)))?;
    let key = key.trim();
    let value = value.trim();

    if value.is_empty() {
        return Err(SitemarkError::RuleFileError(format!("Missing value for directive: {}", key)));
    }

    match key {
        "title" => Ok(Directive::Title(value.to_string())),
        "body" => Ok(Directive::Body(value.to_string())),
        "strip" => Ok(Directive::Strip(value.to_string())),
        "domain" => Ok(Directive::Domain(value.to_string())),
        _ => Err(SitemarkError::RuleFileError(format!("Unknown directive: {}", key))),
    }
}
