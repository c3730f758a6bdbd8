//! The extraction pipeline.
//!
//! [`Extractor`] wires the rule store, DOM extractor, link collector and
//! Markdown transformer together. It borrows a [`RuleIndex`] and holds no
//! other state, so one extractor can serve any number of pages.
//!
//! # Example
//!
//! ```rust
//! use sitemark_core::{Extractor, RuleIndex};
//!
//! let rules = RuleIndex::with_builtin_default();
//! let extractor = Extractor::new(&rules);
//!
//! let html = "<html><head><title>Post</title></head><body><h1>H</h1><p>P</p></body></html>";
//! let result = extractor.parse_page(html, "https://example.com/post", None).unwrap();
//!
//! assert_eq!(result.title, "Post");
//! assert_eq!(result.markdown, "# H\n\nP");
//! ```

use tracing::debug;
use url::Url;

use crate::extract::{collapse_whitespace, extract_title, locate_content_root, prune_excluded};
use crate::formatters::markdown::{MarkdownConfig, convert_to_markdown};
use crate::links::{LinkScope, collect_links};
use crate::parse::Document;
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::result::{ExtractionResult, LinkListing};
use crate::rules::RuleIndex;
use crate::{Result, SitemarkError};

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, fetch_url};

/// Configuration for the extraction pipeline.
///
/// # Example
///
/// ```rust
/// use sitemark_core::{ExtractConfig, LinkScope};
///
/// let config = ExtractConfig::builder()
///     .link_scope(LinkScope::Content)
///     .include_title_heading(true)
///     .strip_images(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Where links are collected from (default: the whole document).
    pub link_scope: LinkScope,

    /// Whether to prepend `# <title>` to the Markdown (default: false).
    pub include_title_heading: bool,

    /// Raw HTML rewrites applied before parsing.
    pub preprocess: PreprocessConfig,
}

impl ExtractConfig {
    /// Creates a new builder for ExtractConfig.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }
}

/// Builder for ExtractConfig.
#[derive(Debug, Default)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where links are collected from.
    pub fn link_scope(mut self, value: LinkScope) -> Self {
        self.config.link_scope = value;
        self
    }

    /// Sets whether the title is prepended as a heading.
    pub fn include_title_heading(mut self, value: bool) -> Self {
        self.config.include_title_heading = value;
        self
    }

    /// Sets whether images are removed before parsing.
    pub fn strip_images(mut self, value: bool) -> Self {
        self.config.preprocess.strip_images = value;
        self
    }

    /// Replaces the preprocessing configuration.
    pub fn preprocess(mut self, value: PreprocessConfig) -> Self {
        self.config.preprocess = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

/// Turns raw HTML into an [`ExtractionResult`] or a [`LinkListing`].
#[derive(Debug, Clone)]
pub struct Extractor<'r> {
    rules: &'r RuleIndex,
    config: ExtractConfig,
}

impl<'r> Extractor<'r> {
    /// Creates an extractor with default settings.
    pub fn new(rules: &'r RuleIndex) -> Self {
        Self { rules, config: ExtractConfig::default() }
    }

    /// Creates an extractor with a custom configuration.
    pub fn with_config(rules: &'r RuleIndex, config: ExtractConfig) -> Self {
        Self { rules, config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn rules(&self) -> &'r RuleIndex {
        self.rules
    }

    /// Parses a page into title, Markdown and links.
    ///
    /// `url` is the page's address: it selects the rule (unless `rule_name`
    /// names a loaded rule) and is the base for relative links. An empty
    /// `url` means the page has no address; relative links are then dropped.
    ///
    /// # Errors
    ///
    /// [`SitemarkError::EmptyDocument`] for empty or whitespace-only HTML and
    /// [`SitemarkError::InvalidUrl`] for a non-empty `url` that does not parse.
    /// A page where nothing matches is still a successful, if sparse, result.
    pub fn parse_page(&self, html: &str, url: &str, rule_name: Option<&str>) -> Result<ExtractionResult> {
        let mut doc = self.document(html, url)?;
        let rule = self.rules.resolve(rule_name, url);
        debug!(url, rule = %rule.name, "parsing page");

        let title = extract_title(&doc, rule);

        let mut links = match self.config.link_scope {
            LinkScope::Document => collect_links(doc.root(), doc.base_url()),
            LinkScope::Content => Vec::new(),
        };

        let pruned = prune_excluded(&mut doc, rule);
        let root = locate_content_root(&doc, rule);

        if self.config.link_scope == LinkScope::Content {
            links = collect_links(root, doc.base_url());
        }

        let markdown_config = MarkdownConfig { include_title_heading: self.config.include_title_heading };
        let markdown = convert_to_markdown(root, &title, doc.base_url(), &markdown_config);

        debug!(url, pruned, links = links.len(), chars = markdown.len(), "page parsed");

        Ok(ExtractionResult {
            title,
            markdown,
            links,
            source_url: url.to_string(),
            rule: rule.name.clone(),
        })
    }

    /// Lists the links of a page without applying any rule.
    ///
    /// The title comes from the page's own `<title>` element.
    pub fn list_links(&self, html: &str, url: &str) -> Result<LinkListing> {
        let doc = self.document(html, url)?;

        let title = doc.title().map(|t| collapse_whitespace(&t).trim().to_string()).unwrap_or_default();
        let links = collect_links(doc.root(), doc.base_url());
        debug!(url, links = links.len(), "listed links");

        Ok(LinkListing { title, links, source_url: url.to_string() })
    }

    /// Fetches a page over HTTP and parses it.
    #[cfg(feature = "fetch")]
    pub async fn fetch_and_parse(
        &self, url: &str, rule_name: Option<&str>, fetch_config: &FetchConfig,
    ) -> Result<ExtractionResult> {
        let html = fetch_url(url, fetch_config).await?;
        self.parse_page(&html, url, rule_name)
    }

    /// Fetches a page over HTTP and lists its links.
    #[cfg(feature = "fetch")]
    pub async fn fetch_and_list_links(&self, url: &str, fetch_config: &FetchConfig) -> Result<LinkListing> {
        let html = fetch_url(url, fetch_config).await?;
        self.list_links(&html, url)
    }

    fn document(&self, html: &str, url: &str) -> Result<Document> {
        if html.trim().is_empty() {
            return Err(SitemarkError::EmptyDocument);
        }

        let html = preprocess_html(html, &self.config.preprocess);

        if url.trim().is_empty() {
            return Document::parse(&html);
        }

        let base_url = Url::parse(url.trim()).map_err(|e| SitemarkError::InvalidUrl(format!("{}: {}", url, e)))?;
        Document::parse_with_url(&html, base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::Link;
    use crate::rules::Rule;

    const ARTICLE: &str = r##"
        <html>
        <head><title>Blog | Post title</title></head>
        <body>
            <nav><a href="/">Home</a><a href="/about">About</a></nav>
            <h1 class="post-title">Post title</h1>
            <div class="post">
                <p>First <a href="/refs/1">reference</a>.</p>
                <div class="share"><a href="https://share.example.org/?u=1">Share</a></div>
                <script>tracker();</script>
                <style>.post { color: red; }</style>
            </div>
            <footer><a href="/about">About us</a></footer>
        </body>
        </html>
    "##;

    fn rules() -> RuleIndex {
        RuleIndex::builder()
            .rule(Rule::builtin_default())
            .rule(
                Rule::new("blog")
                    .with_title("h1.post-title")
                    .with_content("div.post")
                    .with_exclude(".share")
                    .with_exclude("script")
                    .with_exclude("style")
                    .with_domain("blog.example.com"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_page_with_mapped_rule() {
        let rules = rules();
        let result = Extractor::new(&rules).parse_page(ARTICLE, "https://blog.example.com/post/1", None).unwrap();

        assert_eq!(result.rule, "blog");
        assert_eq!(result.title, "Post title");
        assert_eq!(result.markdown, "First [reference](https://blog.example.com/refs/1).");
        assert!(!result.markdown.contains("tracker"));
        assert!(!result.markdown.contains("color: red"));
        assert_eq!(result.source_url, "https://blog.example.com/post/1");
    }

    #[test]
    fn test_document_scope_links_include_pruned_nodes() {
        let rules = rules();
        let result = Extractor::new(&rules).parse_page(ARTICLE, "https://blog.example.com/post/1", None).unwrap();

        let urls: Vec<&str> = result.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://blog.example.com/",
                "https://blog.example.com/about",
                "https://blog.example.com/refs/1",
                "https://share.example.org/?u=1",
            ]
        );
        assert_eq!(result.links[1].title, "About");
    }

    #[test]
    fn test_content_scope_links() {
        let rules = rules();
        let config = ExtractConfig::builder().link_scope(LinkScope::Content).build();
        let result =
            Extractor::with_config(&rules, config).parse_page(ARTICLE, "https://blog.example.com/post/1", None).unwrap();

        assert_eq!(
            result.links,
            vec![Link { url: "https://blog.example.com/refs/1".to_string(), title: "reference".to_string() }]
        );
    }

    #[test]
    fn test_default_rule_for_unmapped_domain() {
        let rules = rules();
        let result = Extractor::new(&rules).parse_page(ARTICLE, "https://other.example.net/", None).unwrap();

        assert_eq!(result.rule, "default");
        assert_eq!(result.title, "Blog | Post title");
        assert!(!result.markdown.contains("Home"));
        assert!(!result.markdown.contains("About us"));
        assert!(result.markdown.starts_with("# Post title"));
    }

    #[test]
    fn test_content_root_never_comes_from_stripped_region() {
        let rules = RuleIndex::builder()
            .rule(Rule::builtin_default())
            .rule(Rule::new("lead").with_content("p.lead").with_exclude(".sidebar"))
            .build()
            .unwrap();
        let html = r#"<body><div class="sidebar"><p class="lead">AD COPY</p></div><article><p class="lead">Real lead</p></article></body>"#;

        let result = Extractor::new(&rules).parse_page(html, "https://example.com/", Some("lead")).unwrap();
        assert_eq!(result.markdown, "Real lead");
    }

    #[test]
    fn test_explicit_rule_name() {
        let rules = rules();
        let result = Extractor::new(&rules).parse_page(ARTICLE, "https://other.example.net/", Some("blog")).unwrap();
        assert_eq!(result.rule, "blog");
        assert_eq!(result.title, "Post title");
    }

    #[test]
    fn test_title_heading_option() {
        let rules = rules();
        let config = ExtractConfig::builder().include_title_heading(true).build();
        let result =
            Extractor::with_config(&rules, config).parse_page(ARTICLE, "https://blog.example.com/p", None).unwrap();

        assert!(result.markdown.starts_with("# Post title\n\nFirst"));
    }

    #[test]
    fn test_empty_html_is_error() {
        let rules = rules();
        let extractor = Extractor::new(&rules);

        assert!(matches!(extractor.parse_page("", "https://example.com", None), Err(SitemarkError::EmptyDocument)));
        assert!(matches!(extractor.list_links(" \n ", "https://example.com"), Err(SitemarkError::EmptyDocument)));
    }

    #[test]
    fn test_invalid_url_is_error() {
        let rules = rules();
        let result = Extractor::new(&rules).parse_page(ARTICLE, "not a url", None);
        assert!(matches!(result, Err(SitemarkError::InvalidUrl(_))));
    }

    #[test]
    fn test_page_without_url_drops_relative_links() {
        let rules = rules();
        let html = r#"<body><a href="/local">Local</a><a href="https://example.com/abs">Abs</a></body>"#;
        let result = Extractor::new(&rules).parse_page(html, "", None).unwrap();

        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].url, "https://example.com/abs");
        assert_eq!(result.markdown, "Local[Abs](https://example.com/abs)");
    }

    #[test]
    fn test_list_links() {
        let rules = rules();
        let listing = Extractor::new(&rules).list_links(ARTICLE, "https://blog.example.com/post/1").unwrap();

        assert_eq!(listing.title, "Blog | Post title");
        assert_eq!(listing.links.len(), 4);
        assert_eq!(listing.source_url, "https://blog.example.com/post/1");
    }

    #[test]
    fn test_strip_images() {
        let rules = rules();
        let html = r#"<body><p>Text <img src="/a.png" alt="A"></p></body>"#;

        let kept = Extractor::new(&rules).parse_page(html, "https://example.com/", None).unwrap();
        assert_eq!(kept.markdown, "Text ![A](https://example.com/a.png)");

        let config = ExtractConfig::builder().strip_images(true).build();
        let stripped = Extractor::with_config(&rules, config).parse_page(html, "https://example.com/", None).unwrap();
        assert_eq!(stripped.markdown, "Text");
    }
}
