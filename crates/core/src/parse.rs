//! HTML parsing and DOM manipulation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML, querying it with CSS selectors, and detaching unwanted subtrees.
//!
//! # Example
//!
//! ```rust
//! use sitemark_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{Result, SitemarkError};

/// Parses a CSS selector, mapping failures to [`SitemarkError::HtmlParseError`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| SitemarkError::HtmlParseError(format!("Invalid selector '{}': {}", selector, e)))
}

/// Represents a parsed HTML document.
///
/// A Document owns the node arena for one page. Pruning detaches nodes in
/// place: detached subtrees stay in the arena but are no longer reachable
/// from the root, so later selections and traversals never see them.
///
/// # Example
///
/// ```rust
/// use sitemark_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// # Errors
    ///
    /// Returns [`SitemarkError::EmptyDocument`] when the input is empty or
    /// whitespace only. Any other input parses; the HTML5 parser recovers from
    /// malformed markup.
    pub fn parse(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(SitemarkError::EmptyDocument);
        }

        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML and records the URL the page was fetched from.
    pub fn parse_with_url(html: &str, base_url: Url) -> Result<Self> {
        let mut doc = Self::parse(html)?;
        doc.base_url = Some(base_url);
        Ok(doc)
    }

    /// Gets the base URL used for resolving relative links.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the reachable tree back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SitemarkError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sitemark_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.root_element().select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Returns the first element in document order matching `selector`.
    pub fn select_first(&'_ self, selector: &Selector) -> Option<Element<'_>> {
        self.html.root_element().select(selector).next().map(|el| Element { element: el })
    }

    /// Gets the raw text of the `<title>` element, if present.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html.root_element().select(&selector).next().map(|el| el.text().collect::<String>())
    }

    /// Gets the `<body>` element, falling back to the root element.
    pub fn body(&'_ self) -> Element<'_> {
        let body = Selector::parse("body").ok().and_then(|sel| self.html.root_element().select(&sel).next());
        Element { element: body.unwrap_or_else(|| self.html.root_element()) }
    }

    /// Gets the root `<html>` element.
    pub fn root(&'_ self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Detaches every element matching `selector` together with its subtree.
    ///
    /// Returns the number of elements detached. Matches nested inside an
    /// element detached by the same call are counted but are already gone
    /// with their ancestor. Running the same selector again detaches nothing.
    /// The root `<html>` element is never detached.
    pub fn detach(&mut self, selector: &Selector) -> usize {
        let ids: Vec<_> = self
            .html
            .root_element()
            .select(selector)
            .filter(|el| el.parent().is_some_and(|parent| parent.parent().is_some()))
            .map(|el| el.id())
            .collect();

        for id in &ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }

        ids.len()
    }

    /// Gets all text content from the reachable document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use sitemark_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Wraps a scraper element reference.
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Gets the underlying scraper element reference.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SitemarkError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <div class="ad"><p class="content">Sponsored</p></div>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.base_url().is_none());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(Document::parse(""), Err(SitemarkError::EmptyDocument)));
        assert!(matches!(Document::parse("  \n\t "), Err(SitemarkError::EmptyDocument)));
    }

    #[test]
    fn test_parse_with_url() {
        let url = Url::parse("https://example.com/post").unwrap();
        let doc = Document::parse_with_url(SAMPLE_HTML, url.clone()).unwrap();
        assert_eq!(doc.base_url(), Some(&url));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
        assert_eq!(elements[0].tag_name(), "a");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(SitemarkError::HtmlParseError(_))));
    }

    #[test]
    fn test_body_fallback() {
        let doc = Document::parse("<p>Loose paragraph</p>").unwrap();
        assert_eq!(doc.body().tag_name(), "body");
        assert!(doc.body().text().contains("Loose paragraph"));
    }

    #[test]
    fn test_detach_removes_subtree() {
        let mut doc = Document::parse(SAMPLE_HTML).unwrap();
        let ad = parse_selector("div.ad").unwrap();

        assert_eq!(doc.detach(&ad), 1);
        assert!(!doc.text_content().contains("Sponsored"));
        assert_eq!(doc.select("p.content").unwrap().len(), 2);
        assert_eq!(doc.detach(&ad), 0);
    }

    #[test]
    fn test_detach_nested_matches() {
        let mut doc = Document::parse("<div><div><div>deep</div></div></div><p>kept</p>").unwrap();
        let divs = parse_selector("div").unwrap();

        assert_eq!(doc.detach(&divs), 3);
        assert!(doc.select("div").unwrap().is_empty());
        assert!(doc.text_content().contains("kept"));
        assert_eq!(doc.detach(&divs), 0);
    }

    #[test]
    fn test_queries_skip_detached_subtrees() {
        let mut doc =
            Document::parse(r#"<div class="sidebar"><p class="lead">Ad</p></div><p class="lead">Real</p>"#).unwrap();

        assert_eq!(doc.detach(&parse_selector(".sidebar").unwrap()), 1);

        let lead = parse_selector("p.lead").unwrap();
        assert_eq!(doc.select_first(&lead).map(|el| el.text()), Some("Real".to_string()));
        assert_eq!(doc.select("p.lead").unwrap().len(), 1);
    }
}
