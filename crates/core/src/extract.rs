//! Rule-driven extraction over a parsed [`Document`].
//!
//! Title extraction runs on the unpruned document. Pruning detaches every
//! node matched by the rule's exclusion selectors, after which the content
//! root is located.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::parse::{Document, Element, parse_selector};
use crate::rules::Rule;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\n\r\x0C]+").unwrap());

/// Title fallbacks tried after the rule's own selector, in order
const TITLE_FALLBACKS: &[&str] = &["title", r#"meta[name="title"]"#, r#"meta[property="og:title"]"#];

/// Collapse runs of HTML whitespace into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Text of an element used as a title; `<meta>` elements yield their `content`
fn title_text(element: Element<'_>) -> String {
    let raw = if element.tag_name() == "meta" { element.attr("content").unwrap_or_default().to_string() } else { element.text() };
    collapse_whitespace(&raw).trim().to_string()
}

fn first_title(doc: &Document, selector: &str) -> Option<String> {
    let selector = match parse_selector(selector) {
        Ok(selector) => selector,
        Err(e) => {
            warn!(error = %e, "skipping title selector");
            return None;
        }
    };

    doc.select_first(&selector).map(title_text).filter(|title| !title.is_empty())
}

/// Extract the page title
///
/// Tries the rule's title selector, then `<title>`, `meta[name=title]` and
/// `og:title`. Returns an empty string when nothing yields text.
pub fn extract_title(doc: &Document, rule: &Rule) -> String {
    let rule_selector = Some(rule.title_selector.as_str()).filter(|s| !s.is_empty());

    rule_selector
        .into_iter()
        .chain(TITLE_FALLBACKS.iter().copied())
        .find_map(|selector| first_title(doc, selector))
        .unwrap_or_default()
}

/// Detach every node matched by the rule's exclusion selectors, in order
///
/// Returns the number of nodes detached. A selector that fails to parse is
/// logged and skipped.
pub fn prune_excluded(doc: &mut Document, rule: &Rule) -> usize {
    let mut removed = 0;

    for selector in &rule.exclude_selectors {
        match parse_selector(selector) {
            Ok(parsed) => {
                let count = doc.detach(&parsed);
                if count > 0 {
                    debug!(selector = %selector, count, "pruned nodes");
                }
                removed += count;
            }
            Err(e) => warn!(rule = %rule.name, error = %e, "skipping exclusion selector"),
        }
    }

    removed
}

/// Locate the element whose subtree becomes the Markdown body
///
/// First match of the rule's content selector, else `<body>`, else the root
/// element.
pub fn locate_content_root<'a>(doc: &'a Document, rule: &Rule) -> Element<'a> {
    if !rule.content_selector.is_empty() {
        match parse_selector(&rule.content_selector) {
            Ok(selector) => {
                if let Some(element) = doc.select_first(&selector) {
                    return element;
                }
                debug!(selector = %rule.content_selector, "content selector matched nothing, using body");
            }
            Err(e) => warn!(rule = %rule.name, error = %e, "skipping content selector"),
        }
    }

    doc.body()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PAGE: &str = r#"
        <html>
        <head>
            <title>  Page
                Title </title>
            <meta property="og:title" content="OG Title">
        </head>
        <body>
            <h1 class="headline">Rule   Title</h1>
            <nav>Menu</nav>
            <div id="post">
                <p>Body text</p>
                <div class="ad">Buy now</div>
                <script>track();</script>
            </div>
        </body>
        </html>
    "#;

    #[rstest]
    #[case("h1.headline", "Rule Title")]
    #[case("", "Page Title")]
    #[case(".missing", "Page Title")]
    #[case(r#"meta[property="og:title"]"#, "OG Title")]
    #[case("nav", "Menu")]
    fn test_extract_title(#[case] selector: &str, #[case] expected: &str) {
        let doc = Document::parse(PAGE).unwrap();
        let rule = Rule::new("test").with_title(selector);
        assert_eq!(extract_title(&doc, &rule), expected);
    }

    #[test]
    fn test_title_meta_fallbacks() {
        let doc = Document::parse(r#"<head><meta name="title" content="Meta Title"></head><p>x</p>"#).unwrap();
        assert_eq!(extract_title(&doc, &Rule::new("t")), "Meta Title");

        let doc = Document::parse(r#"<head><meta property="og:title" content="OG"></head><p>x</p>"#).unwrap();
        assert_eq!(extract_title(&doc, &Rule::new("t")), "OG");
    }

    #[test]
    fn test_title_empty_when_nothing_matches() {
        let doc = Document::parse("<p>No title here</p>").unwrap();
        assert_eq!(extract_title(&doc, &Rule::new("t").with_title("h1")), "");
    }

    #[test]
    fn test_empty_title_element_falls_through() {
        let doc = Document::parse(r#"<head><title> </title><meta property="og:title" content="OG"></head>"#).unwrap();
        assert_eq!(extract_title(&doc, &Rule::new("t")), "OG");
    }

    #[test]
    fn test_prune_excluded() {
        let mut doc = Document::parse(PAGE).unwrap();
        let rule = Rule::new("test").with_exclude("script").with_exclude(".ad").with_exclude("nav");

        assert_eq!(prune_excluded(&mut doc, &rule), 3);
        let text = doc.text_content();
        assert!(!text.contains("Buy now"));
        assert!(!text.contains("track()"));
        assert!(!text.contains("Menu"));
        assert!(text.contains("Body text"));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut doc = Document::parse(PAGE).unwrap();
        let rule = Rule::new("test").with_exclude(".ad").with_exclude("script");

        prune_excluded(&mut doc, &rule);
        let once = doc.as_string();

        assert_eq!(prune_excluded(&mut doc, &rule), 0);
        assert_eq!(doc.as_string(), once);
    }

    #[test]
    fn test_prune_is_idempotent_with_nested_matches() {
        let mut doc = Document::parse("<div><div>x</div></div><section><div><p>y</p></div></section>").unwrap();
        let rule = Rule::new("test").with_exclude("div");

        assert_eq!(prune_excluded(&mut doc, &rule), 3);
        let once = doc.as_string();

        assert_eq!(prune_excluded(&mut doc, &rule), 0);
        assert_eq!(doc.as_string(), once);
    }

    #[test]
    fn test_content_root_skips_matches_inside_excluded_region() {
        let mut doc = Document::parse(
            r#"<div class="sidebar"><p class="lead">AD COPY</p></div><article><p class="lead">Real lead</p></article>"#,
        )
        .unwrap();
        let rule = Rule::new("t").with_content("p.lead").with_exclude(".sidebar");

        prune_excluded(&mut doc, &rule);
        assert_eq!(locate_content_root(&doc, &rule).text(), "Real lead");
    }

    #[test]
    fn test_prune_skips_invalid_selector() {
        let mut doc = Document::parse(PAGE).unwrap();
        let rule = Rule::new("test").with_exclude("p[[").with_exclude(".ad");

        assert_eq!(prune_excluded(&mut doc, &rule), 1);
    }

    #[test]
    fn test_locate_content_root() {
        let doc = Document::parse(PAGE).unwrap();

        let root = locate_content_root(&doc, &Rule::new("t").with_content("#post"));
        assert_eq!(root.attr("id"), Some("post"));

        let root = locate_content_root(&doc, &Rule::new("t").with_content(".missing"));
        assert_eq!(root.tag_name(), "body");

        let root = locate_content_root(&doc, &Rule::new("t"));
        assert_eq!(root.tag_name(), "body");
    }

    #[test]
    fn test_content_root_after_pruning_ancestor() {
        let mut doc = Document::parse(PAGE).unwrap();
        let rule = Rule::new("t").with_content(".ad").with_exclude("#post");

        prune_excluded(&mut doc, &rule);
        assert_eq!(locate_content_root(&doc, &rule).tag_name(), "body");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b"), "a b");
        assert_eq!(collapse_whitespace("a\u{a0}b"), "a\u{a0}b");
    }
}
