//! Link collection: resolve, filter and dedupe anchors in a subtree.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::SitemarkError;
use crate::extract::collapse_whitespace;
use crate::parse::{Element, parse_selector};

const JS_SCHEME: &str = "javascript:";

/// An absolute hyperlink and its display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: String,
}

/// Which part of the page links are collected from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    /// Every anchor in the page, before exclusion pruning
    #[default]
    Document,
    /// Anchors inside the content root, after pruning
    Content,
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkScope::Document => write!(f, "document"),
            LinkScope::Content => write!(f, "content"),
        }
    }
}

impl FromStr for LinkScope {
    type Err = SitemarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(LinkScope::Document),
            "content" => Ok(LinkScope::Content),
            other => Err(SitemarkError::ConfigError(format!("unknown link scope '{}'", other))),
        }
    }
}

/// Resolve an `href` against the page URL
///
/// Returns `None` for empty hrefs, a bare `#`, `javascript:` pseudo-links and
/// anything that does not resolve. Without a base only absolute URLs resolve.
pub fn resolve_href(base: Option<&Url>, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href == "#" {
        return None;
    }

    if href.get(..JS_SCHEME.len()).is_some_and(|scheme| scheme.eq_ignore_ascii_case(JS_SCHEME)) {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };

    match resolved {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(href, error = %e, "skipping unresolvable link");
            None
        }
    }
}

/// Title for an anchor: its text, else its `title`, else a child image's `alt` or `title`
fn link_title(anchor: Element<'_>) -> String {
    let text = collapse_whitespace(&anchor.text()).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    if let Some(title) = anchor.attr("title").map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let images = anchor.select("img").unwrap_or_default();
    ["alt", "title"]
        .iter()
        .find_map(|attr| images.iter().find_map(|img| img.attr(attr).map(str::trim).filter(|v| !v.is_empty())))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Collect the links under `root` in document order
///
/// URLs are absolute and unique; when an address appears more than once the
/// first anchor's title is kept.
pub fn collect_links(root: Element<'_>, base: Option<&Url>) -> Vec<Link> {
    let Ok(selector) = parse_selector("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in root.element_ref().select(&selector).map(Element::new) {
        let Some(url) = anchor.attr("href").and_then(|href| resolve_href(base, href)) else {
            continue;
        };

        if seen.insert(url.to_string()) {
            links.push(Link { url: url.into(), title: link_title(anchor) });
        }
    }

    links
}
