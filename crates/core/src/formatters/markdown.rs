//! HTML subtree to Markdown rendering.
//!
//! Block elements become blocks separated by one blank line; everything else
//! renders inline. Link and image addresses are resolved against the page URL
//! with the same rules as the link collector.

use scraper::{ElementRef, Node};
use url::Url;

use crate::extract::collapse_whitespace;
use crate::links::resolve_href;
use crate::parse::Element;

/// Elements that never produce output
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements whose children are rendered as a sequence of blocks
const CONTAINER_TAGS: &[&str] = &[
    "html", "body", "div", "p", "section", "article", "main", "header", "footer", "aside", "nav", "figure",
    "figcaption", "details", "summary", "dialog", "address", "center", "form", "fieldset", "hgroup", "dl", "dt", "dd",
    "li", "thead", "tbody", "tfoot", "tr", "td", "th", "caption",
];

/// Inline elements with their own Markdown syntax
const FORMATTING_TAGS: &[&str] = &["a", "img", "code", "em", "i", "strong", "b", "br"];

/// Indentation for list continuation lines and nested lists
const LIST_INDENT: &str = "  ";

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Include the page title as an H1 heading at the start of content
    pub include_title_heading: bool,
}

/// Renders a content subtree to Markdown
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer<'u> {
    base_url: Option<&'u Url>,
}

fn is_block(tag: &str) -> bool {
    CONTAINER_TAGS.contains(&tag)
        || matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "pre" | "blockquote" | "hr" | "table")
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn contains_block(el: ElementRef<'_>) -> bool {
    el.descendants().filter_map(ElementRef::wrap).skip(1).any(|d| is_block(d.value().name()))
}

/// Collapse whitespace line by line, keeping the newlines produced by `<br>`
fn clean_inline(text: &str) -> String {
    let lines: Vec<String> = text.split('\n').map(|line| collapse_whitespace(line).trim().to_string()).collect();
    lines.join("\n").trim_matches('\n').to_string()
}

/// Wrap the trimmed content with `open`/`close`, keeping surrounding spaces outside the markup
fn wrap_trimmed(content: &str, open: &str, close: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }

    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{open}{trimmed}{close}{trail}")
}

/// Longest run of consecutive backticks in `text`
fn longest_backtick_run(text: &str) -> usize {
    text.split(|c: char| c != '`').map(str::len).max().unwrap_or(0)
}

/// Language hint from a `language-*`/`lang-*` class or a `data-lang` attribute
fn code_language(el: ElementRef<'_>) -> Option<String> {
    let value = el.value();

    let from_class = value.classes().find_map(|class| {
        class.strip_prefix("language-").or_else(|| class.strip_prefix("lang-")).filter(|lang| !lang.is_empty())
    });

    from_class
        .or_else(|| value.attr("data-lang"))
        .or_else(|| value.attr("data-language"))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

impl<'u> MarkdownRenderer<'u> {
    /// Create a renderer resolving addresses against `base_url`
    pub fn new(base_url: Option<&'u Url>) -> Self {
        Self { base_url }
    }

    /// Render `root` and its subtree
    pub fn render(&self, root: Element<'_>) -> String {
        let mut blocks = Vec::new();
        self.block(root.element_ref(), &mut blocks);
        blocks.join("\n\n")
    }

    fn block(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        let tag = el.value().name();

        if SKIPPED_TAGS.contains(&tag) {
            return;
        }

        if let Some(level) = heading_level(tag) {
            let text = clean_inline(&self.inline_children(el)).replace('\n', " ");
            if !text.is_empty() {
                out.push(format!("{} {}", "#".repeat(level), text));
            }
            return;
        }

        let rendered = match tag {
            "ul" => self.list(el, false),
            "ol" => self.list(el, true),
            "pre" => self.code_block(el),
            "blockquote" => self.blockquote(el),
            "table" => self.table(el),
            "hr" => "---".to_string(),
            _ if is_block(tag) => {
                self.children_blocks(el, out);
                return;
            }
            _ => clean_inline(&self.inline(el)),
        };

        if !rendered.is_empty() {
            out.push(rendered);
        }
    }

    /// Render the children of `el`, grouping inline runs into paragraphs
    fn children_blocks(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        let mut inline = String::new();

        for child in el.children() {
            match child.value() {
                Node::Text(text) => inline.push_str(&collapse_whitespace(text)),
                Node::Element(element) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let tag = element.name();

                    if SKIPPED_TAGS.contains(&tag) {
                        continue;
                    }

                    if is_block(tag) {
                        Self::flush(&mut inline, out);
                        self.block(child_el, out);
                    } else if !FORMATTING_TAGS.contains(&tag) && contains_block(child_el) {
                        Self::flush(&mut inline, out);
                        self.children_blocks(child_el, out);
                    } else {
                        inline.push_str(&self.inline(child_el));
                    }
                }
                _ => {}
            }
        }

        Self::flush(&mut inline, out);
    }

    fn flush(inline: &mut String, out: &mut Vec<String>) {
        let paragraph = clean_inline(inline);
        if !paragraph.is_empty() {
            out.push(paragraph);
        }
        inline.clear();
    }

    fn inline(&self, el: ElementRef<'_>) -> String {
        let tag = el.value().name();

        match tag {
            _ if SKIPPED_TAGS.contains(&tag) => String::new(),
            "br" => "\n".to_string(),
            "em" | "i" => wrap_trimmed(&self.inline_children(el), "*", "*"),
            "strong" | "b" => wrap_trimmed(&self.inline_children(el), "**", "**"),
            "code" => Self::code_span(el),
            "a" => self.link(el),
            "img" => self.image(el),
            _ if is_block(tag) => format!(" {} ", self.inline_children(el)),
            _ => self.inline_children(el),
        }
    }

    fn inline_children(&self, el: ElementRef<'_>) -> String {
        let mut out = String::new();

        for child in el.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&collapse_whitespace(text)),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        out.push_str(&self.inline(child_el));
                    }
                }
                _ => {}
            }
        }

        out
    }

    fn code_span(el: ElementRef<'_>) -> String {
        let code = collapse_whitespace(&el.text().collect::<String>());
        let trimmed = code.trim();

        if trimmed.is_empty() {
            String::new()
        } else if trimmed.contains('`') {
            format!("`` {} ``", trimmed)
        } else {
            format!("`{}`", trimmed)
        }
    }

    fn link(&self, el: ElementRef<'_>) -> String {
        let content = self.inline_children(el);
        let Some(url) = el.value().attr("href").and_then(|href| resolve_href(self.base_url, href)) else {
            return content;
        };

        let text = clean_inline(&content).replace('\n', " ");
        if text.is_empty() {
            format!("<{}>", url)
        } else {
            wrap_trimmed(&content.replace('\n', " "), "[", &format!("]({})", url))
        }
    }

    fn image(&self, el: ElementRef<'_>) -> String {
        let value = el.value();
        let src = ["src", "data-src"]
            .iter()
            .find_map(|attr| value.attr(attr).map(str::trim).filter(|src| !src.is_empty()));

        let Some(src) = src else {
            return String::new();
        };

        let url = resolve_href(self.base_url, src).map(String::from).unwrap_or_else(|| src.to_string());
        let alt = collapse_whitespace(value.attr("alt").unwrap_or_default());
        format!("![{}]({})", alt.trim(), url)
    }

    fn code_block(&self, pre: ElementRef<'_>) -> String {
        let text: String = pre.text().collect();
        let text = text.trim_end_matches(['\n', '\r']);

        let language = code_language(pre)
            .or_else(|| element_children(pre).find(|c| c.value().name() == "code").and_then(code_language))
            .unwrap_or_default();

        let fence = "`".repeat(longest_backtick_run(text).max(2) + 1);
        format!("{fence}{language}\n{text}\n{fence}")
    }

    fn list(&self, el: ElementRef<'_>, ordered: bool) -> String {
        let mut counter: i64 =
            if ordered { el.value().attr("start").and_then(|s| s.trim().parse().ok()).unwrap_or(1) } else { 1 };
        let mut lines = Vec::new();

        for child in element_children(el) {
            let tag = child.value().name();

            if tag != "li" {
                let mut nested = Vec::new();
                self.block(child, &mut nested);
                for line in nested.join("\n").lines() {
                    lines.push(Self::indent(line));
                }
                continue;
            }

            let marker = if ordered { format!("{}. ", counter) } else { "- ".to_string() };
            counter = counter.saturating_add(1);

            let mut item = Vec::new();
            self.children_blocks(child, &mut item);
            let body = item.join("\n");

            let mut body_lines = body.lines();
            lines.push(format!("{}{}", marker, body_lines.next().unwrap_or_default()).trim_end().to_string());
            lines.extend(body_lines.map(Self::indent));
        }

        lines.join("\n")
    }

    fn indent(line: &str) -> String {
        if line.is_empty() { String::new() } else { format!("{LIST_INDENT}{line}") }
    }

    fn blockquote(&self, el: ElementRef<'_>) -> String {
        let mut inner = Vec::new();
        self.children_blocks(el, &mut inner);

        inner
            .join("\n\n")
            .lines()
            .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn table(&self, el: ElementRef<'_>) -> String {
        let mut rows: Vec<Vec<String>> = Vec::new();

        for child in element_children(el) {
            match child.value().name() {
                "tr" => rows.push(self.table_row(child)),
                "thead" | "tbody" | "tfoot" => {
                    rows.extend(element_children(child).filter(|r| r.value().name() == "tr").map(|r| self.table_row(r)))
                }
                _ => {}
            }
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return String::new();
        }

        let format_row = |cells: &[String]| {
            let padded: Vec<&str> = (0..width).map(|i| cells.get(i).map(String::as_str).unwrap_or_default()).collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(format_row(&rows[0]));
        lines.push(format!("|{}", " --- |".repeat(width)));
        lines.extend(rows[1..].iter().map(|row| format_row(row)));

        lines.join("\n")
    }

    fn table_row(&self, tr: ElementRef<'_>) -> Vec<String> {
        element_children(tr)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .map(|cell| clean_inline(&self.inline_children(cell)).replace('\n', " ").replace('|', "\\|"))
            .collect()
    }
}

/// Render a content root to Markdown, optionally headed by the page title
pub fn convert_to_markdown(root: Element<'_>, title: &str, base_url: Option<&Url>, config: &MarkdownConfig) -> String {
    let body = MarkdownRenderer::new(base_url).render(root);

    if config.include_title_heading && !title.trim().is_empty() {
        let heading = format!("# {}", title.trim());
        if body.is_empty() { heading } else { format!("{}\n\n{}", heading, body) }
    } else {
        body
    }
}
