use lol_html::{HtmlRewriter, Settings, element};
use tracing::warn;

/// Configuration for HTML preprocessing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Whether to remove img and picture tags
    pub strip_images: bool,
    /// Whether to remove noscript tags
    pub remove_noscript: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { strip_images: false, remove_noscript: true }
    }
}

impl PreprocessConfig {
    fn is_noop(&self) -> bool {
        !self.strip_images && !self.remove_noscript
    }
}

/// Rewrite raw HTML before it is parsed
///
/// Returns the input unchanged when nothing is enabled or the rewriter fails.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    if config.is_noop() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                if config.remove_noscript {
                    Some(element!("noscript", |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
                if config.strip_images {
                    Some(element!("img, picture", |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
            ]
            .into_iter()
            .flatten()
            .collect(),
            ..Settings::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if let Err(e) = rewriter.write(html.as_bytes()) {
        warn!(error = %e, "preprocessing failed, using raw HTML");
        return html.to_string();
    }

    if let Err(e) = rewriter.end() {
        warn!(error = %e, "preprocessing failed, using raw HTML");
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}
