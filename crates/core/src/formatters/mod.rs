pub mod json;
pub mod markdown;

pub use json::{JsonConfig, JsonFormatter, convert_to_json};
pub use markdown::{MarkdownConfig, MarkdownRenderer, convert_to_markdown};
