pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod links;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod result;
pub mod rules;

pub use error::{Result, SitemarkError};
pub use extract::{extract_title, locate_content_root, prune_excluded};
pub use fetch::FetchConfig;
#[cfg(feature = "fetch")]
pub use fetch::fetch_url;
pub use fetch::{fetch_file, fetch_stdin};
pub use formatters::{JsonConfig, JsonFormatter, MarkdownConfig, MarkdownRenderer, convert_to_json, convert_to_markdown};
pub use links::{Link, LinkScope, collect_links, resolve_href};
pub use parse::{Document, Element};
pub use pipeline::{ExtractConfig, ExtractConfigBuilder, Extractor};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use result::{ExtractionResult, LinkListing, LinksResponse, OutputFormat, ParseResponse, links_to_lines};
pub use rules::{DEFAULT_RULE_NAME, Rule, RuleIndex, RuleIndexBuilder, RuleLoader, RuleLoaderBuilder, RuleParser};
