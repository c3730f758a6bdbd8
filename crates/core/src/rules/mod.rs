pub mod directives;
pub mod index;
pub mod loader;
pub mod parser;

pub use directives::{DEFAULT_RULE_NAME, Directive, Rule, parse_directive};
pub use index::{RuleIndex, RuleIndexBuilder};
pub use loader::{DOMAIN_MAP_FILE, RuleLoader, RuleLoaderBuilder};
pub use parser::RuleParser;
