use std::sync::Arc;

use sitemark_core::{ExtractConfig, Extractor, FetchConfig, RuleIndex};

/// Shared, read-only state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub rules: Arc<RuleIndex>,
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
}

impl AppState {
    pub fn new(rules: RuleIndex, fetch: FetchConfig, extract: ExtractConfig) -> Self {
        Self { rules: Arc::new(rules), fetch, extract }
    }

    pub fn extractor(&self) -> Extractor<'_> {
        Extractor::with_config(&self.rules, self.extract.clone())
    }
}
