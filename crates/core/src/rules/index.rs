//! The loaded, read-only collection of rules.
//!
//! A [`RuleIndex`] is built once at start-up through [`RuleIndexBuilder`],
//! which validates it, and is then only read. Resolution never fails: an
//! unknown rule name or an unmapped host falls back to the default rule.

use crate::error::{Result, SitemarkError};
use crate::rules::directives::{DEFAULT_RULE_NAME, Rule, normalize_host};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};
use url::Url;

/// Rules keyed by name, a host to rule-name mapping, and the default rule.
#[derive(Debug, Clone)]
pub struct RuleIndex {
    rules: BTreeMap<String, Rule>,
    domains: HashMap<String, String>,
    default_name: String,
}

impl RuleIndex {
    /// Create a builder with no rules
    pub fn builder() -> RuleIndexBuilder {
        RuleIndexBuilder::new()
    }

    /// An index holding only the built-in default rule
    pub fn with_builtin_default() -> Self {
        let rule = Rule::builtin_default();
        let mut rules = BTreeMap::new();
        rules.insert(rule.name.clone(), rule);
        Self { rules, domains: HashMap::new(), default_name: DEFAULT_RULE_NAME.to_string() }
    }

    /// Resolve the rule for a page
    ///
    /// An explicit name that matches a loaded rule wins. Otherwise the URL's
    /// host is looked up in the domain mapping, and the default rule is
    /// returned when nothing matches.
    pub fn resolve(&self, explicit: Option<&str>, url: &str) -> &Rule {
        if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
            if let Some(rule) = self.rules.get(name) {
                debug!(rule = %rule.name, "resolved rule by name");
                return rule;
            }
            debug!(rule = name, "unknown rule name, falling back to domain lookup");
        }

        if let Some(rule) = self.resolve_url(url) {
            return rule;
        }

        debug!(url, rule = %self.default_name, "using default rule");
        self.default_rule()
    }

    /// Look up a rule by exact name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// The designated default rule
    pub fn default_rule(&self) -> &Rule {
        // Presence is checked by RuleIndexBuilder::build.
        &self.rules[&self.default_name]
    }

    /// Name of the default rule
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Rule name mapped to `host`, without any www or parent-domain fallback
    pub fn mapped_rule_name(&self, host: &str) -> Option<&str> {
        self.domains.get(&normalize_host(host)).map(String::as_str)
    }

    /// All rules, ordered by name
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// All host mappings, ordered by host
    pub fn domains(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.domains.iter().map(|(h, n)| (h.as_str(), n.as_str())).collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn resolve_url(&self, url: &str) -> Option<&Rule> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;

        for candidate in host_candidates(host) {
            if let Some(name) = self.domains.get(&candidate) {
                debug!(host, candidate = %candidate, rule = %name, "resolved rule by domain");
                return self.rules.get(name);
            }
        }

        None
    }
}

/// Hosts to try for `host`, most specific first
///
/// The host itself, the host without `www.`, the host with `www.`, then
/// each parent domain down to two labels.
fn host_candidates(host: &str) -> Vec<String> {
    let host = normalize_host(host);
    let mut candidates = vec![host.clone()];

    let bare = match host.strip_prefix("www.") {
        Some(bare) => {
            candidates.push(bare.to_string());
            bare.to_string()
        }
        None => {
            candidates.push(format!("www.{}", host));
            host.clone()
        }
    };

    let parts: Vec<&str> = bare.split('.').collect();
    for i in 1..parts.len().saturating_sub(1) {
        let parent = parts[i..].join(".");
        if !candidates.contains(&parent) {
            candidates.push(parent);
        }
    }

    candidates
}

/// Builder for RuleIndex
#[derive(Debug, Default)]
pub struct RuleIndexBuilder {
    rules: BTreeMap<String, Rule>,
    domains: Vec<(String, String)>,
    default_name: Option<String>,
    builtin_default: bool,
}

impl RuleIndexBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing any earlier rule with the same name
    ///
    /// The rule's own `domains` are mapped to it.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.insert_rule(rule);
        self
    }

    pub(crate) fn insert_rule(&mut self, rule: Rule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    /// Map a host to a rule name
    pub fn domain(mut self, host: impl Into<String>, rule_name: impl Into<String>) -> Self {
        self.insert_domain(host.into(), rule_name.into());
        self
    }

    pub(crate) fn insert_domain(&mut self, host: String, rule_name: String) {
        self.domains.push((normalize_host(&host), rule_name));
    }

    /// Designate the default rule (defaults to `default`)
    pub fn default_rule(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    /// Install the built-in default rule when no rule named `default` was added
    pub fn with_builtin_default(mut self) -> Self {
        self.builtin_default = true;
        self
    }

    /// Validate and build the index
    ///
    /// Hosts declared by rules are mapped first, in rule-name order, then the
    /// explicit [`domain`](Self::domain) mappings in insertion order. When a
    /// host is claimed twice the later mapping wins and a warning is logged.
    ///
    /// # Errors
    ///
    /// [`SitemarkError::ConfigError`] when the default rule is missing, a
    /// domain maps to an unknown rule, or a selector does not parse.
    pub fn build(mut self) -> Result<RuleIndex> {
        if self.builtin_default && !self.rules.contains_key(DEFAULT_RULE_NAME) {
            self.insert_rule(Rule::builtin_default());
        }

        let default_name = self.default_name.unwrap_or_else(|| DEFAULT_RULE_NAME.to_string());
        if !self.rules.contains_key(&default_name) {
            return Err(SitemarkError::ConfigError(format!("default rule '{}' is not defined", default_name)));
        }

        for rule in self.rules.values() {
            rule.validate()?;
        }

        let mut domains = HashMap::new();
        let declared = self
            .rules
            .values()
            .flat_map(|rule| rule.domains.iter().map(move |host| (host.clone(), rule.name.clone())));

        for (host, name) in declared.chain(self.domains) {
            if !self.rules.contains_key(&name) {
                return Err(SitemarkError::ConfigError(format!(
                    "domain '{}' maps to unknown rule '{}'",
                    host, name
                )));
            }
            if host.is_empty() {
                return Err(SitemarkError::ConfigError(format!("empty domain mapped to rule '{}'", name)));
            }
            if let Some(previous) = domains.get(&host).filter(|previous| **previous != name) {
                warn!(host = %host, previous = %previous, rule = %name, "domain claimed by more than one rule, last one wins");
            }
            domains.insert(host, name);
        }

        Ok(RuleIndex { rules: self.rules, domains, default_name })
    }
}
