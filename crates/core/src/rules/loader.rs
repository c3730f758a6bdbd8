use crate::error::{Result, SitemarkError};
use crate::rules::directives::Rule;
use crate::rules::index::{RuleIndex, RuleIndexBuilder};
use crate::rules::parser::RuleParser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension of rule files
const RULE_EXTENSION: &str = "txt";

/// Name of the optional host-to-rule mapping file in a rules directory
pub const DOMAIN_MAP_FILE: &str = "domains.map";

/// Loads rule files from a standard and a custom directory into a [`RuleIndex`]
///
/// Custom rules override standard rules with the same name. Every rule file
/// must parse; a broken file fails the whole load.
#[derive(Debug, Clone)]
pub struct RuleLoader {
    /// Custom rules directory path
    custom_dir: Option<PathBuf>,
    /// Standard rules directory path
    standard_dir: Option<PathBuf>,
    /// Default rule name override
    default_name: Option<String>,
}

impl RuleLoader {
    /// Create a loader with no directories; it yields only the built-in default
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None, default_name: None }
    }

    /// Read all rule directories and build a validated index
    pub fn load(&self) -> Result<RuleIndex> {
        let mut builder = RuleIndexBuilder::new().with_builtin_default();

        for dir in [&self.standard_dir, &self.custom_dir].into_iter().flatten() {
            Self::load_dir(&mut builder, dir)?;
        }

        if let Some(name) = &self.default_name {
            builder = builder.default_rule(name.clone());
        }

        let index = builder.build()?;
        info!(rules = index.len(), default = index.default_name(), "loaded rules");
        Ok(index)
    }

    /// Load every rule file and the domain map from one directory
    fn load_dir(builder: &mut RuleIndexBuilder, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "rules directory not found, skipping");
            return Ok(());
        }

        for path in Self::find_rule_files(dir)? {
            let rule = RuleParser::parse_file(&path)?;
            debug!(rule = %rule.name, path = %path.display(), "loaded rule file");
            builder.insert_rule(Self::with_implicit_domain(rule));
        }

        let map_path = dir.join(DOMAIN_MAP_FILE);
        if map_path.is_file() {
            let content = fs::read_to_string(&map_path)
                .map_err(|e| SitemarkError::RuleFileError(format!("Cannot open file {}: {}", map_path.display(), e)))?;
            for (host, name) in RuleParser::parse_domain_map(&content)? {
                builder.insert_domain(host, name);
            }
        }

        Ok(())
    }

    /// Rule files in a directory, sorted by name
    fn find_rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .map_err(|e| SitemarkError::ConfigError(format!("Cannot read rules directory {}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == RULE_EXTENSION))
            .collect();
        files.sort();

        Ok(files)
    }

    /// Map a rule named after a host to that host when it declares no domains
    fn with_implicit_domain(rule: Rule) -> Rule {
        if rule.domains.is_empty() && rule.name.contains('.') {
            let host = rule.name.clone();
            rule.with_domain(host)
        } else {
            rule
        }
    }

    pub fn custom_dir(&self) -> Option<&Path> {
        self.custom_dir.as_deref()
    }

    pub fn standard_dir(&self) -> Option<&Path> {
        self.standard_dir.as_deref()
    }
}

/// Builder for RuleLoader
#[derive(Debug, Default)]
pub struct RuleLoaderBuilder {
    custom_dir: Option<PathBuf>,
    standard_dir: Option<PathBuf>,
    default_name: Option<String>,
}

impl RuleLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom rules directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set standard rules directory
    pub fn standard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.standard_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the default rule name
    pub fn default_rule(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    /// Build the RuleLoader
    pub fn build(self) -> RuleLoader {
        RuleLoader { custom_dir: self.custom_dir, standard_dir: self.standard_dir, default_name: self.default_name }
    }
}

impl Default for RuleLoader {
    fn default() -> Self {
        let mut builder = RuleLoaderBuilder::new();

        if let Some(custom_dir) = Self::default_custom_dir() {
            builder = builder.custom_dir(custom_dir);
        }

        if let Some(standard_dir) = Self::default_standard_dir() {
            builder = builder.standard_dir(standard_dir);
        }

        builder.build()
    }
}

impl RuleLoader {
    /// Get default custom rules directory (~/.config/sitemark/rules)
    fn default_custom_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("sitemark").join("rules"))
    }

    /// Get default standard rules directory (`./rules` when present)
    fn default_standard_dir() -> Option<PathBuf> {
        let std_dir = PathBuf::from("rules");
        if std_dir.is_dir() { Some(std_dir) } else { None }
    }
}
