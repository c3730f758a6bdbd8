use crate::error::{Result, SitemarkError};
use crate::rules::directives::{Rule, parse_directive};
use std::io::BufRead;
use std::path::Path;

/// Rule file parser
#[derive(Debug)]
pub struct RuleParser;

impl RuleParser {
    /// Parse a single rule file; the rule is named after the file stem
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Rule> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| SitemarkError::RuleFileError(format!("Cannot derive rule name from {}", path.display())))?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| SitemarkError::RuleFileError(format!("Cannot open file {}: {}", path.display(), e)))?;

        Self::parse_string(name, &content)
            .map_err(|e| SitemarkError::RuleFileError(format!("{}: {}", path.display(), e)))
    }

    /// Parse a rule from a reader
    pub fn parse_reader<R: BufRead>(name: &str, reader: R) -> Result<Rule> {
        let mut rule = Rule::new(name);

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line =
                line.map_err(|e| SitemarkError::RuleFileError(format!("Read error at line {}: {}", line_number, e)))?;
            Self::apply_line(&mut rule, &line, line_number)?;
        }

        Ok(rule)
    }

    /// Parse a rule from a string
    pub fn parse_string(name: &str, content: &str) -> Result<Rule> {
        let mut rule = Rule::new(name);

        for (index, line) in content.lines().enumerate() {
            Self::apply_line(&mut rule, line, index + 1)?;
        }

        Ok(rule)
    }

    /// Parse a domain mapping file: one `host: rule_name` per line
    pub fn parse_domain_map(content: &str) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once(':') {
                Some((host, name)) if !host.trim().is_empty() && !name.trim().is_empty() => {
                    entries.push((host.trim().to_string(), name.trim().to_string()));
                }
                _ => {
                    return Err(SitemarkError::RuleFileError(format!(
                        "Invalid domain mapping at line {}: {}",
                        index + 1,
                        line
                    )));
                }
            }
        }

        Ok(entries)
    }

    fn apply_line(rule: &mut Rule, line: &str, line_number: usize) -> Result<()> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        parse_directive(line)
            .and_then(|directive| rule.add_directive(directive))
            .map_err(|e| SitemarkError::RuleFileError(format!("Parse error at line {}: {}", line_number, e)))
    }
}
