use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sitemark_core::{ExtractConfig, FetchConfig, LinkScope, RuleIndex, RuleLoader, RuleLoaderBuilder};

/// Extra time the request timeout allows on top of the fetch timeout
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Server settings, read from flags with environment fallbacks
#[derive(Parser, Debug, Clone)]
#[command(name = "sitemark-server", version)]
#[command(about = "HTTP API that turns web pages into Markdown using per-site rules", long_about = None)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SITEMARK_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    /// Rules directory (default: ./rules and ~/.config/sitemark/rules).
    #[arg(long, env = "SITEMARK_RULES_DIR", value_name = "DIR")]
    pub rules_dir: Option<PathBuf>,

    /// Seconds before page fetches time out.
    #[arg(long, env = "SITEMARK_FETCH_TIMEOUT", default_value_t = 60, value_name = "SECS")]
    pub fetch_timeout: u64,

    /// User-Agent sent when fetching pages.
    #[arg(long, env = "SITEMARK_USER_AGENT", value_name = "UA")]
    pub user_agent: Option<String>,

    /// Prepend the page title as a level-1 heading.
    #[arg(long, env = "SITEMARK_TITLE_HEADING")]
    pub title_heading: bool,

    /// Collect links from the whole document or the content only.
    #[arg(long, env = "SITEMARK_LINK_SCOPE", default_value = "document", value_name = "SCOPE")]
    pub link_scope: LinkScope,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind.parse().with_context(|| format!("invalid bind address {}", self.bind))
    }

    /// Load and validate the rule set; any error here is fatal at start-up
    pub fn load_rules(&self) -> anyhow::Result<RuleIndex> {
        let loader = match &self.rules_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    anyhow::bail!("rules directory not found: {}", dir.display());
                }
                RuleLoaderBuilder::new().standard_dir(dir).build()
            }
            None => RuleLoader::default(),
        };

        loader.load().context("failed to load rules")
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: self.fetch_timeout, ..Default::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig::builder().link_scope(self.link_scope).include_title_heading(self.title_heading).build()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout) + REQUEST_TIMEOUT_MARGIN
    }
}
