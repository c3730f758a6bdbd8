mod echo;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use sitemark_core::{
    ExtractConfig, Extractor, FetchConfig, JsonConfig, LinkScope, OutputFormat, ParseResponse, RuleIndex, RuleLoader,
    RuleLoaderBuilder, convert_to_json, fetch_file, fetch_stdin, fetch_url,
};
use tracing_subscriber::EnvFilter;
use url::Url;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Turn web pages into Markdown using per-site extraction rules
#[derive(Parser, Debug)]
#[command(name = "sitemark")]
#[command(version)]
#[command(about = "Turn web pages into Markdown using per-site extraction rules", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present_any = ["list_rules", "completions"])]
    input: Option<String>,

    /// Rules directory (default: ./rules and ~/.config/sitemark/rules)
    #[arg(long, value_name = "DIR")]
    rules: Option<PathBuf>,

    /// Apply this rule instead of matching by domain
    #[arg(long, value_name = "NAME")]
    rule: Option<String>,

    /// Page URL for rule matching and link resolution (defaults to INPUT when it is a URL)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output format (markdown, json, links)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Prepend the title as a level-1 heading
    #[arg(long)]
    title_heading: bool,

    /// Collect links from the whole document or the content only
    #[arg(long, default_value = "document", value_name = "SCOPE")]
    link_scope: LinkScope,

    /// Strip images from output
    #[arg(long)]
    no_images: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// List loaded rules and domain mappings
    #[arg(long)]
    list_rules: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

/// Where the page HTML comes from
enum Source<'a> {
    Stdin,
    Url(&'a str),
    File(&'a str),
}

impl<'a> Source<'a> {
    fn from_input(input: &'a str) -> Self {
        if input == "-" {
            Self::Stdin
        } else if input.starts_with("http://") || input.starts_with("https://") {
            Self::Url(input)
        } else {
            Self::File(input)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_rules(dir: Option<&Path>) -> anyhow::Result<RuleIndex> {
    let loader = match dir {
        Some(dir) => {
            if !dir.is_dir() {
                anyhow::bail!("Rules directory not found: {}", dir.display());
            }
            RuleLoaderBuilder::new().standard_dir(dir).build()
        }
        None => RuleLoader::default(),
    };

    loader.load().context("Failed to load rules")
}

async fn read_input(source: &Source<'_>, fetch_config: &FetchConfig) -> anyhow::Result<String> {
    match source {
        Source::Stdin => fetch_stdin().context("Failed to read from stdin"),
        Source::Url(url) => fetch_url(url, fetch_config).await.context("Failed to fetch URL"),
        Source::File(path) => fetch_file(path).with_context(|| format!("Failed to read file: {}", path)),
    }
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "sitemark", &mut io::stdout());
        return Ok(());
    }

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let started = Instant::now();
    let mut timings: Vec<(String, Duration)> = Vec::new();

    if args.verbose {
        echo::print_step(1, 4, "Loading rules");
    }
    let step = Instant::now();
    let rules = load_rules(args.rules.as_deref())?;
    timings.push(("Rules".to_string(), step.elapsed()));

    if args.list_rules {
        echo::print_rules(&rules);
        return Ok(());
    }

    if args.verbose {
        echo::print_detail("Loaded", &format!("{} rules", rules.len()));
        eprintln!();
    }

    if let Some(name) = args.rule.as_deref().filter(|name| rules.get(name).is_none()) {
        echo::print_warning(&format!("Unknown rule '{}', matching by domain instead", name));
    }

    let input = args.input.as_deref().context("No INPUT given")?;
    let source = Source::from_input(input);

    let page_url = match (&args.url, &source) {
        (Some(url), _) => {
            Url::parse(url).with_context(|| format!("Invalid --url: {}", url))?;
            url.clone()
        }
        (None, Source::Url(url)) => url.to_string(),
        (None, _) => String::new(),
    };

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };

    if args.verbose {
        let message = match &source {
            Source::Stdin => "Reading from stdin".to_string(),
            Source::Url(url) => format!("Fetching from {}", url.bright_white().underline()),
            Source::File(path) => format!("Reading from file {}", path.bright_white()),
        };
        echo::print_step(2, 4, &message);
    }
    let step = Instant::now();
    let html = read_input(&source, &fetch_config).await?;
    timings.push(("Read".to_string(), step.elapsed()));

    if args.verbose {
        echo::print_detail("Size", &echo::format_size(html.len()));
        eprintln!();
        echo::print_step(3, 4, "Extracting content");
    }

    let config = ExtractConfig::builder()
        .link_scope(args.link_scope)
        .include_title_heading(args.title_heading)
        .strip_images(args.no_images)
        .build();
    let extractor = Extractor::with_config(&rules, config);

    let step = Instant::now();
    let result = match extractor.parse_page(&html, &page_url, args.rule.as_deref()) {
        Ok(result) => result,
        Err(e) if args.format == OutputFormat::Json => {
            let failure = convert_to_json(&ParseResponse::failure(&page_url, &e), &JsonConfig { pretty: true })?;
            write_output(args.output.as_deref(), &failure)?;
            return Err(e).context("Failed to extract content");
        }
        Err(e) => return Err(e).context("Failed to extract content"),
    };
    timings.push(("Extract".to_string(), step.elapsed()));

    if result.markdown.is_empty() {
        echo::print_warning("Extracted content is empty");
    }

    if args.verbose {
        echo::print_extraction_details(&result);
        echo::print_step(4, 4, "Writing output");
        echo::print_detail("Format", &args.format.to_string());
        eprintln!();
    }

    let output = result.to_format(args.format).context("Failed to render output")?;
    write_output(args.output.as_deref(), &output)?;

    if args.verbose {
        echo::print_timing_summary(started.elapsed(), &timings);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            echo::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
