//! Sumi-Spider main entry point
//!
//! Command-line front end for the spider: builds a spider request from a
//! JSON file and/or flags, runs it, and writes the results.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;
use sumi_spider::api::{SpiderRequest, SpiderService};
use sumi_spider::config::{load_config_with_hash, Config};
use sumi_spider::extraction::ExtractionConfig;
use sumi_spider::output::{print_summary, write_results_json, write_sitemap, OutputPaths};
use tracing_subscriber::EnvFilter;

/// Sumi-Spider: a bounded recursive site crawler
///
/// Crawls pages reachable from a seed URL on the seed's own host, up to a
/// depth and page budget, honoring include/exclude patterns and robots.txt.
#[derive(Parser, Debug)]
#[command(name = "sumi-spider")]
#[command(version)]
#[command(about = "A bounded recursive site crawler", long_about = None)]
struct Cli {
    /// Seed URL (overrides `url` from --request)
    #[arg(value_name = "URL", required_unless_present = "request")]
    url: Option<String>,

    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Spider request body as a JSON file
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Maximum link depth (1-10)
    #[arg(long)]
    max_depth: Option<i64>,

    /// Maximum number of pages (1-1000)
    #[arg(long)]
    max_pages: Option<i64>,

    /// Concurrent fetches per batch (1-50)
    #[arg(long)]
    batch_size: Option<i64>,

    /// Only follow URLs containing this substring (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    include: Vec<String>,

    /// Skip URLs containing this substring (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Extraction strategy: basic, llm, cosine or json_css
    #[arg(long, value_name = "TYPE")]
    extraction: Option<String>,

    /// Extraction params as a JSON object
    #[arg(long, value_name = "JSON", requires = "extraction")]
    extraction_params: Option<String>,

    /// Crawler parameter, value parsed as JSON when possible (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Bearer token sent with the request
    #[arg(long, env = "SPIDER_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory for the results JSON and the sitemap
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;
    let request = build_request(&cli)?;
    let seed = request.url.clone();

    let service = SpiderService::new(config)?;
    let authorization = cli.token.as_ref().map(|t| format!("Bearer {}", t));

    let started = Instant::now();
    let response = match service.handle(authorization.as_deref(), request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Spider request rejected (HTTP {}): {}", e.status_code(), e);
            return Err(e.into());
        }
    };

    let now = Local::now();
    let paths = OutputPaths::new(&cli.output_dir, now);
    write_results_json(&response, &paths.results)?;
    write_sitemap(&seed, &response, now, &paths.sitemap)?;

    if !cli.quiet {
        print_summary(&response, started.elapsed());
        println!();
        println!("Results: {}", paths.results.display());
        println!("Sitemap: {}", paths.sitemap.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_spider=info,warn"),
            1 => EnvFilter::new("sumi_spider=debug,info"),
            2 => EnvFilter::new("sumi_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Builds the request from `--request` and the individual flags
///
/// Flags override fields of the request file.
fn build_request(cli: &Cli) -> anyhow::Result<SpiderRequest> {
    let mut request = match &cli.request {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file {}", path.display()))?;
            SpiderRequest::from_json(&body)
                .with_context(|| format!("Invalid request file {}", path.display()))?
        }
        None => SpiderRequest::default(),
    };

    if let Some(url) = &cli.url {
        request.url = url.clone();
    }
    if cli.max_depth.is_some() {
        request.max_depth = cli.max_depth;
    }
    if cli.max_pages.is_some() {
        request.max_pages = cli.max_pages;
    }
    if cli.batch_size.is_some() {
        request.batch_size = cli.batch_size;
    }
    if !cli.include.is_empty() {
        request.include_patterns = Some(cli.include.clone());
    }
    if !cli.exclude.is_empty() {
        request.exclude_patterns = Some(cli.exclude.clone());
    }

    if let Some(kind) = &cli.extraction {
        let params = match &cli.extraction_params {
            Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)
                .context("--extraction-params must be a JSON object")?,
            None => Map::new(),
        };
        request.extraction_config = Some(ExtractionConfig {
            kind: kind.clone(),
            params,
        });
    }

    if !cli.params.is_empty() {
        let crawler_params = request.crawler_params.get_or_insert_with(Map::new);
        for param in &cli.params {
            let (key, value) = parse_param(param)?;
            crawler_params.insert(key, value);
        }
    }

    Ok(request)
}

/// Parses `KEY=VALUE`; VALUE is JSON if it parses as JSON, else a string
fn parse_param(param: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = param
        .split_once('=')
        .with_context(|| format!("--param expects KEY=VALUE, got '{}'", param))?;

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}
