//! EEAT CLI
//!
//! Content credibility analysis for pages, batches, blogs and sites.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use eeat_runtime::{Analyzer, AnalyzerConfig};

#[derive(Parser)]
#[command(name = "eeat")]
#[command(author, version, about = "EEAT: content credibility signal analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "EEAT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, global = true, default_value = "1")]
    verbose: u8,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long, global = true)]
    pretty: bool,

    /// HTTP or SOCKS proxy, overrides the config file
    #[arg(long, global = true, env = "EEAT_PROXY")]
    proxy: Option<String>,

    /// Concurrent fetches, overrides the config file
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single page
    Page {
        /// Page URL
        url: String,
    },

    /// Analyze many pages
    Batch {
        /// Page URLs
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Analyze a blog's publishing cadence
    Blog {
        /// Blog index URL
        root: String,

        /// Post URLs to use instead of discovering them from the index
        #[arg(short, long = "post")]
        posts: Vec<String>,
    },

    /// Analyze a site's landing page together with its blog
    Site {
        /// Site URL
        url: String,

        /// Blog index URL (default: the configured blog path under the site)
        #[arg(short, long)]
        blog: Option<String>,
    },

    /// List the loaded locale phrase patterns
    Patterns,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for reports
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Page { url } => {
            let analyzer = Analyzer::new(&config)?;
            let report = analyzer.analyze_page(url).await;
            emit(&cli, &report)?;
        }
        Commands::Batch { urls, file } => {
            let urls = collect_urls(urls, file.as_deref())?;
            if urls.is_empty() {
                anyhow::bail!("no URLs given; pass them as arguments or with --file");
            }
            let analyzer = Analyzer::new(&config)?;
            let report = analyzer.analyze_batch(&urls).await;
            emit(&cli, &report)?;
        }
        Commands::Blog { root, posts } => {
            let analyzer = Analyzer::new(&config)?;
            let posts = (!posts.is_empty()).then_some(posts.as_slice());
            let report = analyzer
                .analyze_blog(root, posts)
                .await
                .with_context(|| format!("blog analysis of {} failed", root))?;
            emit(&cli, &report)?;
        }
        Commands::Site { url, blog } => {
            let analyzer = Analyzer::new(&config)?;
            let report = analyzer.analyze_site(url, blog.as_deref()).await;
            emit(&cli, &report)?;
        }
        Commands::Patterns => {
            let registry = config.pattern_registry()?;
            emit(&cli, &registry.patterns())?;
        }
    }

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };

    if let Some(proxy) = &cli.proxy {
        config.fetch.proxy = Some(proxy.clone());
    }
    if let Some(concurrency) = cli.concurrency {
        config.pipeline.max_concurrent = concurrency;
    }

    config.validate()?;
    Ok(config)
}

/// Positional URLs followed by those in `file`; blank lines and `#` comments are ignored
fn collect_urls(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut all = urls.to_vec();
    if let Some(path) = file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read URL list {}", path.display()))?;
        all.extend(parse_url_list(&content));
    }
    Ok(all)
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn emit<T: Serialize + ?Sized>(cli: &Cli, value: &T) -> Result<()> {
    let json = if cli.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report saved to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
