//! Site-Scraper main entry point
//!
//! This is the command-line interface for the Site-Scraper crawler.

use anyhow::Context;
use clap::Parser;
use site_scraper::config::{
    load_config_with_hash, parse_tag_list, resolve_tags, validate, validate_seed_url, Config,
    LoggingConfig,
};
use site_scraper::crawler::{crawl_site, scrape_single_page};
use site_scraper::output::{load_statistics, print_links, print_statistics, print_summary};
use site_scraper::storage::SqliteStorage;
use site_scraper::url::canonicalize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Site-Scraper: a concurrent same-site crawler
///
/// Site-Scraper crawls every page reachable from a seed URL without leaving
/// the seed's site, extracts headings, paragraphs, links and media from each
/// page, and stores the results in SQLite.
#[derive(Parser, Debug)]
#[command(name = "site-scraper")]
#[command(version = "0.1.0")]
#[command(about = "A concurrent same-site crawler with tag extraction", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL", required_unless_present = "stats")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Comma-separated tags to extract (e.g. "h1,p,a,img")
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path to the SQLite database
    #[arg(short, long, value_name = "PATH")]
    database: Option<String>,

    /// Scrape only the given URL without following links
    #[arg(long, conflicts_with_all = ["list_links", "stats", "dry_run"])]
    single: bool,

    /// Print the links recorded for the seed's site and exit
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    list_links: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Validate input and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_configuration(&cli)?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = setup_logging(cli.verbose, cli.quiet, &config.logging)
        .context("Failed to set up logging")?;

    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let seed = cli.seed.as_deref().unwrap_or_default();
    if cli.list_links {
        return handle_list_links(&config, seed);
    }
    if cli.dry_run {
        return handle_dry_run(&config, seed);
    }

    handle_scrape(&config, seed, cli.single).await
}

/// Loads the optional config file and applies command-line overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(tags) = &cli.tags {
        config.crawler.tags = parse_tag_list(tags);
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(database) = &cli.database {
        config.output.database_path = database.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok((config, hash))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Console output is always on. When a log directory is configured, the same
/// events also go to a daily-rolling file through a non-blocking writer.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    logging: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_scraper=info,warn"),
            1 => EnvFilter::new("site_scraper=debug,info"),
            2 => EnvFilter::new("site_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, "scraper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --list-links mode: prints the links recorded for the seed's site
fn handle_list_links(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = validate_seed_url(seed)?;
    let base_url = canonicalize(seed.as_str()).unwrap_or_else(|| seed.to_string());

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    print_links(&storage, &base_url)?;

    Ok(())
}

/// Handles the --dry-run mode: validates input and shows what would be crawled
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = validate_seed_url(seed)?;
    let tags = resolve_tags(&config.crawler.tags)?;

    println!("=== Site-Scraper Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!(
        "  Politeness delay: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  Render timeout: {}ms", config.crawler.render_timeout_ms);
    println!(
        "  Tags: {}",
        tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );

    println!("\nUser Agent: {}", config.user_agent.user_agent);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(directory) = &config.logging.directory {
        println!("  Log directory: {}", directory);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation, or a single page with --single
async fn handle_scrape(config: &Config, seed: &str, single: bool) -> anyhow::Result<()> {
    let seed = validate_seed_url(seed)?;
    let tags = resolve_tags(&config.crawler.tags)?;

    tracing::info!(
        "Extracting tags: {}",
        tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );

    let result = if single {
        scrape_single_page(config, &seed, tags).await
    } else {
        tracing::info!("Starting crawl with {} workers", config.crawler.workers);
        crawl_site(config, &seed, tags).await
    };

    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
