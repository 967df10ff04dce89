//! Plane-Harvest main entry point
//!
//! This is the command-line interface for the Plane-Harvest image crawler.

use anyhow::Context;
use clap::Parser;
use plane_harvest::classify::tables_from_config;
use plane_harvest::config::{load_config_with_hash, Config};
use plane_harvest::crawler::{Coordinator, CrawlOutcome};
use plane_harvest::dataset::{split_dataset, SplitRatios};
use plane_harvest::output::{print_progress, ProgressReport};
use plane_harvest::state::load_state;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Plane-Harvest: a resumable aircraft photo harvester
///
/// Plane-Harvest walks the search results of an aviation photo site,
/// classifies each photo by aircraft family, and keeps a class-balanced image
/// set on disk. Interrupted crawls resume from the last checkpoint.
#[derive(Parser, Debug)]
#[command(name = "plane-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable aircraft photo harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring the previous checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "split"])]
    dry_run: bool,

    /// Show progress from the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "split"])]
    stats: bool,

    /// Split the downloaded images into train/val/test and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    split: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            (Config::default(), None)
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.split {
        handle_split(&config)?;
    } else {
        handle_crawl(config, config_hash, cli.fresh, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("plane_harvest=info,warn"),
            1 => EnvFilter::new("plane_harvest=debug,info"),
            2 => EnvFilter::new("plane_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Plane-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Base URL: {}", config.search.base_url);
    println!("  URL template: {}", config.search.url_template);
    println!("  Pages per query: {}", config.search.max_pages_per_query);

    println!("\nCrawler:");
    println!(
        "  Max concurrent detail pages: {}",
        config.crawler.max_concurrent_details
    );
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Attempts: {} search, {} detail",
        config.retry.search_attempts, config.retry.detail_attempts
    );

    println!("\nQuota: {} images per class", config.quota.limit_per_class);

    println!("\nOutput:");
    println!("  Images: {}", config.output.save_dir);
    println!("  Checkpoint: {}", config.output.state_path);

    println!("\nQueries ({}):", config.search.queries.len());
    for query in &config.search.queries {
        println!("  - {}", query);
    }

    println!("\nClass rules ({}):", config.classes.len());
    for rule in &config.classes {
        println!("  - '{}' -> {}", rule.pattern, rule.label);
    }

    println!("\nSubclass groups ({}):", config.subclass_groups.len());
    for group in &config.subclass_groups {
        println!(
            "  - {} ({} each): {}",
            group.group,
            config.quota.limit_per_class / group.subclasses.len().max(1) as u32,
            group.subclasses.join(", ")
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: prints progress from the checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let state_path = Path::new(&config.output.state_path);
    println!("Checkpoint: {}", state_path.display());

    let state = load_state(state_path).context("Failed to read checkpoint")?;
    if let Some(updated_at) = state.updated_at {
        println!("Last written: {}", updated_at.to_rfc3339());
    }

    let (classes, subclasses) = tables_from_config(config);
    print_progress(&ProgressReport::from_state(
        &state,
        &classes,
        &subclasses,
        config.quota.limit_per_class,
    ));

    Ok(())
}

/// Handles the --split mode: builds the train/val/test tree
fn handle_split(config: &Config) -> anyhow::Result<()> {
    let ratios = SplitRatios::from_config(&config.split)?;
    let source = Path::new(&config.output.save_dir);
    let output = Path::new(&config.split.output_dir);

    println!("=== Splitting Dataset ===\n");
    println!("Source: {}", source.display());
    println!("Output: {}", output.display());

    let summary = split_dataset(source, output, ratios, config.split.seed)?;

    println!(
        "\n✓ {} images from {} groups: {} train, {} val, {} test",
        summary.total(),
        summary.groups,
        summary.train,
        summary.val,
        summary.test
    );
    if summary.skipped > 0 {
        println!("  {} images outside any class directory were skipped", summary.skipped);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    fresh: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        "{} queries, {} class rules, {} images per class",
        config.search.queries.len(),
        config.classes.len(),
        config.quota.limit_per_class
    );

    let mut coordinator = Coordinator::new(config, fresh)?.with_progress_output(!quiet);
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    match coordinator.run().await {
        Ok(report) => {
            match report.outcome {
                CrawlOutcome::QuotasSatisfied => {
                    tracing::info!("Crawl completed: every class reached its limit")
                }
                CrawlOutcome::QueriesExhausted => {
                    tracing::info!("Crawl completed: no more queries to search")
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
