//! Driftnet main entry point
//!
//! This is the command-line interface for the driftnet discussion harvester.

use anyhow::Context;
use clap::Parser;
use driftnet::{JobQueue, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Driftnet: a continuous discussion harvester
///
/// Driftnet pulls crawl jobs from a durable queue, fetches discussion
/// threads from the configured sources, and stores them idempotently for
/// downstream analysis. Listing jobs reschedule themselves, so one seeding
/// pass keeps the harvest running until the worker is stopped.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "1.0.0")]
#[command(about = "A continuous discussion harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed the initial listing jobs and exit
    #[arg(long, conflicts_with = "stats")]
    seed: bool,

    /// Show row and pending-job counts and exit
    #[arg(long, conflicts_with = "seed")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = driftnet::config::load_config_with_hash(&cli.config)
        .context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let ctx = driftnet::CrawlContext::new(config).context("failed to initialize")?;

    if cli.seed {
        handle_seed(&ctx)
    } else if cli.stats {
        handle_stats(&ctx)
    } else {
        handle_work(ctx).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Handles the --seed mode: pushes the initial listing jobs
fn handle_seed(ctx: &driftnet::CrawlContext) -> anyhow::Result<()> {
    let seeded = driftnet::seed::seed_all(&ctx.config, ctx.queue.as_ref())?;
    println!(
        "Seeded {} listing job(s) for {} board(s) and {} subreddit(s)",
        seeded,
        ctx.config.sources.imageboard.boards.len(),
        ctx.config.sources.reddit.subreddits.len()
    );
    Ok(())
}

/// Handles the --stats mode: prints row and pending-job counts
fn handle_stats(ctx: &driftnet::CrawlContext) -> anyhow::Result<()> {
    let stats = {
        let store = ctx.store.lock().unwrap();
        store.stats()?
    };

    println!("Harvested rows:");
    println!("  Submissions: {}", stats.submissions);
    println!("  Comments:    {}", stats.comments);
    println!("  Board posts: {}", stats.board_posts);

    let counts = ctx.queue.pending_counts()?;
    if counts.is_empty() {
        println!("\nNo pending jobs");
    } else {
        println!("\nPending jobs:");
        for (queue, count) in counts {
            println!("  {}: {}", queue, count);
        }
    }

    Ok(())
}

/// Handles the default mode: runs the worker pool until interrupted
async fn handle_work(ctx: driftnet::CrawlContext) -> anyhow::Result<()> {
    tracing::info!(
        "Boards: {:?}, subreddits: {:?}",
        ctx.config.sources.imageboard.boards,
        ctx.config.sources.reddit.subreddits
    );

    let worker = driftnet::worker::Worker::new(Arc::new(ctx));
    worker.run().await?;
    Ok(())
}
