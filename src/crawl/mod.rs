//! Crawl orchestration
//!
//! One async handler per job kind, all driven through [`dispatch`]. The
//! handlers implement the discovery, fan-out, and delayed reschedule cycle:
//! listing jobs discover item identifiers and enqueue per-item fetch jobs
//! plus their own delayed successor, detail jobs upsert what they fetched
//! and enqueue children fetches where the source has a separate endpoint.
//!
//! Handlers never share in-memory state; everything they need arrives in the
//! job arguments and the [`CrawlContext`]. A handler error means the job is
//! not acknowledged and the queue redelivers it whole, which is safe because
//! every write is an identity-keyed no-op upsert.

pub mod imageboard;
pub mod reddit;

use crate::client::{ImageboardClient, RedditClient};
use crate::config::Config;
use crate::queue::{Job, JobQueue, QueueSettings, SqliteQueue};
use crate::storage::{open_store, Store};
use crate::Result;
use chrono::Duration as ChronoDuration;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared handles every handler runs against
///
/// Constructed once at startup and passed explicitly; there is no global
/// state. Tests assemble one from in-memory parts.
pub struct CrawlContext {
    pub config: Arc<Config>,
    pub reddit: RedditClient,
    pub imageboard: ImageboardClient,
    pub store: Arc<Mutex<dyn Store>>,
    pub queue: Arc<dyn JobQueue>,
}

impl CrawlContext {
    /// Opens clients, store, and queue from configuration
    pub fn new(config: Config) -> Result<Self> {
        let reddit = RedditClient::new(&config.sources.reddit, &config.user_agent)?;
        let imageboard = ImageboardClient::new(&config.sources.imageboard, &config.user_agent)?;
        let store = open_store(Path::new(&config.output.database_path))?;
        let queue = SqliteQueue::new(
            Path::new(&config.output.queue_path),
            QueueSettings {
                retry_delay: Duration::from_secs(config.worker.retry_delay_seconds),
                max_attempts: config.worker.max_attempts,
                ..QueueSettings::default()
            },
        )?;

        Ok(Self {
            config: Arc::new(config),
            reddit,
            imageboard,
            store: Arc::new(Mutex::new(store)),
            queue: Arc::new(queue),
        })
    }

    /// Delay before a listing job re-polls its community from the top
    pub fn relist_delay(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.config.crawl.relist_delay_seconds as i64)
    }
}

/// Runs the handler for one job
///
/// The match is exhaustive: a new job kind does not compile until it has a
/// handler.
pub async fn dispatch(ctx: &CrawlContext, job: Job) -> Result<()> {
    match job {
        Job::CrawlBoardListing {
            board,
            previous_threads,
        } => imageboard::crawl_board_listing(ctx, &board, &previous_threads).await,
        Job::CrawlBoardThread { board, thread_no } => {
            imageboard::crawl_board_thread(ctx, &board, thread_no).await
        }
        Job::CrawlSubredditListing { subreddit, after } => {
            reddit::crawl_subreddit_listing(ctx, &subreddit, after.as_deref()).await
        }
        Job::CrawlSubmission { subreddit, post_id } => {
            reddit::crawl_submission(ctx, &subreddit, &post_id).await
        }
        Job::CrawlComments { subreddit, post_id } => {
            reddit::crawl_comments(ctx, &subreddit, &post_id).await
        }
    }
}
