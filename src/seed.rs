//! Cold-start seeding
//!
//! Pushes the initial listing job for every configured community. After
//! that the listing jobs keep themselves alive by rescheduling, so seeding
//! runs once per deployment. Re-running it is harmless: duplicate listing
//! cycles converge because every downstream effect is an identity-keyed
//! no-op.

use crate::config::Config;
use crate::queue::{Job, JobQueue};
use crate::Result;

/// Enqueues one fresh listing job per configured board and subreddit
///
/// Returns the number of jobs pushed.
pub fn seed_all(config: &Config, queue: &dyn JobQueue) -> Result<usize> {
    let mut seeded = 0;

    for board in &config.sources.imageboard.boards {
        tracing::info!("Seeding board listing for /{}/", board);
        queue.push(
            &Job::CrawlBoardListing {
                board: board.clone(),
                previous_threads: Vec::new(),
            },
            None,
        )?;
        seeded += 1;
    }

    for subreddit in &config.sources.reddit.subreddits {
        tracing::info!("Seeding subreddit listing for r/{}", subreddit);
        queue.push(
            &Job::CrawlSubredditListing {
                subreddit: subreddit.clone(),
                after: None,
            },
            None,
        )?;
        seeded += 1;
    }

    Ok(seeded)
}
