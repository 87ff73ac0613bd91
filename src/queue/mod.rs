//! Job model and durable queue
//!
//! All coordination between crawl steps happens through queued jobs: no
//! handler ever waits on another handler. The queue is an at-least-once
//! scheduler with delayed delivery; a job may be delivered more than once
//! (crash before ack, lease expiry), so every handler must be idempotent.
//!
//! Job arguments are fully self-describing. A handler never depends on
//! in-memory state left behind by a previous job.

mod sqlite;

pub use sqlite::{QueueSettings, SqliteQueue};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Queue fed by imageboard listing jobs
pub const QUEUE_BOARD_LISTING: &str = "board-listing";

/// Queue fed by per-thread imageboard fetch jobs
pub const QUEUE_BOARD_THREAD: &str = "board-thread";

/// Queue shared by all reddit jobs
pub const QUEUE_REDDIT: &str = "reddit";

/// Every queue a worker can pull from
pub const ALL_QUEUES: [&str; 3] = [QUEUE_BOARD_LISTING, QUEUE_BOARD_THREAD, QUEUE_REDDIT];

/// `ALL_QUEUES` as owned strings, the form the claim API takes
pub fn all_queues() -> Vec<String> {
    ALL_QUEUES.iter().map(|q| q.to_string()).collect()
}

/// Errors that can occur during queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown job id: {0}")]
    UnknownJob(i64),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// A crawl job
///
/// The tagged union covers every job kind in the pipeline; dispatch is an
/// exhaustive match, so adding a variant forces every dispatcher to handle
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Job {
    /// Snapshot a board's full thread listing and fan out thread fetches
    CrawlBoardListing {
        board: String,
        /// Thread numbers seen by the previous listing cycle; used to detect
        /// threads that have since died and need one final capture
        #[serde(default)]
        previous_threads: Vec<u64>,
    },

    /// Fetch every post in one imageboard thread
    CrawlBoardThread { board: String, thread_no: u64 },

    /// Fetch one page of a subreddit's newest submissions
    CrawlSubredditListing {
        subreddit: String,
        /// Pagination cursor; absent means start from the newest page
        #[serde(default)]
        after: Option<String>,
    },

    /// Fetch one submission's detail
    CrawlSubmission { subreddit: String, post_id: String },

    /// Fetch one submission's first-level comments
    CrawlComments { subreddit: String, post_id: String },
}

impl Job {
    /// Stable kind string, matching the serialized `kind` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Job::CrawlBoardListing { .. } => "crawl-board-listing",
            Job::CrawlBoardThread { .. } => "crawl-board-thread",
            Job::CrawlSubredditListing { .. } => "crawl-subreddit-listing",
            Job::CrawlSubmission { .. } => "crawl-submission",
            Job::CrawlComments { .. } => "crawl-comments",
        }
    }

    /// The named queue this job is pushed to
    pub fn queue(&self) -> &'static str {
        match self {
            Job::CrawlBoardListing { .. } => QUEUE_BOARD_LISTING,
            Job::CrawlBoardThread { .. } => QUEUE_BOARD_THREAD,
            Job::CrawlSubredditListing { .. }
            | Job::CrawlSubmission { .. }
            | Job::CrawlComments { .. } => QUEUE_REDDIT,
        }
    }
}

/// A claimed job delivery
///
/// The payload is decoded lazily: a malformed payload fails in the handler
/// layer (and is eventually dropped by the attempt bound) instead of wedging
/// the claim loop.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: i64,
    pub queue: String,
    pub kind: String,
    pub payload: String,
    /// 1-based delivery attempt
    pub attempt: u32,
}

impl Delivery {
    /// Decodes the payload into a typed job
    pub fn decode(&self) -> QueueResult<Job> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// What `fail` did with the job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Scheduled for redelivery at the given time
    Retry { at_ms: i64 },
    /// Attempt bound exhausted; the job was dropped
    Dropped,
}

/// Trait for durable queue implementations
///
/// `claim` takes the current time explicitly so delayed-delivery behavior is
/// directly testable. Claims are leases: a claimed job that is neither acked
/// nor failed becomes claimable again once its lease expires.
pub trait JobQueue: Send + Sync {
    /// Enqueues a job, optionally withheld until `not_before`
    fn push(&self, job: &Job, not_before: Option<DateTime<Utc>>) -> QueueResult<()>;

    /// Claims the next due job from any of the named queues
    fn claim(&self, queues: &[String], now: DateTime<Utc>) -> QueueResult<Option<Delivery>>;

    /// Acknowledges successful completion; the job is gone
    fn ack(&self, id: i64) -> QueueResult<()>;

    /// Records a failed execution: delayed retry, or drop at the attempt bound
    fn fail(&self, id: i64, now: DateTime<Utc>) -> QueueResult<FailOutcome>;

    /// Pending job counts per queue, for the stats mode
    fn pending_counts(&self) -> QueueResult<Vec<(String, u64)>>;
}
