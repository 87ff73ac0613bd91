use serde::Deserialize;

/// Main configuration structure for driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub worker: WorkerConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub sources: SourcesConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of job handlers running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long to sleep between queue polls when no job is ready (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How many times a failing job is redelivered before it is dropped
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before a failed job becomes claimable again (seconds)
    #[serde(rename = "retry-delay-seconds", default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    /// Named queues this worker pulls from; defaults to all of them
    #[serde(default)]
    pub queues: Vec<String>,
}

/// Crawl cadence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Delay before a listing job re-polls its community from the top (seconds)
    #[serde(rename = "relist-delay-seconds", default = "default_relist_delay")]
    pub relist_delay_seconds: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            relist_delay_seconds: default_relist_delay(),
        }
    }
}

/// Per-source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub imageboard: ImageboardConfig,
    pub reddit: RedditConfig,
}

/// Imageboard source: full-catalog listings, no pagination
#[derive(Debug, Clone, Deserialize)]
pub struct ImageboardConfig {
    /// API base URL (e.g., "https://a.4cdn.org")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Boards to harvest
    #[serde(default)]
    pub boards: Vec<String>,
}

/// Reddit source: cursor-paginated listings, rate limited by the server
#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    /// API base URL (e.g., "https://www.reddit.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Subreddits to harvest
    #[serde(default)]
    pub subreddits: Vec<String>,

    /// Items per listing page
    #[serde(rename = "listing-limit", default = "default_listing_limit")]
    pub listing_limit: u32,

    /// Comments requested per thread fetch
    #[serde(rename = "comment-limit", default = "default_comment_limit")]
    pub comment_limit: u32,

    /// Minimum time between requests to this source (milliseconds)
    #[serde(rename = "min-spacing-ms", default = "default_min_spacing")]
    pub min_spacing_ms: u64,

    /// Random extra spacing added on top of the minimum (milliseconds)
    #[serde(rename = "spacing-jitter-ms", default = "default_spacing_jitter")]
    pub spacing_jitter_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database holding harvested records
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the SQLite database backing the job queue
    #[serde(rename = "queue-path")]
    pub queue_path: String,
}

fn default_concurrency() -> u32 {
    3
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    30
}

fn default_relist_delay() -> u64 {
    300
}

fn default_listing_limit() -> u32 {
    100
}

fn default_comment_limit() -> u32 {
    500
}

fn default_min_spacing() -> u64 {
    1000
}

fn default_spacing_jitter() -> u64 {
    400
}
