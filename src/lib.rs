//! Driftnet: a continuous discussion harvester
//!
//! This crate implements a job-queue-driven crawler that continuously harvests
//! discussion threads from two public JSON APIs (a paginated reddit-style
//! listing and a full-catalog imageboard) and persists them idempotently
//! into SQLite for downstream analysis.

pub mod client;
pub mod config;
pub mod crawl;
pub mod model;
pub mod queue;
pub mod seed;
pub mod storage;
pub mod worker;

use thiserror::Error;

/// Main error type for driftnet operations
#[derive(Debug, Error)]
pub enum DriftnetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Invalid endpoint URL: {0}")]
    BadEndpoint(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Malformed job payload: {0}")]
    BadJobPayload(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for driftnet operations
pub type Result<T> = std::result::Result<T, DriftnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawl::CrawlContext;
pub use queue::{Job, JobQueue, SqliteQueue};
pub use storage::{SqliteStore, Store};
