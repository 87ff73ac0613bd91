//! Storage traits and error types

use crate::model::{BoardPost, Comment, Submission};
use crate::storage::StoreStats;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every upsert is keyed on the record's natural identity and does nothing on
/// conflict; the returned count is the number of rows actually inserted.
/// Batch upserts are all-or-nothing: a mid-batch failure rolls the whole
/// batch back so the job-level retry re-runs it cleanly.
pub trait Store: Send {
    /// Upserts one submission, keyed on `(subreddit, post_id)`
    fn upsert_submission(&mut self, submission: &Submission) -> StorageResult<u64>;

    /// Upserts a batch of comments, keyed on `(subreddit, post_id, comment_id)`
    fn upsert_comments(&mut self, comments: &[Comment]) -> StorageResult<u64>;

    /// Upserts a batch of board posts, keyed on `(board, thread_no, post_no)`
    fn upsert_board_posts(&mut self, posts: &[BoardPost]) -> StorageResult<u64>;

    /// Row counts per table
    fn stats(&self) -> StorageResult<StoreStats>;
}
