//! Typed records and payload normalizers
//!
//! The records in this module are what the store persists; the normalizers
//! in [`normalize`] turn raw API payloads into them without doing any I/O.

mod normalize;

pub use normalize::{
    board_posts, comments_from_thread, listing_page, submission_from_thread, thread_numbers,
};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A top-level reddit submission
///
/// Identity is `(subreddit, post_id)`; re-fetching a known submission is a
/// storage no-op.
#[derive(Debug, Clone)]
pub struct Submission {
    pub subreddit: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub title: Option<String>,
    /// Full raw payload, kept for downstream analysis
    pub data: Value,
}

/// A first-level comment under a reddit submission
#[derive(Debug, Clone)]
pub struct Comment {
    pub subreddit: String,
    pub post_id: String,
    pub comment_id: String,
    pub created_at: DateTime<Utc>,
    pub data: Value,
}

/// A single post inside an imageboard thread
///
/// The opening post carries `post_no == thread_no`.
#[derive(Debug, Clone)]
pub struct BoardPost {
    pub board: String,
    pub thread_no: u64,
    pub post_no: u64,
    pub created_at: DateTime<Utc>,
    pub data: Value,
}

/// Converts source-provided epoch seconds into a UTC timestamp
///
/// Out-of-range values collapse to the epoch rather than failing the record.
pub(crate) fn epoch_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
