//! SQLite storage implementation

use crate::model::{BoardPost, Comment, Submission};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageResult};
use crate::storage::StoreStats;
use crate::DriftnetError;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the harvest database at the given path
    pub fn new(path: &Path) -> Result<Self, DriftnetError> {
        let conn = Connection::open(path)?;

        // Concurrent worker processes share this file
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DriftnetError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, table: &str) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }
}

impl Store for SqliteStore {
    fn upsert_submission(&mut self, submission: &Submission) -> StorageResult<u64> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO submissions (subreddit, post_id, created_at, author, title, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                submission.subreddit,
                submission.post_id,
                submission.created_at.to_rfc3339(),
                submission.author,
                submission.title,
                submission.data.to_string(),
            ],
        )?;
        Ok(inserted as u64)
    }

    fn upsert_comments(&mut self, comments: &[Comment]) -> StorageResult<u64> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO comments (subreddit, post_id, comment_id, created_at, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for comment in comments {
                inserted += stmt.execute(params![
                    comment.subreddit,
                    comment.post_id,
                    comment.comment_id,
                    comment.created_at.to_rfc3339(),
                    comment.data.to_string(),
                ])? as u64;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn upsert_board_posts(&mut self, posts: &[BoardPost]) -> StorageResult<u64> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO board_posts (board, thread_no, post_no, created_at, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for post in posts {
                inserted += stmt.execute(params![
                    post.board,
                    post.thread_no,
                    post.post_no,
                    post.created_at.to_rfc3339(),
                    post.data.to_string(),
                ])? as u64;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn stats(&self) -> StorageResult<StoreStats> {
        Ok(StoreStats {
            submissions: self.count("submissions")?,
            comments: self.count("comments")?,
            board_posts: self.count("board_posts")?,
        })
    }
}
