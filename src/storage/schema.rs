//! Database schema definitions
//!
//! Unique constraints carry the identity tuples; inserts use
//! `INSERT OR IGNORE` so duplicate captures are silent no-ops.

/// SQL schema for the harvest database
pub const SCHEMA_SQL: &str = r#"
-- Reddit submissions
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subreddit TEXT NOT NULL,
    post_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    author TEXT,
    title TEXT,
    data TEXT NOT NULL,
    UNIQUE(subreddit, post_id)
);

CREATE INDEX IF NOT EXISTS idx_submissions_subreddit ON submissions(subreddit);
CREATE INDEX IF NOT EXISTS idx_submissions_created ON submissions(created_at);

-- First-level reddit comments
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subreddit TEXT NOT NULL,
    post_id TEXT NOT NULL,
    comment_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    data TEXT NOT NULL,
    UNIQUE(subreddit, post_id, comment_id)
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(subreddit, post_id);

-- Imageboard posts (the opening post shares its thread number)
CREATE TABLE IF NOT EXISTS board_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    board TEXT NOT NULL,
    thread_no INTEGER NOT NULL,
    post_no INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    data TEXT NOT NULL,
    UNIQUE(board, thread_no, post_no)
);

CREATE INDEX IF NOT EXISTS idx_board_posts_thread ON board_posts(board, thread_no);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
