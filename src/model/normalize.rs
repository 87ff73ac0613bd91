//! Pure payload normalizers
//!
//! Every function here takes a raw `serde_json::Value` straight off the wire
//! and extracts typed records, identifier sets, or cursors. Partially missing
//! fields degrade to empty/None instead of failing: the sources serve
//! user-generated content and the schemas drift.

use super::{epoch_to_utc, BoardPost, Comment, Submission};
use serde_json::Value;
use std::collections::BTreeSet;

/// Extracts the set of live thread numbers from a board listing payload
///
/// The payload is a list of pages, each with a `threads` array of stubs.
/// Pages or stubs without the expected shape are skipped.
pub fn thread_numbers(payload: &Value) -> BTreeSet<u64> {
    let mut numbers = BTreeSet::new();
    let Some(pages) = payload.as_array() else {
        return numbers;
    };
    for page in pages {
        let Some(threads) = page.get("threads").and_then(Value::as_array) else {
            continue;
        };
        for stub in threads {
            if let Some(no) = stub.get("no").and_then(Value::as_u64) {
                numbers.insert(no);
            }
        }
    }
    numbers
}

/// Extracts every post in an imageboard thread payload
///
/// Posts without a number are skipped; a missing timestamp collapses to the
/// epoch so the record is still captured.
pub fn board_posts(board: &str, thread_no: u64, payload: &Value) -> Vec<BoardPost> {
    let Some(posts) = payload.get("posts").and_then(Value::as_array) else {
        return Vec::new();
    };
    posts
        .iter()
        .filter_map(|post| {
            let post_no = post.get("no").and_then(Value::as_u64)?;
            let time = post.get("time").and_then(Value::as_i64).unwrap_or(0);
            Some(BoardPost {
                board: board.to_string(),
                thread_no,
                post_no,
                created_at: epoch_to_utc(time),
                data: post.clone(),
            })
        })
        .collect()
}

/// Extracts submission ids and the pagination cursor from a listing page
///
/// Returns the ids present "now" (in listing order) and the `after` cursor;
/// a JSON `null` cursor means the listing is exhausted.
pub fn listing_page(payload: &Value) -> (Vec<String>, Option<String>) {
    let Some(data) = payload.get("data") else {
        return (Vec::new(), None);
    };

    let ids = data
        .get("children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter_map(|child| {
                    child
                        .get("data")
                        .and_then(|d| d.get("id"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();

    let after = data
        .get("after")
        .and_then(Value::as_str)
        .map(str::to_string);

    (ids, after)
}

/// Extracts the submission record from a comments-endpoint payload
///
/// The payload is a two-node array; node 0 holds the submission listing.
/// Returns `None` when the node is missing or empty (deleted submissions
/// serve an empty children array).
pub fn submission_from_thread(subreddit: &str, post_id: &str, payload: &Value) -> Option<Submission> {
    let data = payload
        .get(0)?
        .get("data")?
        .get("children")?
        .get(0)?
        .get("data")?;

    let created = data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0);
    Some(Submission {
        subreddit: subreddit.to_string(),
        post_id: post_id.to_string(),
        created_at: epoch_to_utc(created as i64),
        author: data.get("author").and_then(Value::as_str).map(str::to_string),
        title: data.get("title").and_then(Value::as_str).map(str::to_string),
        data: data.clone(),
    })
}

/// Extracts first-level comments from a comments-endpoint payload
///
/// Node 1 of the two-node array holds the comment listing. Only `t1` nodes
/// are comments; the listing also carries `more` placeholders, which are
/// skipped.
pub fn comments_from_thread(subreddit: &str, post_id: &str, payload: &Value) -> Vec<Comment> {
    let Some(children) = payload
        .get(1)
        .and_then(|node| node.get("data"))
        .and_then(|data| data.get("children"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    children
        .iter()
        .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
        .filter_map(|child| {
            let data = child.get("data")?;
            let comment_id = data.get("id").and_then(Value::as_str)?.to_string();
            let created = data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0);
            Some(Comment {
                subreddit: subreddit.to_string(),
                post_id: post_id.to_string(),
                comment_id,
                created_at: epoch_to_utc(created as i64),
                data: data.clone(),
            })
        })
        .collect()
}
