//! Reddit crawl handlers
//!
//! Listing discovery walks the cursor chain as fast as pacing allows, while
//! a delayed no-cursor restart bounds staleness even when pagination misses
//! something. Submission detail and comments are separate fetches against
//! the same endpoint, so each submission costs two paced requests; the
//! fan-out through the queue keeps that from blocking listing discovery.

use crate::crawl::CrawlContext;
use crate::model::{comments_from_thread, listing_page, submission_from_thread};
use crate::queue::{Job, JobQueue};
use crate::storage::Store;
use crate::Result;
use chrono::Utc;

/// Fetches one page of a subreddit's newest submissions and fans out
///
/// Enqueues a `CrawlSubmission` job per discovered id and an immediate
/// next-page listing when the cursor chain continues. A delayed no-cursor
/// restart is always enqueued, on every outcome including a failed fetch,
/// so a lost page never breaks the polling cycle.
pub async fn crawl_subreddit_listing(
    ctx: &CrawlContext,
    subreddit: &str,
    after: Option<&str>,
) -> Result<()> {
    match ctx.reddit.list_new(subreddit, after).await? {
        Some(payload) => {
            let (post_ids, next_after) = listing_page(&payload);
            tracing::info!(
                "r/{} listing: {} submissions, next cursor {:?}",
                subreddit,
                post_ids.len(),
                next_after
            );

            for post_id in post_ids {
                ctx.queue.push(
                    &Job::CrawlSubmission {
                        subreddit: subreddit.to_string(),
                        post_id,
                    },
                    None,
                )?;
            }

            // Fast-path pagination: keep walking the cursor chain
            if let Some(next_after) = next_after {
                ctx.queue.push(
                    &Job::CrawlSubredditListing {
                        subreddit: subreddit.to_string(),
                        after: Some(next_after),
                    },
                    None,
                )?;
            }
        }
        None => {
            tracing::warn!("no listing data for r/{} after={:?}", subreddit, after);
        }
    }

    // Restart discovery from the top after the relist delay
    let run_at = Utc::now() + ctx.relist_delay();
    ctx.queue.push(
        &Job::CrawlSubredditListing {
            subreddit: subreddit.to_string(),
            after: None,
        },
        Some(run_at),
    )?;

    Ok(())
}

/// Fetches a submission's detail and hands its comments off to a follow-up job
pub async fn crawl_submission(ctx: &CrawlContext, subreddit: &str, post_id: &str) -> Result<()> {
    let Some(payload) = ctx.reddit.comments(post_id).await? else {
        tracing::info!("no submission body for r/{} {}", subreddit, post_id);
        return Ok(());
    };

    let Some(submission) = submission_from_thread(subreddit, post_id, &payload) else {
        tracing::info!("no submission body for r/{} {}", subreddit, post_id);
        return Ok(());
    };

    let inserted = {
        let mut store = ctx.store.lock().unwrap();
        store.upsert_submission(&submission)?
    };
    tracing::info!(
        "Inserted {} submission row for r/{} {}",
        inserted,
        subreddit,
        post_id
    );

    ctx.queue.push(
        &Job::CrawlComments {
            subreddit: subreddit.to_string(),
            post_id: post_id.to_string(),
        },
        None,
    )?;

    Ok(())
}

/// Fetches a submission's first-level comments and upserts them in one batch
///
/// Leaf of the fan-out: nothing further is enqueued.
pub async fn crawl_comments(ctx: &CrawlContext, subreddit: &str, post_id: &str) -> Result<()> {
    let Some(payload) = ctx.reddit.comments(post_id).await? else {
        tracing::info!("no comments for r/{} {}", subreddit, post_id);
        return Ok(());
    };

    let comments = comments_from_thread(subreddit, post_id, &payload);
    if comments.is_empty() {
        return Ok(());
    }

    let inserted = {
        let mut store = ctx.store.lock().unwrap();
        store.upsert_comments(&comments)?
    };
    tracing::info!(
        "Inserted {} comments for r/{} {} ({} fetched)",
        inserted,
        subreddit,
        post_id,
        comments.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::{drain_queue, drain_queue_at, test_context};
    use crate::queue::QUEUE_REDDIT;
    use crate::storage::Store;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing_body(ids: &[&str], after: Option<&str>) -> serde_json::Value {
        json!({"data": {
            "children": ids
                .iter()
                .map(|id| json!({"kind": "t3", "data": {"id": id}}))
                .collect::<Vec<_>>(),
            "after": after,
        }})
    }

    fn comments_body(post_id: &str, comment_ids: &[&str]) -> serde_json::Value {
        json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {
                    "id": post_id,
                    "author": "someone",
                    "title": "a title",
                    "created_utc": 1700000000.0
                }}
            ]}},
            {"kind": "Listing", "data": {"children": comment_ids
                .iter()
                .map(|id| json!({"kind": "t1", "data": {"id": id, "created_utc": 1700000050.0}}))
                .collect::<Vec<_>>()
            }}
        ])
    }

    #[tokio::test]
    async fn test_listing_fans_out_and_paginates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(listing_body(&["aaa", "bbb"], Some("t3_bbb"))),
            )
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_subreddit_listing(&ctx, "politics", None).await.unwrap();

        let jobs = drain_queue(&ctx, QUEUE_REDDIT);
        assert_eq!(
            jobs,
            vec![
                Job::CrawlSubmission {
                    subreddit: "politics".to_string(),
                    post_id: "aaa".to_string(),
                },
                Job::CrawlSubmission {
                    subreddit: "politics".to_string(),
                    post_id: "bbb".to_string(),
                },
                // The cursor chain continues immediately
                Job::CrawlSubredditListing {
                    subreddit: "politics".to_string(),
                    after: Some("t3_bbb".to_string()),
                },
            ]
        );

        // Plus the delayed restart from the top
        let later = Utc::now() + ChronoDuration::seconds(301);
        let delayed = drain_queue_at(&ctx, QUEUE_REDDIT, later);
        assert_eq!(
            delayed,
            vec![Job::CrawlSubredditListing {
                subreddit: "politics".to_string(),
                after: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_exhausted_cursor_stops_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .and(query_param("after", "t3_zzz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[], None)))
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_subreddit_listing(&ctx, "politics", Some("t3_zzz"))
            .await
            .unwrap();

        // No follow-up page job, only the delayed restart
        assert!(drain_queue(&ctx, QUEUE_REDDIT).is_empty());
        let later = Utc::now() + ChronoDuration::seconds(301);
        let delayed = drain_queue_at(&ctx, QUEUE_REDDIT, later);
        assert_eq!(
            delayed,
            vec![Job::CrawlSubredditListing {
                subreddit: "politics".to_string(),
                after: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_listing_still_reschedules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/politics/new.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_subreddit_listing(&ctx, "politics", None).await.unwrap();

        assert!(drain_queue(&ctx, QUEUE_REDDIT).is_empty());
        let later = Utc::now() + ChronoDuration::seconds(301);
        assert_eq!(drain_queue_at(&ctx, QUEUE_REDDIT, later).len(), 1);
    }

    #[tokio::test]
    async fn test_submission_upserts_and_chains_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/abc.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(comments_body("abc", &["c1"])),
            )
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_submission(&ctx, "politics", "abc").await.unwrap();

        let stats = ctx.store.lock().unwrap().stats().unwrap();
        assert_eq!(stats.submissions, 1);

        let jobs = drain_queue(&ctx, QUEUE_REDDIT);
        assert_eq!(
            jobs,
            vec![Job::CrawlComments {
                subreddit: "politics".to_string(),
                post_id: "abc".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_deleted_submission_stops_the_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/gone.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_submission(&ctx, "politics", "gone").await.unwrap();

        let stats = ctx.store.lock().unwrap().stats().unwrap();
        assert_eq!(stats.submissions, 0);
        assert!(drain_queue(&ctx, QUEUE_REDDIT).is_empty());
    }

    #[tokio::test]
    async fn test_comments_are_upserted_without_fanout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/abc.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(comments_body("abc", &["c1", "c2"])),
            )
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_comments(&ctx, "politics", "abc").await.unwrap();

        let stats = ctx.store.lock().unwrap().stats().unwrap();
        assert_eq!(stats.comments, 2);
        assert!(drain_queue(&ctx, QUEUE_REDDIT).is_empty());
    }

    #[tokio::test]
    async fn test_redelivered_submission_job_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments/abc.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(comments_body("abc", &["c1"])),
            )
            .mount(&server)
            .await;

        let ctx = test_context(&server.uri());
        crawl_submission(&ctx, "politics", "abc").await.unwrap();
        crawl_submission(&ctx, "politics", "abc").await.unwrap();

        let stats = ctx.store.lock().unwrap().stats().unwrap();
        // One row, even though the fetch and upsert ran twice
        assert_eq!(stats.submissions, 1);
    }
}
