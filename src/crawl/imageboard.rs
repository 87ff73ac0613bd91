//! Imageboard crawl handlers
//!
//! The board API has no pagination: every listing fetch is a full snapshot
//! of the live threads. Continuity comes from the listing job carrying the
//! previous snapshot in its arguments. Threads present before but missing
//! now ("dead" threads) get one final fetch before they are unreachable,
//! because the detail endpoint usually serves a just-pruned thread for a
//! short while.

use crate::crawl::CrawlContext;
use crate::model::{board_posts, thread_numbers};
use crate::queue::{Job, JobQueue};
use crate::storage::Store;
use crate::Result;
use chrono::Utc;
use std::collections::BTreeSet;

/// Snapshots a board's live threads and fans out per-thread fetch jobs
///
/// Enqueues a `CrawlBoardThread` job for every thread that is live now or
/// was live in the previous snapshot (the union keeps the final state of
/// just-died threads), then reschedules itself with the current snapshot.
///
/// When the listing fetch fails for the cycle, no fan-out happens but the
/// reschedule still fires with the previous snapshot unchanged, so dead
/// threads are still detected one cycle late.
pub async fn crawl_board_listing(
    ctx: &CrawlContext,
    board: &str,
    previous_threads: &[u64],
) -> Result<()> {
    let previous: BTreeSet<u64> = previous_threads.iter().copied().collect();

    let snapshot = match ctx.imageboard.threads(board).await? {
        Some(payload) => {
            let current = thread_numbers(&payload);

            // Threads that existed before but are gone now still get one
            // final capture
            let dead: BTreeSet<u64> = previous.difference(&current).copied().collect();
            let targets: BTreeSet<u64> = current.union(&dead).copied().collect();

            tracing::info!(
                "/{}/ targets to crawl: {} ({} current + {} dead)",
                board,
                targets.len(),
                current.len(),
                dead.len()
            );

            for thread_no in targets {
                ctx.queue.push(
                    &Job::CrawlBoardThread {
                        board: board.to_string(),
                        thread_no,
                    },
                    None,
                )?;
            }

            current
        }
        None => {
            tracing::warn!("no thread listing for /{}/ this cycle", board);
            previous
        }
    };

    // Reschedule the listing; this is what keeps coverage continuous
    let run_at = Utc::now() + ctx.relist_delay();
    ctx.queue.push(
        &Job::CrawlBoardListing {
            board: board.to_string(),
            previous_threads: snapshot.into_iter().collect(),
        },
        Some(run_at),
    )?;

    Ok(())
}

/// Fetches one thread and upserts every post in it
///
/// A 404 means the thread is gone for good; that ends its story without
/// error (it may already have been captured while live).
pub async fn crawl_board_thread(ctx: &CrawlContext, board: &str, thread_no: u64) -> Result<()> {
    tracing::info!("Getting thread /{}/{}", board, thread_no);

    let Some(payload) = ctx.imageboard.thread(board, thread_no).await? else {
        tracing::warn!("Empty thread /{}/{}", board, thread_no);
        return Ok(());
    };

    let posts = board_posts(board, thread_no, &payload);
    if posts.is_empty() {
        tracing::warn!("Empty thread /{}/{}", board, thread_no);
        return Ok(());
    }

    let inserted = {
        let mut store = ctx.store.lock().unwrap();
        store.upsert_board_posts(&posts)?
    };
    tracing::info!(
        "Inserted {} posts for /{}/{} ({} fetched)",
        inserted,
        board,
        thread_no,
        posts.len()
    );

    Ok(())
}
