//! Worker pool
//!
//! Pulls jobs from the configured queues and runs their handlers with
//! bounded concurrency. Acknowledgement happens only after a handler
//! returns success, so an interrupted or failing execution is redelivered
//! by the queue; the handlers' idempotence makes that safe.

use crate::crawl::{self, CrawlContext};
use crate::queue::{all_queues, Delivery, FailOutcome, JobQueue};
use crate::{DriftnetError, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Job-pulling worker pool
pub struct Worker {
    ctx: Arc<CrawlContext>,
    queues: Vec<String>,
    concurrency: u32,
    poll_interval: Duration,
}

impl Worker {
    /// Creates a worker from the context's configuration
    ///
    /// An empty `worker.queues` list means pull from every queue.
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        let worker_config = &ctx.config.worker;
        let queues = if worker_config.queues.is_empty() {
            all_queues()
        } else {
            worker_config.queues.clone()
        };
        let concurrency = worker_config.concurrency;
        let poll_interval = Duration::from_millis(worker_config.poll_interval_ms);

        Self {
            ctx,
            queues,
            concurrency,
            poll_interval,
        }
    }

    /// Runs until ctrl-c, then lets in-flight handlers finish
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            "Worker starting: queues={:?}, concurrency={}",
            self.queues,
            self.concurrency
        );

        let shutdown = Arc::new(AtomicBool::new(false));
        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown requested, finishing in-flight jobs");
                    shutdown.store(true, Ordering::SeqCst);
                }
            });
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency as usize));

        while !shutdown.load(Ordering::SeqCst) {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            match self.ctx.queue.claim(&self.queues, Utc::now()) {
                Ok(Some(delivery)) => {
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        process(ctx, delivery).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!("Queue claim failed: {}", e);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        // Drain: every permit back means every spawned handler is done
        let _ = semaphore.acquire_many(self.concurrency).await;
        tracing::info!("Worker stopped");
        Ok(())
    }

    /// Processes claimable jobs sequentially until none are due
    ///
    /// Delayed jobs stay in the queue, so a seeded crawl settles once its
    /// immediate fan-out is exhausted. Used by tests to run a bounded number
    /// of cycles of an otherwise endless crawl.
    pub async fn run_until_idle(&self) -> Result<()> {
        while let Some(delivery) = self.ctx.queue.claim(&self.queues, Utc::now())? {
            process(self.ctx.clone(), delivery).await;
        }
        Ok(())
    }
}

/// Runs one delivered job and settles it with the queue
async fn process(ctx: Arc<CrawlContext>, delivery: Delivery) {
    let outcome = match delivery.decode() {
        Ok(job) => {
            tracing::info!(
                "Running {} (queue={}, attempt={})",
                delivery.kind,
                delivery.queue,
                delivery.attempt
            );
            crawl::dispatch(&ctx, job).await
        }
        // Defensive: the payload may come from an older producer or be
        // corrupt; treat it as a failed execution and let the attempt
        // bound dispose of it
        Err(e) => Err(DriftnetError::BadJobPayload(e.to_string())),
    };

    match outcome {
        Ok(()) => {
            if let Err(e) = ctx.queue.ack(delivery.id) {
                tracing::error!("Failed to ack job {}: {}", delivery.id, e);
            }
        }
        Err(e) => {
            tracing::warn!(
                "Job {} failed on attempt {}: {}",
                delivery.kind,
                delivery.attempt,
                e
            );
            match ctx.queue.fail(delivery.id, Utc::now()) {
                Ok(FailOutcome::Retry { .. }) => {}
                Ok(FailOutcome::Dropped) => {
                    tracing::error!(
                        "Dropping job {} after {} attempts",
                        delivery.kind,
                        delivery.attempt
                    );
                }
                Err(e) => tracing::error!("Failed to record job failure: {}", e),
            }
        }
    }
}
