//! SQLite-backed durable queue
//!
//! One table of pending jobs. Delivery is lease-based: claiming a job stamps
//! a lease expiry instead of removing the row, so a worker that dies
//! mid-handler loses nothing; the lease runs out and the job is claimed
//! again. Acknowledgement deletes the row. This gives at-least-once
//! delivery, which the idempotent handlers are built for.

use crate::queue::{Delivery, FailOutcome, Job, JobQueue, QueueError, QueueResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Queue schema; timestamps are unix milliseconds so SQL comparisons are cheap
const QUEUE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    not_before INTEGER NOT NULL,
    leased_until INTEGER,
    attempts INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs(queue, not_before);
"#;

/// Tuning for redelivery behavior
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Delay before a failed job becomes claimable again
    pub retry_delay: Duration,

    /// Deliveries before a persistently failing job is dropped
    pub max_attempts: u32,

    /// How long a claim holds a job before it is considered abandoned
    pub lease: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(30),
            max_attempts: 5,
            lease: Duration::from_secs(600),
        }
    }
}

/// SQLite-backed job queue
pub struct SqliteQueue {
    conn: Mutex<Connection>,
    settings: QueueSettings,
}

impl SqliteQueue {
    /// Opens (or creates) the queue database at the given path
    pub fn new(path: &Path, settings: QueueSettings) -> QueueResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;
        conn.execute_batch(QUEUE_SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            settings,
        })
    }

    /// Creates an in-memory queue (for testing)
    #[cfg(test)]
    pub fn new_in_memory(settings: QueueSettings) -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(QUEUE_SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            settings,
        })
    }
}

impl JobQueue for SqliteQueue {
    fn push(&self, job: &Job, not_before: Option<DateTime<Utc>>) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        let now_ms = Utc::now().timestamp_millis();
        let not_before_ms = not_before.map(|t| t.timestamp_millis()).unwrap_or(now_ms);

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO jobs (queue, kind, payload, not_before, attempts, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![job.queue(), job.kind(), payload, not_before_ms, now_ms],
        )?;
        tracing::debug!(
            "enqueued {} on {} (not_before={})",
            job.kind(),
            job.queue(),
            not_before_ms
        );
        Ok(())
    }

    fn claim(&self, queues: &[String], now: DateTime<Utc>) -> QueueResult<Option<Delivery>> {
        if queues.is_empty() {
            return Ok(None);
        }
        let now_ms = now.timestamp_millis();
        let lease_ms = self.settings.lease.as_millis() as i64;

        let conn = self.conn.lock().unwrap();

        let placeholders = vec!["?"; queues.len()].join(", ");
        let select = format!(
            "SELECT id, queue, kind, payload, attempts FROM jobs
             WHERE queue IN ({placeholders})
               AND not_before <= ?
               AND (leased_until IS NULL OR leased_until <= ?)
             ORDER BY id
             LIMIT 1"
        );

        let mut values: Vec<rusqlite::types::Value> = queues
            .iter()
            .map(|q| rusqlite::types::Value::from(q.clone()))
            .collect();
        values.push(now_ms.into());
        values.push(now_ms.into());

        let row = conn
            .query_row(&select, rusqlite::params_from_iter(values), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            })
            .optional()?;

        let Some((id, queue, kind, payload, attempts)) = row else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE jobs SET leased_until = ?1, attempts = attempts + 1 WHERE id = ?2",
            params![now_ms + lease_ms, id],
        )?;

        Ok(Some(Delivery {
            id,
            queue,
            kind,
            payload,
            attempt: attempts + 1,
        }))
    }

    fn ack(&self, id: i64) -> QueueResult<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(QueueError::UnknownJob(id));
        }
        Ok(())
    }

    fn fail(&self, id: i64, now: DateTime<Utc>) -> QueueResult<FailOutcome> {
        let conn = self.conn.lock().unwrap();

        let attempts: u32 = conn
            .query_row("SELECT attempts FROM jobs WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or(QueueError::UnknownJob(id))?;

        if attempts >= self.settings.max_attempts {
            conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
            return Ok(FailOutcome::Dropped);
        }

        let retry_at =
            now + ChronoDuration::milliseconds(self.settings.retry_delay.as_millis() as i64);
        let retry_at_ms = retry_at.timestamp_millis();
        conn.execute(
            "UPDATE jobs SET leased_until = NULL, not_before = ?1 WHERE id = ?2",
            params![retry_at_ms, id],
        )?;
        Ok(FailOutcome::Retry { at_ms: retry_at_ms })
    }

    fn pending_counts(&self) -> QueueResult<Vec<(String, u64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT queue, COUNT(*) FROM jobs GROUP BY queue ORDER BY queue")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
