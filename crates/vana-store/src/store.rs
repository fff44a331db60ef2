//! Job row CRUD over a SQLite pool.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use vana_models::{Job, JobId, JobStatus, NewJob};

use crate::error::StoreResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id               TEXT PRIMARY KEY,
    status           TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    video_path       TEXT NOT NULL,
    video_filename   TEXT,
    video_size       INTEGER,
    report           TEXT,
    error            TEXT,
    chunks_processed INTEGER NOT NULL DEFAULT 0,
    total_chunks     INTEGER
);
CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
";

/// Raw row as stored; converted to [`Job`] after status parsing.
#[derive(Debug, FromRow)]
struct JobRow {
    id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    video_path: String,
    video_filename: Option<String>,
    video_size: Option<i64>,
    report: Option<String>,
    error: Option<String>,
    chunks_processed: i64,
    total_chunks: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> StoreResult<Job> {
        Ok(Job {
            id: JobId::from_string(self.id),
            status: self.status.parse::<JobStatus>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            video_path: self.video_path,
            video_filename: self.video_filename,
            video_size: self.video_size,
            report: self.report,
            error: self.error,
            chunks_processed: self.chunks_processed.max(0) as u32,
            total_chunks: self.total_chunks.map(|t| t.max(0) as u32),
        })
    }
}

const SELECT_COLUMNS: &str = "id, status, created_at, updated_at, video_path, \
     video_filename, video_size, report, error, chunks_processed, total_chunks";

/// Durable job record store.
///
/// Cheap to clone; all clones share the underlying pool. SQLite serializes
/// writers, which gives the per-row update atomicity the pipeline relies on
/// when multiple jobs run concurrently.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Connect to the given database URL (e.g. `sqlite://jobs.db?mode=rwc`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new().max_connections(5).connect(url).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. Single connection, since each `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Create the jobs table if it does not exist.
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a new job row in `Pending` state and return it.
    pub async fn create(&self, new_job: NewJob) -> StoreResult<Job> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO jobs (id, status, created_at, updated_at, video_path, \
             video_filename, video_size, chunks_processed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(new_job.id.as_str())
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .bind(&new_job.video_path)
        .bind(&new_job.video_filename)
        .bind(new_job.video_size)
        .execute(&self.pool)
        .await?;

        Ok(Job {
            id: new_job.id,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            video_path: new_job.video_path,
            video_filename: new_job.video_filename,
            video_size: new_job.video_size,
            report: None,
            error: None,
            chunks_processed: 0,
            total_chunks: None,
        })
    }

    /// Fetch a job by id.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE id = ?"))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(JobRow::into_job).transpose()
    }

    /// Move a pending job into `Processing`.
    ///
    /// Returns `Ok(false)` when the row no longer exists.
    pub async fn mark_processing(&self, id: &JobId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(JobStatus::Processing.as_str())
        .bind(Utc::now())
        .bind(id.as_str())
        .bind(JobStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.exists(id).await
    }

    /// Persist progress counters after a segment's analysis attempt.
    ///
    /// `total_chunks` is written the first time it is known and left alone on
    /// later calls. Writes against terminal rows are dropped (terminal states
    /// never revert). Returns `Ok(false)` when the row has vanished.
    pub async fn update_progress(
        &self,
        id: &JobId,
        chunks_processed: u32,
        total_chunks: Option<u32>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET chunks_processed = ?, \
             total_chunks = COALESCE(total_chunks, ?), updated_at = ? \
             WHERE id = ? AND status NOT IN ('COMPLETE', 'FAILED')",
        )
        .bind(chunks_processed as i64)
        .bind(total_chunks.map(|t| t as i64))
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.exists(id).await
    }

    /// Mark a job `Complete` with its final report.
    ///
    /// Idempotent no-op if the job is already terminal. Returns `Ok(false)`
    /// when the row has vanished.
    pub async fn complete(&self, id: &JobId, report: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, report = ?, \
             chunks_processed = COALESCE(total_chunks, chunks_processed), updated_at = ? \
             WHERE id = ? AND status NOT IN ('COMPLETE', 'FAILED')",
        )
        .bind(JobStatus::Complete.as_str())
        .bind(report)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(job_id = %id, "job marked complete");
            return Ok(true);
        }
        self.exists(id).await
    }

    /// Mark a job `Failed` with a terminal error description.
    ///
    /// Idempotent no-op if the job is already terminal. Returns `Ok(false)`
    /// when the row has vanished.
    pub async fn fail(&self, id: &JobId, error: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, error = ?, updated_at = ? \
             WHERE id = ? AND status NOT IN ('COMPLETE', 'FAILED')",
        )
        .bind(JobStatus::Failed.as_str())
        .bind(error)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(job_id = %id, "job marked failed");
            return Ok(true);
        }
        self.exists(id).await
    }

    /// List jobs in stable creation order, optionally filtered by status.
    pub async fn list(
        &self,
        offset: i64,
        limit: i64,
        status: Option<JobStatus>,
    ) -> StoreResult<Vec<Job>> {
        let rows: Vec<JobRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "SELECT {SELECT_COLUMNS} FROM jobs WHERE status = ? \
                     ORDER BY created_at, id LIMIT ? OFFSET ?"
                ))
                .bind(status.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {SELECT_COLUMNS} FROM jobs \
                     ORDER BY created_at, id LIMIT ? OFFSET ?"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(JobRow::into_job).collect()
    }

    /// Delete a job row, returning the deleted job so the caller can remove
    /// its on-disk artifacts. Returns `None` for unknown ids.
    ///
    /// A single atomic statement, so concurrent deletes of the same id
    /// cannot both observe the row.
    pub async fn delete(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "DELETE FROM jobs WHERE id = ? RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(JobRow::into_job).transpose()
    }

    async fn exists(&self, id: &JobId) -> StoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
