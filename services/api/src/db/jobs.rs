//! Background job and export job storage.

use async_trait::async_trait;
use marquee_domain::{ExportArtifacts, JobSubmitter, StoreError, TaskKind};
use marquee_id::{EventId, ExportJobId, TaskId};
use sqlx::postgres::PgPool;

fn store_error(e: sqlx::Error) -> StoreError {
    StoreError::new(e.to_string())
}

/// Postgres-backed [`JobSubmitter`].
///
/// Tasks land in the `background_jobs` table as queued rows; workers poll
/// them out of band.
#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobSubmitter for JobQueue {
    async fn submit(
        &self,
        kind: TaskKind,
        event_id: EventId,
        args: serde_json::Value,
    ) -> Result<TaskId, StoreError> {
        let task_id = TaskId::new();

        sqlx::query(
            "INSERT INTO background_jobs (id, kind, event_id, args, status) VALUES ($1, $2, $3, $4, 'queued')",
        )
        .bind(task_id.to_string())
        .bind(kind.as_str())
        .bind(event_id.to_string())
        .bind(&args)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(task_id)
    }
}

/// Postgres-backed [`ExportArtifacts`].
#[derive(Clone)]
pub struct ExportJobStore {
    pool: PgPool,
}

impl ExportJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExportArtifacts for ExportJobStore {
    async fn record_job(&self, task: TaskId, event_id: EventId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO export_jobs (id, task, event_id) VALUES ($1, $2, $3)")
            .bind(ExportJobId::new().to_string())
            .bind(task.to_string())
            .bind(event_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn clear_urls(&self, event_id: EventId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE events SET ical_url = NULL, xcal_url = NULL, pentabarf_url = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(event_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }
}
