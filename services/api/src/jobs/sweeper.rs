//! Periodic pruning of finished job rows.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct JobSweeperConfig {
    pub interval: Duration,
    /// Completed and failed rows older than this are dropped.
    pub completed_job_retention_days: i32,
    pub export_job_retention_days: i32,
}

impl Default for JobSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            completed_job_retention_days: 7,
            export_job_retention_days: 30,
        }
    }
}

const BACKGROUND_SWEEP_SQL: &str = "DELETE FROM background_jobs \
     WHERE status IN ('completed', 'failed') \
       AND created_at < now() - make_interval(days => $1)";

const EXPORT_SWEEP_SQL: &str =
    "DELETE FROM export_jobs WHERE created_at < now() - make_interval(days => $1)";

/// Deletes finished `background_jobs` and stale `export_jobs` rows on a
/// timer. Live rows, queued or running, are never touched.
pub struct JobSweeper {
    pool: PgPool,
    config: JobSweeperConfig,
}

impl JobSweeper {
    pub fn new(pool: PgPool, config: JobSweeperConfig) -> Self {
        Self { pool, config }
    }

    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting job sweeper"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Job sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn sweep(&self) {
        self.prune(
            "background_jobs",
            BACKGROUND_SWEEP_SQL,
            self.config.completed_job_retention_days,
        )
        .await;

        self.prune(
            "export_jobs",
            EXPORT_SWEEP_SQL,
            self.config.export_job_retention_days,
        )
        .await;
    }

    async fn prune(&self, table: &str, sql: &str, retention_days: i32) {
        match sqlx::query(sql)
            .bind(retention_days)
            .execute(&self.pool)
            .await
        {
            Ok(result) if result.rows_affected() > 0 => {
                info!(table, deleted = result.rows_affected(), "Swept job rows");
            }
            Ok(_) => {}
            Err(e) => warn!(table, error = %e, "Sweep pass failed"),
        }
    }
}
