//! Postgres access for the event API.
//!
//! One pool feeds a handful of narrow stores: event records, sub-resource
//! owner lookups, user accounts and roles, and the background job tables.
//! Each store holds its own clone of the pool and nothing else.

mod error;
mod events;
mod jobs;
mod resources;
mod roles;

pub use error::DbError;
pub use events::{EventPage, EventStore};
pub use jobs::{ExportJobStore, JobQueue};
pub use resources::ResourceDirectory;
pub use roles::RoleStore;

use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/marquee";

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free connection before giving up.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl DbConfig {
    /// Reads `DATABASE_URL` and the `DB_*` pool knobs from the environment,
    /// keeping the default for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env_u32("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_u32("DB_MIN_CONNECTIONS", defaults.min_connections),
            ..defaults
        }
    }
}

fn env_u32(name: &str, fallback: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback)
}

/// Shared connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool against the configured server.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.database_url)
            .await
            .map_err(DbError::Connect)?;

        info!(
            max_connections = config.max_connections,
            "Database pool established"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cheap reachability probe for readiness checks.
    pub async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }

    /// Applies any pending migrations.
    ///
    /// The migrations directory is resolved at runtime so the binary works
    /// both from the repo root and from inside `services/api`.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        let candidates = [
            PathBuf::from("./migrations"),
            PathBuf::from("services/api/migrations"),
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
        ];

        let mut last_error = String::from("no candidate directories");
        for dir in &candidates {
            let migrator = match sqlx::migrate::Migrator::new(dir.clone()).await {
                Ok(migrator) => migrator,
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            };
            info!(migrations_dir = %dir.display(), "Applying migrations");
            migrator.run(&self.pool).await.map_err(DbError::Migration)?;
            info!("Migrations up to date");
            return Ok(());
        }

        Err(DbError::MigrationDirNotFound {
            tried: candidates
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_point_at_local_marquee() {
        let config = DbConfig::default();
        assert!(config.database_url.ends_with("/marquee"));
        assert!(config.min_connections <= config.max_connections);
    }

    #[test]
    fn env_u32_falls_back_when_unset() {
        assert_eq!(env_u32("MARQUEE_TEST_UNSET_KNOB", 7), 7);
    }
}
