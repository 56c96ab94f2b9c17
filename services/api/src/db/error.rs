//! Database failure modes.

use thiserror::Error;

/// Errors from the Postgres layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("could not connect to Postgres: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("could not apply migrations: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// No migration directory in any of the usual locations.
    #[error("no migrations directory; tried {tried} (last error: {last_error}); run from the repo root or services/api")]
    MigrationDirNotFound { tried: String, last_error: String },
}
