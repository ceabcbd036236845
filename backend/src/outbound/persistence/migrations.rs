//! Embedded schema migrations.
//!
//! The SQL under `backend/migrations` is compiled into the binary so that a
//! process (or a test) can bring an empty database up to date without the
//! Diesel CLI. Migrations run on a blocking connection; async callers should
//! wrap [`run_pending_migrations`] in `tokio::task::spawn_blocking`.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations shipped with the crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
}

/// Apply every pending migration to the database at `database_url`.
///
/// Returns the versions that were applied, oldest first.
///
/// # Errors
///
/// Returns [`MigrationError`] when connecting or applying fails.
pub fn run_pending_migrations(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut connection =
        PgConnection::establish(database_url).map_err(|error| MigrationError::Connect {
            message: error.to_string(),
        })?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| MigrationError::Apply {
            message: error.to_string(),
        })?;
    let versions: Vec<String> = applied.iter().map(ToString::to_string).collect();
    info!(count = versions.len(), "applied pending migrations");
    Ok(versions)
}
