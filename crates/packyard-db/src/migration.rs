use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use crate::error::{DbError, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs every pending migration and returns how many were applied.
pub fn apply_migrations(conn: &mut SqliteConnection) -> Result<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| DbError::MigrationError(err.to_string()))?;

    for version in &applied {
        debug!(%version, "applied migration");
    }

    Ok(applied.len())
}
