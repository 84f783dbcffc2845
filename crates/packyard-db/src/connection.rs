//! Database connection management.

use std::path::Path;

use diesel::{sql_query, Connection, RunQueryDsl, SqliteConnection};

use crate::{
    error::{DbError, Result},
    migration::apply_migrations,
};

/// SQLite connection with the registry schema applied.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens (or creates) the database at `path` and runs migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let mut conn = SqliteConnection::establish(&path_str)?;

        // WAL mode so readers are not blocked by lifecycle writes
        sql_query("PRAGMA journal_mode = WAL;")
            .execute(&mut conn)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        apply_migrations(&mut conn)?;

        Ok(Self {
            conn,
        })
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = SqliteConnection::establish(":memory:")?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn,
        })
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for DbConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
