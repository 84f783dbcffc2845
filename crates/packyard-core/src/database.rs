//! Shared database handle.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use diesel::Connection;
use packyard_db::DbConnection;

use crate::RegistryResult;

/// Thread-safe wrapper around a [`DbConnection`].
///
/// Cloning is cheap; every clone talks to the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<DbConnection>>,
}

impl Database {
    /// Opens the database at `path`, applying pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        Ok(Self::from_connection(DbConnection::open(path)?))
    }

    pub fn open_in_memory() -> RegistryResult<Self> {
        Ok(Self::from_connection(DbConnection::open_in_memory()?))
    }

    pub fn from_connection(conn: DbConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Locks the connection and returns the guard.
    pub fn conn(&self) -> RegistryResult<MutexGuard<'_, DbConnection>> {
        Ok(self.conn.lock()?)
    }

    /// Executes a function with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut conn = self.conn.lock()?;
        Ok(f(conn.conn())?)
    }

    /// Executes a function within a transaction. Nothing is committed if
    /// `f` fails.
    pub fn transaction<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut conn = self.conn.lock()?;
        Ok(conn.conn().transaction(f)?)
    }
}
