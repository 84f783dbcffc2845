//! Names of the packages currently served, with their last update time.

use diesel::prelude::*;

use crate::schema::provider_index;

pub struct ProviderIndexRepository;

impl ProviderIndexRepository {
    /// Registers a package as served, or bumps its modification time.
    pub fn touch(
        conn: &mut SqliteConnection,
        name: &str,
        last_modified: &str,
    ) -> QueryResult<usize> {
        diesel::insert_into(provider_index::table)
            .values((
                provider_index::name.eq(name),
                provider_index::last_modified.eq(last_modified),
            ))
            .on_conflict(provider_index::name)
            .do_update()
            .set(provider_index::last_modified.eq(last_modified))
            .execute(conn)
    }

    pub fn remove(conn: &mut SqliteConnection, name: &str) -> QueryResult<usize> {
        diesel::delete(provider_index::table.filter(provider_index::name.eq(name))).execute(conn)
    }

    pub fn last_modified(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<String>> {
        provider_index::table
            .filter(provider_index::name.eq(name))
            .select(provider_index::last_modified)
            .first(conn)
            .optional()
    }

    pub fn list_names(conn: &mut SqliteConnection) -> QueryResult<Vec<String>> {
        provider_index::table
            .order(provider_index::name.asc())
            .select(provider_index::name)
            .load(conn)
    }
}
