//! Version rows of packages.

use diesel::prelude::*;

use crate::{
    models::{NewVersion, Package, Version},
    schema::versions,
};

pub struct VersionRepository;

impl VersionRepository {
    /// Lists a package's versions in insertion order.
    pub fn list_for_package(
        conn: &mut SqliteConnection,
        package: &Package,
    ) -> QueryResult<Vec<Version>> {
        Version::belonging_to(package)
            .order(versions::id.asc())
            .select(Version::as_select())
            .load(conn)
    }

    /// Loads the versions of several packages at once, grouped per package
    /// in the order of `packages`.
    pub fn list_grouped(
        conn: &mut SqliteConnection,
        packages: &[Package],
    ) -> QueryResult<Vec<Vec<Version>>> {
        let versions = Version::belonging_to(packages)
            .order(versions::id.asc())
            .select(Version::as_select())
            .load(conn)?;

        Ok(versions.grouped_by(packages))
    }

    pub fn insert(conn: &mut SqliteConnection, version: &NewVersion) -> QueryResult<i32> {
        diesel::insert_into(versions::table)
            .values(version)
            .returning(versions::id)
            .get_result(conn)
    }

    /// Deletes every version of a package and returns how many were removed.
    pub fn delete_for_package(conn: &mut SqliteConnection, package_id: i32) -> QueryResult<usize> {
        diesel::delete(versions::table.filter(versions::package_id.eq(package_id))).execute(conn)
    }

    pub fn count_for_package(conn: &mut SqliteConnection, package_id: i32) -> QueryResult<i64> {
        versions::table
            .filter(versions::package_id.eq(package_id))
            .count()
            .get_result(conn)
    }
}
