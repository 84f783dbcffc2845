//! Package rows, grants and maintainer links.

use diesel::prelude::*;

use crate::{
    models::{NewPackage, NewPackageGrant, Package, PackageResolution},
    schema::{package_grants, package_maintainers, packages},
};

pub struct PackageRepository;

impl PackageRepository {
    /// Lists every named package, ordered by name.
    pub fn list_named(conn: &mut SqliteConnection) -> QueryResult<Vec<Package>> {
        packages::table
            .filter(packages::name.is_not_null())
            .order(packages::name.asc())
            .select(Package::as_select())
            .load(conn)
    }

    /// Lists the named packages a user was granted access to, ordered by name.
    pub fn list_named_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> QueryResult<Vec<Package>> {
        packages::table
            .inner_join(package_grants::table)
            .filter(package_grants::user_id.eq(user_id))
            .filter(packages::name.is_not_null())
            .order(packages::name.asc())
            .select(Package::as_select())
            .load(conn)
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::id.eq(id))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::name.eq(name))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Finds a package by name, but only if the user may see it.
    pub fn find_by_name_for_user(
        conn: &mut SqliteConnection,
        name: &str,
        user_id: i64,
    ) -> QueryResult<Option<Package>> {
        packages::table
            .inner_join(package_grants::table)
            .filter(package_grants::user_id.eq(user_id))
            .filter(packages::name.eq(name))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Inserts a package and returns its ID.
    pub fn insert(conn: &mut SqliteConnection, package: &NewPackage) -> QueryResult<i32> {
        diesel::insert_into(packages::table)
            .values(package)
            .returning(packages::id)
            .get_result(conn)
    }

    /// Persists the outcome of a VCS driver resolution.
    pub fn save_resolution(
        conn: &mut SqliteConnection,
        id: i32,
        resolution: &PackageResolution,
    ) -> QueryResult<usize> {
        diesel::update(packages::table.filter(packages::id.eq(id)))
            .set(resolution)
            .execute(conn)
    }

    pub fn set_update_failure_notified(
        conn: &mut SqliteConnection,
        id: i32,
        notified: bool,
    ) -> QueryResult<usize> {
        diesel::update(packages::table.filter(packages::id.eq(id)))
            .set(packages::update_failure_notified.eq(notified))
            .execute(conn)
    }

    /// Sets the failure notification flag only if it is still unset.
    ///
    /// Returns `false` when another caller already set it.
    pub fn claim_update_failure_notification(
        conn: &mut SqliteConnection,
        id: i32,
    ) -> QueryResult<bool> {
        let updated = diesel::update(
            packages::table
                .filter(packages::id.eq(id))
                .filter(packages::update_failure_notified.eq(false)),
        )
        .set(packages::update_failure_notified.eq(true))
        .execute(conn)?;
        Ok(updated == 1)
    }

    /// Lets `user_id` see the package. Granting twice is a no-op.
    pub fn grant(conn: &mut SqliteConnection, user_id: i64, package_id: i32) -> QueryResult<usize> {
        diesel::insert_into(package_grants::table)
            .values(NewPackageGrant {
                user_id,
                package_id,
            })
            .on_conflict_do_nothing()
            .execute(conn)
    }

    /// Removes the package's grants and maintainer links.
    pub fn delete_links(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        let grants =
            diesel::delete(package_grants::table.filter(package_grants::package_id.eq(id)))
                .execute(conn)?;
        let maintainers = diesel::delete(
            package_maintainers::table.filter(package_maintainers::package_id.eq(id)),
        )
        .execute(conn)?;
        Ok(grants + maintainers)
    }

    pub fn delete(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(packages::table.filter(packages::id.eq(id))).execute(conn)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        packages::table.count().get_result(conn)
    }
}
