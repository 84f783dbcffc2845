use diesel::prelude::*;

use crate::{
    models::{Maintainer, NewMaintainer, NewPackageMaintainer},
    schema::{maintainers, package_maintainers},
};

pub struct MaintainerRepository;

impl MaintainerRepository {
    /// Inserts a maintainer, or returns the ID of the existing one with the
    /// same username.
    pub fn upsert(conn: &mut SqliteConnection, maintainer: &NewMaintainer) -> QueryResult<i32> {
        diesel::insert_into(maintainers::table)
            .values(maintainer)
            .on_conflict(maintainers::username)
            .do_update()
            .set((
                maintainers::email.eq(maintainer.email),
                maintainers::failure_notifications.eq(maintainer.failure_notifications),
            ))
            .returning(maintainers::id)
            .get_result(conn)
    }

    pub fn link(
        conn: &mut SqliteConnection,
        package_id: i32,
        maintainer_id: i32,
    ) -> QueryResult<usize> {
        diesel::insert_into(package_maintainers::table)
            .values(NewPackageMaintainer {
                package_id,
                maintainer_id,
            })
            .on_conflict_do_nothing()
            .execute(conn)
    }

    pub fn list_for_package(
        conn: &mut SqliteConnection,
        package_id: i32,
    ) -> QueryResult<Vec<Maintainer>> {
        maintainers::table
            .inner_join(package_maintainers::table)
            .filter(package_maintainers::package_id.eq(package_id))
            .order(maintainers::username.asc())
            .select(Maintainer::as_select())
            .load(conn)
    }

    /// Maintainers of a package that opted into update failure mails.
    pub fn list_notifiable(
        conn: &mut SqliteConnection,
        package_id: i32,
    ) -> QueryResult<Vec<Maintainer>> {
        maintainers::table
            .inner_join(package_maintainers::table)
            .filter(package_maintainers::package_id.eq(package_id))
            .filter(maintainers::failure_notifications.eq(true))
            .order(maintainers::username.asc())
            .select(Maintainer::as_select())
            .load(conn)
    }
}
