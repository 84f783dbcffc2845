use diesel::prelude::*;
use serde_json::Value;

use crate::schema::{maintainers, package_maintainers, package_grants, packages, versions};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Package {
    pub id: i32,
    /// Unset until the name was read from the repository's composer.json.
    pub name: Option<String>,
    pub repository: String,
    pub credentials: Option<String>,
    pub vcs_driver_error: Option<String>,
    pub update_failure_notified: bool,
    pub created_at: String,
}

#[derive(Debug, Default, Insertable)]
#[diesel(table_name = packages)]
pub struct NewPackage<'a> {
    pub name: Option<&'a str>,
    pub repository: &'a str,
    pub credentials: Option<&'a str>,
}

/// Fields written back after resolving a package through its VCS driver.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = packages)]
#[diesel(treat_none_as_null = true)]
pub struct PackageResolution<'a> {
    pub name: Option<&'a str>,
    pub repository: &'a str,
    pub vcs_driver_error: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Package))]
#[diesel(table_name = versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Version {
    pub id: i32,
    pub package_id: i32,
    pub version: String,
    pub version_normalized: String,
    pub version_normalized_v2: Option<String>,
    pub released_at: Option<String>,
    /// Everything else of the version's composer metadata (require, dist,
    /// source, ...), kept as a JSON object.
    pub metadata: Value,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = versions)]
pub struct NewVersion<'a> {
    pub package_id: i32,
    pub version: &'a str,
    pub version_normalized: &'a str,
    pub version_normalized_v2: Option<&'a str>,
    pub released_at: Option<&'a str>,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = maintainers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Maintainer {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub failure_notifications: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = maintainers)]
pub struct NewMaintainer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub failure_notifications: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = package_maintainers)]
pub struct NewPackageMaintainer {
    pub package_id: i32,
    pub maintainer_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = package_grants)]
pub struct NewPackageGrant {
    pub user_id: i64,
    pub package_id: i32,
}
