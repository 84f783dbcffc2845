//! SQLite persistence for packyard.
//!
//! Holds the entities the metadata builder walks (packages, versions,
//! maintainers, access grants) and the provider index of served packages.
//! All access goes through the repository types in [`repository`].

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DbConnection;
pub use error::{DbError, Result};

#[cfg(test)]
mod tests {
    use diesel::{sql_query, Connection, RunQueryDsl};
    use serde_json::json;

    use super::*;
    use crate::{
        models::{NewMaintainer, NewPackage, NewVersion, PackageResolution},
        repository::{
            MaintainerRepository, PackageRepository, ProviderIndexRepository, VersionRepository,
        },
    };

    fn setup() -> DbConnection {
        DbConnection::open_in_memory().unwrap()
    }

    fn insert_package(db: &mut DbConnection, name: &str) -> i32 {
        let repository = format!("https://git.example.com/{name}.git");
        PackageRepository::insert(
            db.conn(),
            &NewPackage {
                name: Some(name),
                repository: &repository,
                credentials: None,
            },
        )
        .unwrap()
    }

    fn insert_version(db: &mut DbConnection, package_id: i32, version: &str) {
        let normalized = format!("{version}.0");
        VersionRepository::insert(
            db.conn(),
            &NewVersion {
                package_id,
                version,
                version_normalized: &normalized,
                version_normalized_v2: None,
                released_at: Some("2024-03-01T10:00:00+00:00"),
                metadata: json!({"require": {"php": ">=8.1"}}),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_insert_and_find_package() {
        let mut db = setup();
        let id = insert_package(&mut db, "acme/http");

        let package = PackageRepository::find_by_name(db.conn(), "acme/http")
            .unwrap()
            .unwrap();
        assert_eq!(package.id, id);
        assert!(!package.update_failure_notified);
        assert!(package.created_at.ends_with("+00:00"));
        assert!(PackageRepository::find_by_name(db.conn(), "acme/none")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unnamed_packages_are_not_listed() {
        let mut db = setup();
        insert_package(&mut db, "acme/b");
        insert_package(&mut db, "acme/a");
        PackageRepository::insert(
            db.conn(),
            &NewPackage {
                name: None,
                repository: "https://git.example.com/pending.git",
                credentials: None,
            },
        )
        .unwrap();

        let names: Vec<_> = PackageRepository::list_named(db.conn())
            .unwrap()
            .into_iter()
            .filter_map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["acme/a", "acme/b"]);
        assert_eq!(PackageRepository::count(db.conn()).unwrap(), 3);
    }

    #[test]
    fn test_grants_restrict_listing() {
        let mut db = setup();
        let public = insert_package(&mut db, "acme/public");
        insert_package(&mut db, "acme/secret");

        PackageRepository::grant(db.conn(), 42, public).unwrap();
        PackageRepository::grant(db.conn(), 42, public).unwrap();

        let visible = PackageRepository::list_named_for_user(db.conn(), 42).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name.as_deref(), Some("acme/public"));

        assert!(
            PackageRepository::find_by_name_for_user(db.conn(), "acme/secret", 42)
                .unwrap()
                .is_none()
        );
        assert!(PackageRepository::list_named_for_user(db.conn(), 7)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_versions_grouped_per_package() {
        let mut db = setup();
        let a = insert_package(&mut db, "acme/a");
        let b = insert_package(&mut db, "acme/b");
        insert_version(&mut db, a, "1.0.0");
        insert_version(&mut db, b, "2.0.0");
        insert_version(&mut db, a, "1.1.0");

        let packages = PackageRepository::list_named(db.conn()).unwrap();
        let grouped = VersionRepository::list_grouped(db.conn(), &packages).unwrap();

        assert_eq!(grouped.len(), 2);
        let versions_a: Vec<_> = grouped[0].iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions_a, vec!["1.0.0", "1.1.0"]);
        assert_eq!(grouped[1][0].metadata, json!({"require": {"php": ">=8.1"}}));
    }

    #[test]
    fn test_delete_versions_and_package() {
        let mut db = setup();
        let id = insert_package(&mut db, "acme/gone");
        insert_version(&mut db, id, "1.0.0");
        insert_version(&mut db, id, "1.1.0");

        let removed = VersionRepository::delete_for_package(db.conn(), id).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(PackageRepository::delete(db.conn(), id).unwrap(), 1);
        assert!(PackageRepository::find_by_id(db.conn(), id).unwrap().is_none());
    }

    #[test]
    fn test_transaction_rolls_back() {
        let mut db = setup();
        let id = insert_package(&mut db, "acme/kept");
        insert_version(&mut db, id, "1.0.0");

        sql_query(
            "CREATE TRIGGER refuse_package_delete BEFORE DELETE ON packages \
             BEGIN SELECT RAISE(ABORT, 'refused'); END;",
        )
        .execute(db.conn())
        .unwrap();

        let result = db.conn().transaction(|conn| {
            VersionRepository::delete_for_package(conn, id)?;
            PackageRepository::delete(conn, id)
        });

        assert!(result.is_err());
        assert_eq!(VersionRepository::count_for_package(db.conn(), id).unwrap(), 1);
    }

    #[test]
    fn test_maintainers_notifiable_filter() {
        let mut db = setup();
        let id = insert_package(&mut db, "acme/mailer");

        let alice = MaintainerRepository::upsert(
            db.conn(),
            &NewMaintainer {
                username: "alice",
                email: "alice@example.com",
                failure_notifications: true,
            },
        )
        .unwrap();
        let bob = MaintainerRepository::upsert(
            db.conn(),
            &NewMaintainer {
                username: "bob",
                email: "bob@example.com",
                failure_notifications: false,
            },
        )
        .unwrap();
        MaintainerRepository::link(db.conn(), id, alice).unwrap();
        MaintainerRepository::link(db.conn(), id, bob).unwrap();

        assert_eq!(
            MaintainerRepository::list_for_package(db.conn(), id)
                .unwrap()
                .len(),
            2
        );
        let notifiable = MaintainerRepository::list_notifiable(db.conn(), id).unwrap();
        assert_eq!(notifiable.len(), 1);
        assert_eq!(notifiable[0].email, "alice@example.com");

        let again = MaintainerRepository::upsert(
            db.conn(),
            &NewMaintainer {
                username: "alice",
                email: "alice@new.example.com",
                failure_notifications: true,
            },
        )
        .unwrap();
        assert_eq!(again, alice);
    }

    #[test]
    fn test_save_resolution_and_flags() {
        let mut db = setup();
        let id = PackageRepository::insert(
            db.conn(),
            &NewPackage {
                name: None,
                repository: "git@github.com:acme/tool.git",
                credentials: Some("deploy-key"),
            },
        )
        .unwrap();

        PackageRepository::save_resolution(
            db.conn(),
            id,
            &PackageResolution {
                name: Some("acme/tool"),
                repository: "https://github.com/acme/tool",
                vcs_driver_error: None,
            },
        )
        .unwrap();
        PackageRepository::set_update_failure_notified(db.conn(), id, true).unwrap();

        let package = PackageRepository::find_by_id(db.conn(), id).unwrap().unwrap();
        assert_eq!(package.name.as_deref(), Some("acme/tool"));
        assert_eq!(package.repository, "https://github.com/acme/tool");
        assert_eq!(package.credentials.as_deref(), Some("deploy-key"));
        assert!(package.update_failure_notified);
    }

    #[test]
    fn test_failure_notification_claimed_once() {
        let mut db = setup();
        let id = PackageRepository::insert(
            db.conn(),
            &NewPackage {
                name: Some("acme/tool"),
                repository: "https://github.com/acme/tool",
                credentials: None,
            },
        )
        .unwrap();

        assert!(PackageRepository::claim_update_failure_notification(db.conn(), id).unwrap());
        assert!(!PackageRepository::claim_update_failure_notification(db.conn(), id).unwrap());

        PackageRepository::set_update_failure_notified(db.conn(), id, false).unwrap();
        assert!(PackageRepository::claim_update_failure_notification(db.conn(), id).unwrap());
    }

    #[test]
    fn test_provider_index_touch_and_remove() {
        let mut db = setup();
        ProviderIndexRepository::touch(db.conn(), "acme/a", "2024-01-01T00:00:00+00:00").unwrap();
        ProviderIndexRepository::touch(db.conn(), "acme/a", "2024-02-01T00:00:00+00:00").unwrap();
        ProviderIndexRepository::touch(db.conn(), "acme/b", "2024-01-05T00:00:00+00:00").unwrap();

        assert_eq!(
            ProviderIndexRepository::last_modified(db.conn(), "acme/a").unwrap(),
            Some("2024-02-01T00:00:00+00:00".to_string())
        );
        assert_eq!(
            ProviderIndexRepository::list_names(db.conn()).unwrap(),
            vec!["acme/a", "acme/b"]
        );

        ProviderIndexRepository::remove(db.conn(), "acme/a").unwrap();
        assert_eq!(
            ProviderIndexRepository::list_names(db.conn()).unwrap(),
            vec!["acme/b"]
        );
    }
}
