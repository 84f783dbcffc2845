use packyard_db::{
    models::Package,
    repository::{PackageRepository, ProviderIndexRepository, VersionRepository},
};
use packyard_events::RegistryEvent;
use tracing::{debug, trace};

use super::{display_name, PackageManager};
use crate::RegistryResult;

impl PackageManager {
    /// Deletes a package with its versions, grants, maintainer links and
    /// provider index entry, in one transaction.
    ///
    /// Subscribers are told before anything is touched, so they can still
    /// read the package. Returns the number of removed versions.
    pub fn delete(&self, package: &Package) -> RegistryResult<usize> {
        debug!(
            package_id = package.id,
            package = display_name(package),
            "removing package"
        );
        self.events.emit(RegistryEvent::PackageRemoving {
            package_id: package.id,
            name: package.name.clone(),
            repository: package.repository.clone(),
        });

        let versions = self.db.transaction(|conn| {
            let versions = VersionRepository::delete_for_package(conn, package.id)?;
            trace!(package_id = package.id, versions, "removed versions");

            if let Some(name) = &package.name {
                ProviderIndexRepository::remove(conn, name)?;
            }
            PackageRepository::delete_links(conn, package.id)?;
            PackageRepository::delete(conn, package.id)?;
            Ok(versions)
        })?;

        self.events.emit(RegistryEvent::PackageRemoved {
            package_id: package.id,
            name: package.name.clone(),
            versions,
        });
        debug!(
            package = display_name(package),
            versions, "removed package"
        );

        Ok(versions)
    }

    /// Looks a package up by name and deletes it.
    pub fn delete_by_name(&self, name: &str) -> RegistryResult<usize> {
        let package = self.find(name)?;
        self.delete(&package)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use diesel::{sql_query, RunQueryDsl};
    use packyard_config::MailConfig;
    use packyard_db::{
        models::{NewMaintainer, NewPackage, NewVersion},
        repository::MaintainerRepository,
    };
    use packyard_events::RecordingSink;
    use serde_json::json;

    use super::*;
    use crate::{
        builder::{DbMetadataBuilder, RootSettings},
        cache::{MemoryCacheStore, MetadataCache},
        database::Database,
        document::Lookup,
        notify::MemorySender,
        scope::AccessScope,
        view::ProtocolViews,
        RegistryError,
    };

    fn seed(db: &Database) -> Package {
        db.with_conn(|conn| {
            let id = PackageRepository::insert(
                conn,
                &NewPackage {
                    name: Some("acme/http"),
                    repository: "https://git.example.com/acme/http.git",
                    credentials: None,
                },
            )?;
            for (version, normalized) in [("1.0.0", "1.0.0.0"), ("1.1.0", "1.1.0.0")] {
                VersionRepository::insert(
                    conn,
                    &NewVersion {
                        package_id: id,
                        version,
                        version_normalized: normalized,
                        version_normalized_v2: None,
                        released_at: Some("2024-01-01T00:00:00+00:00"),
                        metadata: json!({}),
                    },
                )?;
            }
            ProviderIndexRepository::touch(conn, "acme/http", "2024-01-01T00:00:00+00:00")?;
            PackageRepository::grant(conn, 5, id)?;
            let maintainer = MaintainerRepository::upsert(
                conn,
                &NewMaintainer {
                    username: "alice",
                    email: "alice@example.com",
                    failure_notifications: true,
                },
            )?;
            MaintainerRepository::link(conn, id, maintainer)?;
            Ok(PackageRepository::find_by_id(conn, id)?.unwrap())
        })
        .unwrap()
    }

    fn manager(db: &Database) -> PackageManager {
        PackageManager::new(
            db.clone(),
            Arc::new(MemorySender::default()),
            MailConfig::default(),
        )
    }

    #[test]
    fn test_delete_removes_everything() {
        let db = Database::open_in_memory().unwrap();
        let package = seed(&db);
        let sink = Arc::new(RecordingSink::default());

        let removed = manager(&db)
            .with_events(sink.clone())
            .delete(&package)
            .unwrap();
        assert_eq!(removed, 2);

        db.with_conn(|conn| {
            assert_eq!(VersionRepository::count_for_package(conn, package.id)?, 0);
            assert!(PackageRepository::find_by_id(conn, package.id)?.is_none());
            assert!(ProviderIndexRepository::list_names(conn)?.is_empty());
            assert!(PackageRepository::list_named_for_user(conn, 5)?.is_empty());
            Ok(())
        })
        .unwrap();

        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            RegistryEvent::PackageRemoving { package_id, .. } if package_id == package.id
        ));
        assert!(matches!(
            events[1],
            RegistryEvent::PackageRemoved { versions: 2, .. }
        ));
    }

    #[test]
    fn test_deleted_package_absent_after_refresh() {
        let db = Database::open_in_memory().unwrap();
        let package = seed(&db);
        let views = ProtocolViews::new(MetadataCache::new(
            Arc::new(DbMetadataBuilder::new(db.clone(), RootSettings::default())),
            Arc::new(MemoryCacheStore::new()),
            Duration::from_secs(3600),
        ));

        assert!(views
            .cached_package(AccessScope::Anonymous, "acme/http", None)
            .unwrap()
            .is_found());

        manager(&db).delete(&package).unwrap();

        // still served from the cache until the entry is refreshed
        assert!(views
            .cached_package(AccessScope::Anonymous, "acme/http", None)
            .unwrap()
            .is_found());

        views.cache().get(AccessScope::Anonymous, false).unwrap();
        assert_eq!(
            views
                .cached_package(AccessScope::Anonymous, "acme/http", None)
                .unwrap(),
            Lookup::Absent
        );
    }

    #[test]
    fn test_failed_delete_removes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let package = seed(&db);
        db.with_conn(|conn| {
            sql_query(
                "CREATE TRIGGER refuse_package_delete BEFORE DELETE ON packages \
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .execute(conn)
        })
        .unwrap();
        let sink = Arc::new(RecordingSink::default());

        let err = manager(&db)
            .with_events(sink.clone())
            .delete(&package)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Database(_)));

        db.with_conn(|conn| {
            assert_eq!(VersionRepository::count_for_package(conn, package.id)?, 2);
            assert_eq!(
                ProviderIndexRepository::list_names(conn)?,
                vec!["acme/http"]
            );
            assert_eq!(PackageRepository::list_named_for_user(conn, 5)?.len(), 1);
            Ok(())
        })
        .unwrap();

        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RegistryEvent::PackageRemoving { .. }));
    }

    #[test]
    fn test_delete_by_name_unknown() {
        let db = Database::open_in_memory().unwrap();
        let err = manager(&db).delete_by_name("acme/none").unwrap_err();
        assert!(matches!(err, RegistryError::PackageNotFound(_)));
    }
}
