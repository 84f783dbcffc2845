//! Import of Composer repository JSON into the store.
//!
//! Accepts the `packages.json` layout with an optional `maintainers` and
//! `grants` section:
//!
//! ```json
//! {
//!   "packages": {
//!     "acme/http": [{"version": "1.0.0", "version_normalized": "1.0.0.0", "time": "..."}]
//!   },
//!   "maintainers": {
//!     "acme/http": [{"username": "alice", "email": "alice@example.com"}]
//!   },
//!   "grants": {"42": ["acme/http"]}
//! }
//! ```
//!
//! Versions may also be keyed by version string, as in Composer 1 repositories.

use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use packyard_db::{
    models::{NewMaintainer, NewPackage, NewVersion},
    repository::{
        MaintainerRepository, PackageRepository, ProviderIndexRepository, VersionRepository,
    },
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    builder::TYPED_FIELDS,
    database::Database,
    document::VersionRecord,
    error::ErrorContext,
    view::format_timestamp,
    RegistryError, RegistryResult,
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportVersions {
    List(Vec<VersionRecord>),
    Keyed(IndexMap<String, VersionRecord>),
}

impl ImportVersions {
    fn into_vec(self) -> Vec<VersionRecord> {
        match self {
            Self::List(versions) => versions,
            Self::Keyed(versions) => versions.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportMaintainer {
    username: String,
    email: String,
    #[serde(default = "default_true")]
    failure_notifications: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ImportDocument {
    packages: IndexMap<String, ImportVersions>,
    #[serde(default)]
    maintainers: IndexMap<String, Vec<ImportMaintainer>>,
    #[serde(default)]
    grants: IndexMap<String, Vec<String>>,
}

/// Counts of what an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub packages: usize,
    pub versions: usize,
    pub maintainers: usize,
    pub grants: usize,
}

/// Reads and imports a JSON file.
pub fn import_file<P: AsRef<Path>>(db: &Database, path: P) -> RegistryResult<ImportSummary> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading package data from {}", path.display()))?;
    import_str(db, &content)
}

pub fn import_str(db: &Database, json: &str) -> RegistryResult<ImportSummary> {
    let document: ImportDocument = serde_json::from_str(json)?;
    import_document(db, document)
}

fn validate_name(name: &str) -> RegistryResult<()> {
    let valid = name
        .split_once('/')
        .is_some_and(|(vendor, package)| !vendor.is_empty() && !package.is_empty());
    if !valid {
        return Err(RegistryError::InvalidPackageData(format!(
            "'{name}' is not a vendor/name package name"
        )));
    }
    Ok(())
}

/// Repository URL of the newest source or dist reference, or the name.
fn repository_url(name: &str, versions: &[VersionRecord]) -> String {
    versions
        .iter()
        .rev()
        .find_map(|record| {
            ["source", "dist"].iter().find_map(|key| {
                record
                    .extra
                    .get(*key)
                    .and_then(|reference| reference.get("url"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| name.to_string())
}

fn newest_time(versions: &[VersionRecord]) -> String {
    versions
        .iter()
        .filter_map(|record| record.time.as_deref())
        .filter_map(|time| DateTime::parse_from_rfc3339(time).ok())
        .max()
        .map(|time| format_timestamp(&time))
        .unwrap_or_else(|| format_timestamp(&Utc::now().fixed_offset()))
}

fn import_document(db: &Database, document: ImportDocument) -> RegistryResult<ImportSummary> {
    let mut packages = Vec::with_capacity(document.packages.len());
    for (name, versions) in document.packages {
        validate_name(&name)?;
        let mut versions = versions.into_vec();
        for record in &mut versions {
            for field in TYPED_FIELDS {
                record.extra.remove(*field);
            }
        }
        packages.push((name, versions));
    }

    let mut grants = Vec::new();
    for (user, names) in document.grants {
        let user_id: i64 = user.parse().map_err(|_| {
            RegistryError::InvalidPackageData(format!("grant key '{user}' is not a user ID"))
        })?;
        grants.extend(names.into_iter().map(|name| (user_id, name)));
    }

    let maintainers = document.maintainers;

    let summary = db.transaction(|conn| {
        let mut summary = ImportSummary::default();

        for (name, versions) in &packages {
            let package_id = match PackageRepository::find_by_name(conn, name)? {
                Some(package) => {
                    VersionRepository::delete_for_package(conn, package.id)?;
                    package.id
                }
                None => {
                    let repository = repository_url(name, versions);
                    PackageRepository::insert(
                        conn,
                        &NewPackage {
                            name: Some(name),
                            repository: &repository,
                            credentials: None,
                        },
                    )?
                }
            };

            for record in versions {
                VersionRepository::insert(
                    conn,
                    &NewVersion {
                        package_id,
                        version: &record.version,
                        version_normalized: &record.version_normalized,
                        version_normalized_v2: record.version_normalized_v2.as_deref(),
                        released_at: record.time.as_deref(),
                        metadata: Value::Object(record.extra.clone()),
                    },
                )?;
            }
            ProviderIndexRepository::touch(conn, name, &newest_time(versions))?;

            debug!(package = name, versions = versions.len(), "imported package");
            summary.packages += 1;
            summary.versions += versions.len();
        }

        for (name, entries) in &maintainers {
            let Some(package) = PackageRepository::find_by_name(conn, name)? else {
                continue;
            };
            for entry in entries {
                let maintainer_id = MaintainerRepository::upsert(
                    conn,
                    &NewMaintainer {
                        username: &entry.username,
                        email: &entry.email,
                        failure_notifications: entry.failure_notifications,
                    },
                )?;
                MaintainerRepository::link(conn, package.id, maintainer_id)?;
                summary.maintainers += 1;
            }
        }

        for (user_id, name) in &grants {
            if let Some(package) = PackageRepository::find_by_name(conn, name)? {
                summary.grants += PackageRepository::grant(conn, *user_id, package.id)?;
            }
        }

        Ok(summary)
    })?;

    info!(
        packages = summary.packages,
        versions = summary.versions,
        "imported package data"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        builder::{DbMetadataBuilder, MetadataBuilder, RootSettings},
        scope::AccessScope,
    };

    const SAMPLE: &str = r#"{
        "packages": {
            "acme/http": [
                {
                    "version": "1.0.0",
                    "version_normalized": "1.0.0.0",
                    "time": "2024-01-01T00:00:00+00:00",
                    "source": {"type": "git", "url": "https://github.com/acme/http.git", "reference": "abc"},
                    "require": {"php": ">=8.1"}
                },
                {
                    "version": "1.1.0",
                    "version_normalized": "1.1.0.0",
                    "time": "2024-02-01T00:00:00+00:00",
                    "require": {"php": ">=8.1"}
                }
            ],
            "acme/log": {
                "dev-main": {
                    "version": "dev-main",
                    "version_normalized": "dev-main",
                    "time": "2024-03-01T00:00:00+00:00"
                }
            }
        },
        "maintainers": {
            "acme/http": [{"username": "alice", "email": "alice@example.com"}]
        },
        "grants": {"42": ["acme/log", "acme/unknown"]}
    }"#;

    #[test]
    fn test_import_sample() {
        let db = Database::open_in_memory().unwrap();
        let summary = import_str(&db, SAMPLE).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                packages: 2,
                versions: 3,
                maintainers: 1,
                grants: 1,
            }
        );

        db.with_conn(|conn| {
            let http = PackageRepository::find_by_name(conn, "acme/http")?.unwrap();
            assert_eq!(http.repository, "https://github.com/acme/http.git");
            let log = PackageRepository::find_by_name(conn, "acme/log")?.unwrap();
            assert_eq!(log.repository, "acme/log");
            assert_eq!(
                ProviderIndexRepository::last_modified(conn, "acme/http")?,
                Some("2024-02-01T00:00:00+00:00".to_string())
            );
            assert_eq!(
                MaintainerRepository::list_notifiable(conn, http.id)?.len(),
                1
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_imported_data_builds_metadata() {
        let db = Database::open_in_memory().unwrap();
        import_str(&db, SAMPLE).unwrap();
        let builder = DbMetadataBuilder::new(db.clone(), RootSettings::default());

        let snapshot = builder.dump(AccessScope::Anonymous).unwrap();
        let http = &snapshot.packages["acme/http"];
        assert_eq!(http[0].extra["require"]["php"], ">=8.1");
        assert_eq!(http[0].extra["source"]["reference"], "abc");

        let user = builder.dump(AccessScope::Identified(42)).unwrap();
        assert_eq!(user.packages.keys().cloned().collect::<Vec<_>>(), vec!["acme/log"]);
    }

    #[test]
    fn test_reimport_replaces_versions() {
        let db = Database::open_in_memory().unwrap();
        import_str(&db, SAMPLE).unwrap();
        import_str(
            &db,
            r#"{"packages": {"acme/http": [
                {"version": "2.0.0", "version_normalized": "2.0.0.0", "time": "2024-06-01T00:00:00+00:00"}
            ]}}"#,
        )
        .unwrap();

        db.with_conn(|conn| {
            let http = PackageRepository::find_by_name(conn, "acme/http")?.unwrap();
            let versions = VersionRepository::list_for_package(conn, &http)?;
            assert_eq!(versions.len(), 1);
            assert_eq!(versions[0].version, "2.0.0");
            assert_eq!(PackageRepository::count(conn)?, 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_invalid_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = import_str(&db, r#"{"packages": {"noslash": []}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPackageData(_)));
    }

    #[test]
    fn test_invalid_grant_key_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = import_str(&db, r#"{"packages": {}, "grants": {"alice": ["acme/a"]}}"#)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPackageData(_)));
    }

    #[test]
    fn test_import_file() {
        let db = Database::open_in_memory().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let summary = import_file(&db, file.path()).unwrap();
        assert_eq!(summary.packages, 2);

        let err = import_file(&db, "/nonexistent/packages.json").unwrap_err();
        assert!(matches!(err, RegistryError::IoError { .. }));
    }
}
