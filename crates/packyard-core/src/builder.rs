//! Assembly of the metadata graph from storage.

use indexmap::IndexMap;
use packyard_config::Config;
use packyard_db::{
    models::{Package, Version},
    repository::{PackageRepository, VersionRepository},
};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    database::Database,
    document::{
        sha256_hex, MetadataSnapshot, PackageDocument, PackagesMap, ProvidersIndex, RootDocument,
        Sha256Ref, VersionRecord,
    },
    scope::AccessScope,
    RegistryError, RegistryResult,
};

/// Keys stored in dedicated columns rather than in the metadata blob.
pub(crate) const TYPED_FIELDS: &[&str] = &[
    "version",
    "version_normalized",
    "version_normalized_v2",
    "time",
];

/// Produces the metadata graph for a scope.
///
/// Implementations must be deterministic for a given storage snapshot.
pub trait MetadataBuilder: Send + Sync {
    /// Builds the root, providers index and every visible package.
    fn dump(&self, scope: AccessScope) -> RegistryResult<MetadataSnapshot>;

    /// Builds the document of a single package, or `None` if the scope
    /// cannot see a package of that name.
    fn dump_package(&self, scope: AccessScope, name: &str)
        -> RegistryResult<Option<PackageDocument>>;
}

/// Root document settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSettings {
    pub providers_url: String,
    pub metadata_url: String,
    pub provider_include: String,
    pub notify_batch: Option<String>,
    pub list_available_packages: bool,
}

impl RootSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            providers_url: config.providers_url.clone(),
            metadata_url: config.metadata_url.clone(),
            provider_include: config.provider_include.clone(),
            notify_batch: config.notify_batch.clone(),
            list_available_packages: config.lists_available_packages(),
        }
    }
}

impl Default for RootSettings {
    fn default() -> Self {
        Self::from_config(&Config::default_config())
    }
}

/// [`MetadataBuilder`] reading packages and versions from SQLite.
pub struct DbMetadataBuilder {
    db: Database,
    settings: RootSettings,
}

impl DbMetadataBuilder {
    pub fn new(db: Database, settings: RootSettings) -> Self {
        Self {
            db,
            settings,
        }
    }

    fn root_document(&self, providers: &ProvidersIndex) -> RegistryResult<RootDocument> {
        let mut provider_includes = IndexMap::new();
        if !providers.is_empty() {
            let digest = sha256_hex(&serde_json::to_vec(providers)?);
            provider_includes.insert(
                self.settings.provider_include.clone(),
                Sha256Ref::new(digest),
            );
        }

        let available_packages = self
            .settings
            .list_available_packages
            .then(|| providers.providers.keys().cloned().collect());

        Ok(RootDocument {
            packages: Vec::new(),
            providers_url: self.settings.providers_url.clone(),
            metadata_url: self.settings.metadata_url.clone(),
            notify_batch: self.settings.notify_batch.clone(),
            provider_includes,
            available_packages,
        })
    }
}

/// Converts a stored version row into its wire record.
pub(crate) fn version_record(package: &str, row: Version) -> RegistryResult<VersionRecord> {
    let mut extra = match row.metadata {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(RegistryError::Builder(format!(
                "metadata of {package} {} is a {}, expected an object",
                row.version,
                json_kind(&other)
            )));
        }
    };
    for field in TYPED_FIELDS {
        extra.remove(*field);
    }

    Ok(VersionRecord {
        version: row.version,
        version_normalized: row.version_normalized,
        version_normalized_v2: row.version_normalized_v2,
        time: row.released_at,
        extra,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn package_records(package: &Package, rows: Vec<Version>) -> RegistryResult<Vec<VersionRecord>> {
    let name = package.name.as_deref().unwrap_or_default();
    rows.into_iter()
        .map(|row| version_record(name, row))
        .collect()
}

impl MetadataBuilder for DbMetadataBuilder {
    fn dump(&self, scope: AccessScope) -> RegistryResult<MetadataSnapshot> {
        let (packages, versions) = self.db.with_conn(|conn| {
            let packages = match scope {
                AccessScope::Anonymous => PackageRepository::list_named(conn)?,
                AccessScope::Identified(user_id) => {
                    PackageRepository::list_named_for_user(conn, user_id)?
                }
            };
            let versions = VersionRepository::list_grouped(conn, &packages)?;
            Ok((packages, versions))
        })?;

        let mut providers = ProvidersIndex::default();
        let mut documents = PackagesMap::with_capacity(packages.len());

        for (package, rows) in packages.iter().zip(versions) {
            let Some(name) = package.name.clone() else {
                continue;
            };
            let records = package_records(package, rows)?;
            let document = PackageDocument::single(name.clone(), records);
            let digest = document.digest()?;
            trace!(package = name, sha256 = digest, "hashed package");

            providers
                .providers
                .insert(name.clone(), Sha256Ref::new(digest));
            documents.extend(document.packages);
        }

        let root = self.root_document(&providers)?;
        debug!(
            scope = %scope,
            packages = documents.len(),
            "built metadata graph"
        );

        Ok(MetadataSnapshot {
            root,
            providers,
            packages: documents,
        })
    }

    fn dump_package(
        &self,
        scope: AccessScope,
        name: &str,
    ) -> RegistryResult<Option<PackageDocument>> {
        let found = self.db.with_conn(|conn| {
            let package = match scope {
                AccessScope::Anonymous => PackageRepository::find_by_name(conn, name)?,
                AccessScope::Identified(user_id) => {
                    PackageRepository::find_by_name_for_user(conn, name, user_id)?
                }
            };
            let Some(package) = package else {
                return Ok(None);
            };
            let rows = VersionRepository::list_for_package(conn, &package)?;
            Ok(Some((package, rows)))
        })?;

        let Some((package, rows)) = found else {
            trace!(package = name, scope = %scope, "package not visible");
            return Ok(None);
        };

        let records = package_records(&package, rows)?;
        Ok(Some(PackageDocument::single(name, records)))
    }
}
