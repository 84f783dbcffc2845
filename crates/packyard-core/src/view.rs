//! The documents served to clients, derived from the cached graph.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    cache::MetadataCache,
    document::{
        Lookup, PackageDocument, PackageV2, PackageV2Document, ProvidersIndex, RootDocument,
        VersionRecord, MINIFIED_V2,
    },
    minify::{minify, reserved_key},
    scope::AccessScope,
    version::{compare_versions, Stability},
    RegistryError, RegistryResult,
};

/// `last_modified` of a v2 document without versions.
pub const EPOCH_SENTINEL: &str = "1970-01-01T00:00:00+00:00";

fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

/// Formats a timestamp the way it is stored and served.
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

impl PackageV2 {
    pub fn last_modified_rfc3339(&self) -> String {
        format_timestamp(&self.last_modified)
    }
}

/// Protocol views over a [`MetadataCache`].
///
/// Every method expects an already normalized [`AccessScope`].
pub struct ProtocolViews {
    cache: MetadataCache,
}

impl ProtocolViews {
    pub fn new(cache: MetadataCache) -> Self {
        Self {
            cache,
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn root(&self, scope: AccessScope) -> RegistryResult<RootDocument> {
        Ok(self.cache.get(scope, true)?.root)
    }

    /// Returns the providers index unless `conditional_hash` is given and
    /// differs from the root hash.
    pub fn providers(
        &self,
        scope: AccessScope,
        conditional_hash: Option<&str>,
    ) -> RegistryResult<Lookup<ProvidersIndex>> {
        let snapshot = self.cache.get(scope, true)?;

        if let Some(hash) = conditional_hash {
            if snapshot.root.root_hash() != Some(hash) {
                trace!(scope = %scope, hash, "providers hash mismatch");
                return Ok(Lookup::NotModified);
            }
        }

        Ok(Lookup::Found(snapshot.providers))
    }

    /// Builds a single package straight from the builder, bypassing the cache.
    pub fn package(
        &self,
        scope: AccessScope,
        name: &str,
    ) -> RegistryResult<Option<PackageDocument>> {
        self.cache.builder().dump_package(scope, name)
    }

    /// Looks a package up in the cached graph.
    pub fn cached_package(
        &self,
        scope: AccessScope,
        name: &str,
        conditional_hash: Option<&str>,
    ) -> RegistryResult<Lookup<PackageDocument>> {
        let mut snapshot = self.cache.get(scope, true)?;

        let Some(digest) = snapshot.providers.digest(name) else {
            return Ok(Lookup::Absent);
        };
        if conditional_hash.is_some_and(|hash| hash != digest) {
            return Ok(Lookup::NotModified);
        }

        Ok(match snapshot.packages.swap_remove(name) {
            Some(versions) => Lookup::Found(PackageDocument::single(name, versions)),
            None => Lookup::Absent,
        })
    }

    /// Builds the minified protocol-v2 document of a package.
    ///
    /// Only dev versions are listed when `include_dev` is set, only
    /// non-dev versions otherwise. Returns `None` when the package is unknown
    /// to the scope.
    pub fn package_v2(
        &self,
        scope: AccessScope,
        name: &str,
        include_dev: bool,
    ) -> RegistryResult<Option<PackageV2>> {
        let versions = match self.cached_package(scope, name, None)? {
            Lookup::Found(document) => document.into_versions(name),
            _ => {
                trace!(package = name, "not in cached graph, dumping package");
                self.package(scope, name)?
                    .and_then(|document| document.into_versions(name))
            }
        };
        let Some(versions) = versions else {
            return Ok(None);
        };

        let mut versions: Vec<VersionRecord> = versions
            .into_iter()
            .filter(|record| Stability::parse(&record.version).is_dev() == include_dev)
            .collect();
        versions.sort_by(|a, b| compare_versions(&b.version_normalized, &a.version_normalized));

        let mut last_modified = epoch();
        for record in &versions {
            let released_at = record.released_at(name)?;
            if released_at > last_modified {
                last_modified = released_at;
            }
        }

        let normalized = versions
            .into_iter()
            .map(|record| {
                let version = record.version.clone();
                let object = into_object(name, &version, record.into_v2())?;
                if let Some(field) = reserved_key(&object) {
                    return Err(RegistryError::ReservedFieldValue {
                        package: name.to_string(),
                        version,
                        field: field.to_string(),
                    });
                }
                Ok(object)
            })
            .collect::<RegistryResult<Vec<_>>>()?;

        let mut packages = IndexMap::with_capacity(1);
        packages.insert(name.to_string(), minify(&normalized));

        Ok(Some(PackageV2 {
            document: PackageV2Document {
                packages,
                minified: MINIFIED_V2.to_string(),
            },
            last_modified,
        }))
    }
}

fn into_object<T: Serialize>(
    package: &str,
    version: &str,
    record: T,
) -> RegistryResult<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => {
            Err(RegistryError::RecordShape {
                package: package.to_string(),
                version: version.to_string(),
            })
        }
    }
}
