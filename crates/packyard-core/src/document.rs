//! Protocol documents served to Composer clients.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{RegistryError, RegistryResult};

/// Marker value of the `minified` field in protocol-v2 documents.
pub const MINIFIED_V2: &str = "composer/2.0";

/// Returns the lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A content digest as it appears on the wire: `{"sha256": "<hex>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sha256Ref {
    pub sha256: String,
}

impl Sha256Ref {
    pub fn new(sha256: impl Into<String>) -> Self {
        Self {
            sha256: sha256.into(),
        }
    }
}

/// Top-level index fetched first by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RootDocument {
    /// Always empty; Composer 1 clients require the key.
    #[serde(default)]
    pub packages: Vec<Value>,
    pub providers_url: String,
    pub metadata_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_batch: Option<String>,
    #[serde(default)]
    pub provider_includes: IndexMap<String, Sha256Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_packages: Option<Vec<String>>,
}

impl RootDocument {
    /// Digest of the first provider include, used for conditional fetches of
    /// the providers index.
    pub fn root_hash(&self) -> Option<&str> {
        self.provider_includes
            .values()
            .next()
            .map(|include| include.sha256.as_str())
    }
}

/// Package name to the digest of its version list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersIndex {
    pub providers: IndexMap<String, Sha256Ref>,
}

impl ProvidersIndex {
    pub fn digest(&self, name: &str) -> Option<&str> {
        self.providers.get(name).map(|entry| entry.sha256.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// One version of a package.
///
/// Fields other than the typed ones (require, dist, source, autoload, ...)
/// are carried through untouched in `extra`, in their original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub version_normalized: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_normalized_v2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionRecord {
    /// Parses the release time.
    pub fn released_at(&self, package: &str) -> RegistryResult<DateTime<FixedOffset>> {
        self.time
            .as_deref()
            .and_then(|time| DateTime::parse_from_rfc3339(time).ok())
            .ok_or_else(|| {
                RegistryError::MalformedVersionRecord {
                    package: package.to_string(),
                    version: self.version.clone(),
                    field: "time",
                }
            })
    }

    /// Protocol-v2 form of the record: `version_normalized_v2` takes the
    /// place of `version_normalized` and is dropped.
    pub fn into_v2(mut self) -> Self {
        if let Some(normalized) = self.version_normalized_v2.take() {
            self.version_normalized = normalized;
        }
        self
    }
}

/// Package name to its version list.
pub type PackagesMap = IndexMap<String, Vec<VersionRecord>>;

/// `{"packages": {"<name>": [VersionRecord, ...]}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageDocument {
    pub packages: PackagesMap,
}

impl PackageDocument {
    pub fn single(name: impl Into<String>, versions: Vec<VersionRecord>) -> Self {
        let mut packages = IndexMap::with_capacity(1);
        packages.insert(name.into(), versions);
        Self {
            packages,
        }
    }

    /// Digest listed for this document in the providers index.
    pub fn digest(&self) -> RegistryResult<String> {
        Ok(sha256_hex(&serde_json::to_vec(self)?))
    }

    pub fn versions(&self, name: &str) -> Option<&[VersionRecord]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    pub fn into_versions(mut self, name: &str) -> Option<Vec<VersionRecord>> {
        self.packages.shift_remove(name)
    }
}

/// `{"packages": {"<name>": [minified entries]}, "minified": "composer/2.0"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageV2Document {
    pub packages: IndexMap<String, Vec<Map<String, Value>>>,
    pub minified: String,
}

/// Protocol-v2 document together with the newest release time it lists.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageV2 {
    pub document: PackageV2Document,
    pub last_modified: DateTime<FixedOffset>,
}

/// Everything a scope can see: the root, the providers index and every
/// package's version list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub root: RootDocument,
    pub providers: ProvidersIndex,
    pub packages: PackagesMap,
}

/// Outcome of a conditional lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The caller's hash is stale; the content is not returned.
    NotModified,
    /// The requested item is not part of the scope's graph.
    Absent,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotModified => Lookup::NotModified,
            Self::Absent => Lookup::Absent,
        }
    }
}
