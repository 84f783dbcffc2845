use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use indexmap::IndexMap;
use serde_json::Map;

use crate::{
    builder::{MetadataBuilder, RootSettings},
    document::{
        sha256_hex, MetadataSnapshot, PackageDocument, PackagesMap, ProvidersIndex, RootDocument,
        Sha256Ref, VersionRecord,
    },
    scope::AccessScope,
    RegistryError, RegistryResult,
};

/// Builds a version record with no extra fields.
pub fn record(version: &str, normalized: &str, time: &str) -> VersionRecord {
    VersionRecord {
        version: version.to_string(),
        version_normalized: normalized.to_string(),
        version_normalized_v2: None,
        time: Some(time.to_string()),
        extra: Map::new(),
    }
}

/// In-memory builder that counts its invocations.
#[derive(Default)]
pub struct StubBuilder {
    packages: Mutex<PackagesMap>,
    root_hash: Mutex<Option<String>>,
    scopes: Mutex<Vec<AccessScope>>,
    dumps: AtomicUsize,
    package_dumps: AtomicUsize,
    failing: AtomicBool,
}

impl StubBuilder {
    pub fn with_package(self, name: &str, versions: Vec<VersionRecord>) -> Self {
        self.insert_package(name, versions);
        self
    }

    /// Forces the digest of the first provider include.
    pub fn with_root_hash(self, hash: &str) -> Self {
        *self.root_hash.lock().unwrap() = Some(hash.to_string());
        self
    }

    pub fn insert_package(&self, name: &str, versions: Vec<VersionRecord>) {
        self.packages
            .lock()
            .unwrap()
            .insert(name.to_string(), versions);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn dump_count(&self) -> usize {
        self.dumps.load(Ordering::SeqCst)
    }

    pub fn package_dump_count(&self) -> usize {
        self.package_dumps.load(Ordering::SeqCst)
    }

    /// Scopes passed to `dump`, in call order.
    pub fn scopes(&self) -> Vec<AccessScope> {
        self.scopes.lock().unwrap().clone()
    }

    fn check_failing(&self) -> RegistryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Builder("storage offline".into()));
        }
        Ok(())
    }
}

impl MetadataBuilder for StubBuilder {
    fn dump(&self, scope: AccessScope) -> RegistryResult<MetadataSnapshot> {
        self.dumps.fetch_add(1, Ordering::SeqCst);
        self.scopes.lock().unwrap().push(scope);
        self.check_failing()?;

        let packages = self.packages.lock().unwrap().clone();
        let mut providers = ProvidersIndex::default();
        for (name, versions) in &packages {
            let digest = PackageDocument::single(name.clone(), versions.clone()).digest()?;
            providers
                .providers
                .insert(name.clone(), Sha256Ref::new(digest));
        }

        let settings = RootSettings::default();
        let mut provider_includes = IndexMap::new();
        if !providers.is_empty() {
            let digest = match self.root_hash.lock().unwrap().clone() {
                Some(hash) => hash,
                None => sha256_hex(&serde_json::to_vec(&providers)?),
            };
            provider_includes.insert(settings.provider_include.clone(), Sha256Ref::new(digest));
        }

        Ok(MetadataSnapshot {
            root: RootDocument {
                packages: Vec::new(),
                providers_url: settings.providers_url,
                metadata_url: settings.metadata_url,
                notify_batch: None,
                provider_includes,
                available_packages: None,
            },
            providers,
            packages,
        })
    }

    fn dump_package(
        &self,
        _scope: AccessScope,
        name: &str,
    ) -> RegistryResult<Option<PackageDocument>> {
        self.package_dumps.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;

        Ok(self
            .packages
            .lock()
            .unwrap()
            .get(name)
            .map(|versions| PackageDocument::single(name, versions.clone())))
    }
}
