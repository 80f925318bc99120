// Path: crates/cache/src/classloaders.rs
//! `classLoaders[Classpath] -> Loader` (spec.md §4.10, §4.4: "caches loaders
//! per classpath via LRU"). A cache hit skips reverification of every
//! dependency in the classpath entirely.

use crate::ring::BoundedCache;
use jarnet_store::StoreTransformation;
use jarnet_types::error::ClassLoadError;
use jarnet_types::request::Classpath;
use jarnet_vm::ClassLoader;
use std::sync::Arc;

pub struct ClassLoaderCache {
    entries: BoundedCache<Classpath, Arc<ClassLoader>>,
}

impl ClassLoaderCache {
    pub fn new(capacity: usize) -> Self {
        Self { entries: BoundedCache::new(capacity) }
    }

    /// Returns the cached loader for `classpath`, or runs `load` (typically
    /// [`ClassLoader::load`]) on a miss, caching and returning its result.
    /// A hit never runs `load`, so its [`StoreTransformation`] (reverified
    /// jar responses) is empty on a hit — the caller already committed it
    /// the first time this classpath was loaded.
    pub fn get_or_load(
        &self,
        classpath: &Classpath,
        load: impl FnOnce() -> Result<(ClassLoader, StoreTransformation), ClassLoadError>,
    ) -> Result<(Arc<ClassLoader>, StoreTransformation), ClassLoadError> {
        let metrics = jarnet_telemetry::sinks::cache_metrics();
        if let Some(loader) = self.entries.get(classpath) {
            metrics.inc_hit("class_loaders");
            return Ok((loader, StoreTransformation::new()));
        }
        metrics.inc_miss("class_loaders");
        let (loader, side_effects) = load()?;
        let loader = Arc::new(loader);
        self.entries.insert(classpath.clone(), loader.clone());
        Ok((loader, side_effects))
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        jarnet_telemetry::sinks::cache_metrics().inc_invalidation("class_loaders");
    }
}
