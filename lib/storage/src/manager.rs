use crate::csv_loader::load_catalog;
use ahash::AHashMap;
use matrec_core::{Catalog, Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry of catalog sources with a load-once cache.
///
/// Catalogs are read from disk the first time they are asked for and shared
/// read-only afterwards. A source that fails to load is not cached, so the
/// next request tries again.
pub struct CatalogStore {
    sources: BTreeMap<String, PathBuf>,
    catalogs: RwLock<AHashMap<String, Arc<Catalog>>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Vec::<(String, PathBuf)>::new())
    }
}

impl CatalogStore {
    pub fn new<I, S, P>(sources: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(id, path)| (id.into(), path.into()))
                .collect(),
            catalogs: RwLock::new(AHashMap::new()),
        }
    }

    /// Add a file source. Replaces any previous source with the same id.
    pub fn register(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        let id = id.into();
        self.catalogs.get_mut().remove(&id);
        self.sources.insert(id, path.into());
    }

    /// Add an in-memory catalog under its own id
    pub fn insert(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        self.catalogs
            .write()
            .insert(catalog.id().to_string(), catalog.clone());
        catalog
    }

    pub fn source(&self, id: &str) -> Option<&Path> {
        self.sources.get(id).map(PathBuf::as_path)
    }

    /// All known catalog ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.keys().cloned().collect();
        for id in self.catalogs.read().keys() {
            if !self.sources.contains_key(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        ids
    }

    /// A catalog that is already in memory, without touching its source
    pub fn loaded(&self, id: &str) -> Option<Arc<Catalog>> {
        self.catalogs.read().get(id).cloned()
    }

    /// Case-insensitive id lookup against known ids
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        let id = id.trim();
        if self.sources.contains_key(id) || self.catalogs.read().contains_key(id) {
            return Some(id.to_string());
        }
        self.ids().into_iter().find(|known| known.eq_ignore_ascii_case(id))
    }

    /// Fetch a catalog, loading it on first use
    pub fn get(&self, id: &str) -> Result<Arc<Catalog>> {
        let id = self
            .resolve_id(id)
            .ok_or_else(|| Error::CatalogNotFound(id.to_string()))?;

        if let Some(catalog) = self.catalogs.read().get(&id) {
            debug!(catalog = %id, "catalog cache hit");
            return Ok(catalog.clone());
        }

        let path = self
            .sources
            .get(&id)
            .ok_or_else(|| Error::CatalogNotFound(id.clone()))?;
        let loaded = Arc::new(load_catalog(&id, path)?);

        let mut catalogs = self.catalogs.write();
        Ok(catalogs.entry(id).or_insert(loaded).clone())
    }

    /// Load every registered source, returning the ids that failed
    pub fn preload(&self) -> Vec<(String, Error)> {
        let mut failures = Vec::new();
        for id in self.sources.keys() {
            if let Err(e) = self.get(id) {
                warn!(catalog = %id, error = %e, "catalog failed to load");
                failures.push((id.clone(), e));
            }
        }
        failures
    }
}
