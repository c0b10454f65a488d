//! Known scenario and resource names discovered from the repository.
//!
//! The catalog is loaded lazily, once, and shared between readers. An empty
//! catalog is permissive: every name counts as known, so bare checkouts and
//! test fixtures still produce reports.

use crate::config::{normalize_name, service_config_path};
use crate::settings::AnalyzerConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, info};

/// One consistent view of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub scenarios: BTreeSet<String>,
    pub resources: BTreeSet<String>,
}

impl CatalogSnapshot {
    pub fn is_known_scenario(&self, name: &str) -> bool {
        self.scenarios.is_empty() || self.scenarios.contains(&normalize_name(name))
    }

    pub fn is_known_resource(&self, name: &str) -> bool {
        self.resources.is_empty() || self.resources.contains(&normalize_name(name))
    }
}

/// Lazily loaded, refreshable catalog.
#[derive(Debug)]
pub struct CatalogManager {
    scenarios_root: PathBuf,
    resources_root: PathBuf,
    cache: RwLock<Option<Arc<CatalogSnapshot>>>,
}

static GLOBAL: OnceLock<CatalogManager> = OnceLock::new();

impl CatalogManager {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            scenarios_root: config.scenarios_root.clone(),
            resources_root: config.resources_root.clone(),
            cache: RwLock::new(None),
        }
    }

    /// Install the process-wide catalog. The first installation wins.
    pub fn install_global(config: &AnalyzerConfig) -> &'static CatalogManager {
        GLOBAL.get_or_init(|| CatalogManager::new(config))
    }

    /// The process-wide catalog, configured from the environment if nothing
    /// was installed.
    pub fn global() -> &'static CatalogManager {
        GLOBAL.get_or_init(|| {
            let config = AnalyzerConfig::from_env().unwrap_or_else(|_| AnalyzerConfig {
                scenarios_root: PathBuf::from("../.."),
                resources_root: PathBuf::from("../../../resources"),
            });
            CatalogManager::new(&config)
        })
    }

    pub fn scenarios_root(&self) -> &Path {
        &self.scenarios_root
    }

    pub fn resources_root(&self) -> &Path {
        &self.resources_root
    }

    /// Current snapshot, loading it on first use.
    pub(crate) fn current(&self) -> Arc<CatalogSnapshot> {
        {
            let guard = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(snapshot) = guard.as_ref() {
                return Arc::clone(snapshot);
            }
        }

        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have loaded it while we waited.
        if let Some(snapshot) = guard.as_ref() {
            return Arc::clone(snapshot);
        }
        let snapshot = Arc::new(self.discover());
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Ensure the catalog is loaded.
    pub fn load(&self) {
        self.current();
    }

    /// Drop the cached catalog; the next lookup reloads it.
    pub fn refresh(&self) {
        let mut guard = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        debug!("Catalog invalidated");
    }

    /// Owned copy of the catalog.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.current().as_ref().clone()
    }

    pub fn is_known_scenario(&self, name: &str) -> bool {
        self.current().is_known_scenario(name)
    }

    pub fn is_known_resource(&self, name: &str) -> bool {
        self.current().is_known_resource(name)
    }

    pub fn known_scenarios(&self) -> BTreeSet<String> {
        self.current().scenarios.clone()
    }

    pub fn known_resources(&self) -> BTreeSet<String> {
        self.current().resources.clone()
    }

    fn discover(&self) -> CatalogSnapshot {
        let scenarios = list_dirs(&self.scenarios_root, |dir| {
            service_config_path(dir).is_file()
        });
        let resources = list_dirs(&self.resources_root, |_| true);

        info!(
            "Catalog loaded: {} scenarios, {} resources",
            scenarios.len(),
            resources.len()
        );
        CatalogSnapshot {
            scenarios,
            resources,
        }
    }
}

/// Normalized names of the directories directly under `root` that pass `keep`.
fn list_dirs(root: &Path, keep: impl Fn(&Path) -> bool) -> BTreeSet<String> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", root.display(), e);
            return BTreeSet::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir() && keep(&entry.path()))
        .map(|entry| normalize_name(&entry.file_name().to_string_lossy()))
        .filter(|name| !name.is_empty())
        .collect()
}
