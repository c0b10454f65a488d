//! Loading `.vrooli/service.json` descriptors.

use sda_common::{Error, Result};
use sda_report_schema::{ResourceDeclaration, ServiceConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Descriptor location relative to a scenario root.
pub const SERVICE_CONFIG_PATH: &str = ".vrooli/service.json";

/// Canonical form of a scenario or resource name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Path of the descriptor inside `scenario_path`.
pub fn service_config_path(scenario_path: &Path) -> PathBuf {
    scenario_path.join(SERVICE_CONFIG_PATH)
}

/// Load and parse a scenario's descriptor.
///
/// A missing file yields [`Error::ConfigMissing`]; unreadable or unparsable
/// content yields [`Error::ConfigMalformed`].
pub fn load_service_config(scenario_path: &Path) -> Result<ServiceConfig> {
    let path = service_config_path(scenario_path);
    if !path.is_file() {
        return Err(Error::ConfigMissing { path });
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::ConfigMalformed {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let cfg: ServiceConfig = serde_json::from_str(&content).map_err(|e| Error::ConfigMalformed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    debug!("Loaded service config: {}", path.display());
    Ok(cfg)
}

/// Declared resources keyed by normalized name.
///
/// Prefers `dependencies.resources`; falls back to the legacy top-level
/// `resources` map when the newer one is empty.
pub fn resolved_resource_map(cfg: &ServiceConfig) -> BTreeMap<String, ResourceDeclaration> {
    let source = if cfg.dependencies.resources.is_empty() {
        &cfg.resources
    } else {
        &cfg.dependencies.resources
    };

    source
        .iter()
        .map(|(name, decl)| (normalize_name(name), decl.clone()))
        .collect()
}

/// Declared scenario dependencies, normalized and sorted.
pub fn declared_scenarios(cfg: &ServiceConfig) -> Vec<String> {
    declared_scenario_keys(cfg)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Declared scenario dependencies as `(normalized, as written)`, sorted by
/// normalized name. The first spelling of a duplicated name wins.
pub fn declared_scenario_keys(cfg: &ServiceConfig) -> Vec<(String, String)> {
    let mut keys: BTreeMap<String, String> = BTreeMap::new();
    for key in cfg.dependencies.scenarios.keys() {
        let name = normalize_name(key);
        if !name.is_empty() {
            keys.entry(name).or_insert_with(|| key.trim().to_string());
        }
    }
    keys.into_iter().collect()
}

/// Directory of a scenario under `scenarios_dir`.
///
/// The name is tried as written first, then against a case-insensitive match
/// among existing directories. Falls back to the normalized name.
pub fn scenario_dir(scenarios_dir: &Path, name: &str) -> PathBuf {
    let as_written = scenarios_dir.join(name.trim());
    if as_written.is_dir() {
        return as_written;
    }

    let wanted = normalize_name(name);
    std::fs::read_dir(scenarios_dir)
        .into_iter()
        .flatten()
        .flatten()
        .find(|entry| {
            entry.path().is_dir() && normalize_name(&entry.file_name().to_string_lossy()) == wanted
        })
        .map(|entry| entry.path())
        .unwrap_or_else(|| scenarios_dir.join(wanted))
}

/// Case-insensitive lookup in a name-keyed map.
pub fn lookup_normalized<'a, V>(map: &'a BTreeMap<String, V>, name: &str) -> Option<&'a V> {
    let wanted = normalize_name(name);
    map.get(&wanted)
        .or_else(|| map.iter().find(|(k, _)| normalize_name(k) == wanted).map(|(_, v)| v))
}
