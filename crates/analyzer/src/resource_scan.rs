//! Resource detection over one scenario tree.

use crate::catalog::CatalogSnapshot;
use crate::config::{normalize_name, resolved_resource_map};
use crate::decisions::classify_resource;
use crate::filters::{self, RESOURCE_EXTENSIONS};
use crate::patterns::{RESOURCE_COMMAND_PATTERN, RESOURCE_HEURISTICS};
use crate::walk::{source_files, SourceFile};
use sda_report_schema::{
    AccessMethod, DependencyKind, DetectionMatch, ResourceDeclaration, ScenarioDependency,
    ServiceConfig,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

pub const DETECTED_PURPOSE: &str = "Detected via static analysis";

/// Finds `resource-<name>` tokens and usage heuristics in a scenario.
pub struct ResourceScanner<'a> {
    catalog: &'a CatalogSnapshot,
}

/// A candidate before catalog filtering.
struct Candidate {
    name: String,
    pattern: String,
    method: AccessMethod,
}

impl<'a> ResourceScanner<'a> {
    pub fn new(catalog: &'a CatalogSnapshot) -> Self {
        Self { catalog }
    }

    /// Resource dependencies of `scenario_name`, sorted by name.
    pub fn scan(
        &self,
        scenario_path: &Path,
        scenario_name: &str,
        cfg: Option<&ServiceConfig>,
    ) -> Vec<ScenarioDependency> {
        let scenario_name = normalize_name(scenario_name);
        let declared = cfg.map(resolved_resource_map).unwrap_or_default();
        let mut found: BTreeMap<String, ScenarioDependency> = BTreeMap::new();

        for file in source_files(scenario_path, RESOURCE_EXTENSIONS, true) {
            let Some(content) = file.read() else {
                continue;
            };
            for candidate in file_candidates(&file, &content) {
                if !self.catalog.is_known_resource(&candidate.name) {
                    debug!(
                        "Dropping unknown resource {} from {}",
                        candidate.name, file.rel_path
                    );
                    continue;
                }
                let entry = found.entry(candidate.name.clone()).or_insert_with(|| {
                    new_dependency(&scenario_name, &candidate.name, candidate.method, &declared)
                });
                entry.matches.push(DetectionMatch {
                    pattern: candidate.pattern,
                    method: candidate.method,
                    file: file.rel_path.clone(),
                });
            }
        }

        augment_with_initialization(&scenario_name, &declared, &mut found);

        info!(
            "Detected {} resource dependencies for {}",
            found.len(),
            scenario_name
        );
        // BTreeMap iteration is already name-ordered.
        found.into_values().collect()
    }
}

/// Every candidate a single file contributes, CLI tokens first.
fn file_candidates(file: &SourceFile, content: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    if filters::is_resource_cli_path_allowed(&file.rel_path) {
        for caps in RESOURCE_COMMAND_PATTERN.captures_iter(content) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = normalize_name(name.as_str());
            if name.is_empty() {
                continue;
            }
            candidates.push(Candidate {
                name,
                pattern: token.as_str().to_string(),
                method: AccessMethod::ResourceCli,
            });
        }
    } else if RESOURCE_COMMAND_PATTERN.is_match(content) {
        debug!("Ignoring resource CLI tokens outside allowed paths: {}", file.rel_path);
    }

    for heuristic in RESOURCE_HEURISTICS.iter() {
        if let Some(pattern) = heuristic.first_match(content) {
            candidates.push(Candidate {
                name: heuristic.name.to_string(),
                pattern: pattern.as_str().to_string(),
                method: AccessMethod::Heuristic,
            });
        }
    }

    candidates
}

fn new_dependency(
    scenario_name: &str,
    name: &str,
    method: AccessMethod,
    declared: &BTreeMap<String, ResourceDeclaration>,
) -> ScenarioDependency {
    let mut dep = ScenarioDependency::new(scenario_name, DependencyKind::Resource, name, method)
        .required(true)
        .purpose(DETECTED_PURPOSE);
    dep.resource_type = Some(resource_type_for(name, declared));
    dep
}

/// Declared type when present, otherwise the classification class.
fn resource_type_for(name: &str, declared: &BTreeMap<String, ResourceDeclaration>) -> String {
    declared
        .get(name)
        .map(|decl| decl.resource_type.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| classify_resource(name).class.to_string())
}

/// Upsert resources whose declaration lists initialization steps.
fn augment_with_initialization(
    scenario_name: &str,
    declared: &BTreeMap<String, ResourceDeclaration>,
    found: &mut BTreeMap<String, ScenarioDependency>,
) {
    for (name, decl) in declared {
        if decl.initialization.is_empty() {
            continue;
        }
        let entry = found.entry(name.clone()).or_insert_with(|| {
            new_dependency(scenario_name, name, AccessMethod::Initialization, declared)
        });
        entry.initialization_detected = true;

        let mut files: BTreeSet<String> = entry.initialization_files.drain(..).collect();
        files.extend(decl.initialization_files().map(str::to_string));
        entry.initialization_files = files.into_iter().collect();
    }
}
