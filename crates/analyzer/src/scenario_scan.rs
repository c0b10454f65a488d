//! Scenario-to-scenario and shared-workflow detection.

use crate::catalog::CatalogSnapshot;
use crate::config::normalize_name;
use crate::filters::SCENARIO_EXTENSIONS;
use crate::patterns::{
    alias_patterns, CLI_SCENARIO_PATTERN, SCENARIO_PORT_CALL_PATTERN, SHARED_WORKFLOW_PATTERN,
    VROOLI_SCENARIO_PATTERN,
};
use crate::walk::{relative_posix, source_files, SourceFile};
use sda_report_schema::{AccessMethod, DependencyKind, ScenarioDependency};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const INITIALIZATION_DIR: &str = "initialization";

/// Identifier to scenario name bindings found in source.
pub type AliasCatalog = BTreeMap<String, String>;

/// Finds references from one scenario to others.
pub struct ScenarioScanner<'a> {
    catalog: &'a CatalogSnapshot,
}

impl<'a> ScenarioScanner<'a> {
    pub fn new(catalog: &'a CatalogSnapshot) -> Self {
        Self { catalog }
    }

    /// Scenario edges in file-walk order. Duplicates across files are kept.
    ///
    /// Walks the tree twice: once to bind aliases, once to collect
    /// references. Only one file's text is held at a time.
    pub fn scan_dependencies(
        &self,
        scenario_path: &Path,
        scenario_name: &str,
    ) -> Vec<ScenarioDependency> {
        let scenario_name = normalize_name(scenario_name);

        let mut aliases = AliasCatalog::new();
        for file in source_files(scenario_path, SCENARIO_EXTENSIONS, true) {
            if let Some(content) = file.read() {
                self.bind_aliases(&content, &mut aliases);
            }
        }

        let mut edges = Vec::new();
        for file in source_files(scenario_path, SCENARIO_EXTENSIONS, true) {
            if let Some(content) = file.read() {
                self.scan_file(&scenario_name, &file, &content, &aliases, &mut edges);
            }
        }

        info!(
            "Detected {} scenario references for {}",
            edges.len(),
            scenario_name
        );
        edges
    }

    /// Shared workflow definitions under `<scenario>/initialization`.
    pub fn scan_workflows(
        &self,
        scenario_path: &Path,
        scenario_name: &str,
    ) -> Vec<ScenarioDependency> {
        let scenario_name = normalize_name(scenario_name);
        let init_dir = scenario_path.join(INITIALIZATION_DIR);
        if !init_dir.is_dir() {
            return Vec::new();
        }

        let mut workflows = Vec::new();
        for file in source_files(&init_dir, &["json"], false) {
            let rel_path = relative_posix(scenario_path, &file.path);
            let Some(caps) = SHARED_WORKFLOW_PATTERN.captures(&rel_path) else {
                continue;
            };
            let Some(workflow) = caps.get(1) else {
                continue;
            };
            workflows.push(
                ScenarioDependency::new(
                    &scenario_name,
                    DependencyKind::SharedWorkflow,
                    workflow.as_str(),
                    AccessMethod::WorkflowTrigger,
                )
                .purpose(format!("Shared workflow {}", workflow.as_str()))
                .source_file(rel_path.clone()),
            );
        }
        workflows
    }

    /// Bind identifiers to known scenario literals.
    pub fn alias_catalog<'c>(&self, contents: impl IntoIterator<Item = &'c str>) -> AliasCatalog {
        let mut aliases = AliasCatalog::new();
        for content in contents {
            self.bind_aliases(content, &mut aliases);
        }
        aliases
    }

    /// Add the bindings in one file. Earlier bindings win.
    fn bind_aliases(&self, content: &str, aliases: &mut AliasCatalog) {
        for pattern in alias_patterns() {
            for caps in pattern.captures_iter(content) {
                let (Some(ident), Some(literal)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let literal = normalize_name(literal.as_str());
                if !self.catalog.is_known_scenario(&literal) {
                    continue;
                }
                aliases
                    .entry(ident.as_str().to_string())
                    .or_insert(literal);
            }
        }
    }

    fn scan_file(
        &self,
        scenario_name: &str,
        file: &SourceFile,
        content: &str,
        aliases: &AliasCatalog,
        edges: &mut Vec<ScenarioDependency>,
    ) {
        for caps in VROOLI_SCENARIO_PATTERN.captures_iter(content) {
            if let Some(target) = caps.get(2) {
                self.push_edge(
                    edges,
                    scenario_name,
                    target.as_str(),
                    AccessMethod::VrooliCli,
                    file,
                    |dep| dep.purpose(format!("Scenario command in {}", file.basename())),
                );
            }
        }

        for caps in CLI_SCENARIO_PATTERN.captures_iter(content) {
            let first_group = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .find(|s| !s.is_empty());
            let Some(target) = first_group else {
                continue;
            };
            self.push_edge(
                edges,
                scenario_name,
                target,
                AccessMethod::DirectCli,
                file,
                |dep| dep.purpose(format!("CLI reference in {}", file.basename())),
            );
        }

        for caps in SCENARIO_PORT_CALL_PATTERN.captures_iter(content) {
            let target = match (caps.get(1), caps.get(2)) {
                (Some(literal), _) => Some(literal.as_str().to_string()),
                (None, Some(ident)) => aliases.get(ident.as_str()).cloned(),
                (None, None) => None,
            };
            let Some(target) = target else {
                debug!("Unresolved port lookup in {}", file.rel_path);
                continue;
            };
            self.push_edge(
                edges,
                scenario_name,
                &target,
                AccessMethod::ScenarioPortCli,
                file,
                |dep| {
                    let purpose = format!("References {} port via CLI", dep.dependency_name);
                    dep.required(true).purpose(purpose)
                },
            );
        }
    }

    fn push_edge(
        &self,
        edges: &mut Vec<ScenarioDependency>,
        scenario_name: &str,
        target: &str,
        method: AccessMethod,
        file: &SourceFile,
        finish: impl FnOnce(ScenarioDependency) -> ScenarioDependency,
    ) {
        let target = normalize_name(target);
        if target.is_empty() || target == scenario_name {
            return;
        }
        if !self.catalog.is_known_scenario(&target) {
            debug!("Dropping unknown scenario {} from {}", target, file.rel_path);
            return;
        }
        let dep = ScenarioDependency::new(scenario_name, DependencyKind::Scenario, target, method)
            .source_file(file.rel_path.clone());
        edges.push(finish(dep));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn scenario(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("svc-a");
        std::fs::create_dir_all(&root).unwrap();
        for (rel, content) in files {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        (dir, root)
    }

    fn catalog(scenarios: &[&str]) -> CatalogSnapshot {
        CatalogSnapshot {
            scenarios: scenarios.iter().map(|s| s.to_string()).collect(),
            resources: BTreeSet::new(),
        }
    }

    #[test]
    fn test_vrooli_cli_reference() {
        let (_dir, root) = scenario(&[("cli/run.sh", "vrooli scenario start auth-service\n")]);
        let catalog = catalog(&["auth-service", "svc-a"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "svc-a");

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].dependency_name, "auth-service");
        assert_eq!(deps[0].access_method, AccessMethod::VrooliCli);
        assert!(!deps[0].required);
        assert_eq!(deps[0].source_file.as_deref(), Some("cli/run.sh"));
    }

    #[test]
    fn test_direct_cli_reference_purpose() {
        let (_dir, root) = scenario(&[("api/client.go", "exec.Command(\"auth-service-cli\")")]);
        let catalog = catalog(&["auth-service"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "svc-a");

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].access_method, AccessMethod::DirectCli);
        assert_eq!(deps[0].purpose, "CLI reference in client.go");
    }

    #[test]
    fn test_port_call_through_alias() {
        let (_dir, root) = scenario(&[
            ("api/consts.go", "const AUTH = \"auth-service\"\n"),
            ("api/main.go", "port := resolveScenarioPortViaCLI(ctx, AUTH, 8080)\n"),
        ]);
        let catalog = catalog(&["auth-service"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "svc-a");

        let port: Vec<_> = deps
            .iter()
            .filter(|d| d.access_method == AccessMethod::ScenarioPortCli)
            .collect();
        assert_eq!(port.len(), 1);
        assert_eq!(port[0].dependency_name, "auth-service");
        assert!(port[0].required);
        assert_eq!(port[0].purpose, "References auth-service port via CLI");
    }

    #[test]
    fn test_alias_declared_after_use_resolves() {
        let (_dir, root) = scenario(&[
            ("api/a_handler.go", "resolveScenarioPortViaCLI(ctx, BILLING, 9000)\n"),
            ("api/z_consts.go", "const BILLING = \"billing\"\n"),
        ]);
        let catalog = catalog(&["billing"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "svc-a");

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].dependency_name, "billing");
        assert_eq!(deps[0].source_file.as_deref(), Some("api/a_handler.go"));
    }

    #[test]
    fn test_unresolved_alias_is_dropped() {
        let (_dir, root) = scenario(&[(
            "api/main.go",
            "const OTHER = \"not-a-scenario\"\nresolveScenarioPortViaCLI(ctx, OTHER, 1)\n",
        )]);
        let catalog = catalog(&["auth-service"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "svc-a");
        assert!(deps.is_empty());
    }

    #[test]
    fn test_self_and_unknown_references_dropped() {
        let (_dir, root) = scenario(&[(
            "cli/run.sh",
            "vrooli scenario run svc-a\nvrooli scenario run ghost\n",
        )]);
        let catalog = catalog(&["svc-a", "auth-service"]);
        let deps = ScenarioScanner::new(&catalog).scan_dependencies(&root, "SVC-A");
        assert!(deps.is_empty());
    }

    #[test]
    fn test_alias_catalog_skips_unknown_literals() {
        let catalog = catalog(&["auth-service"]);
        let scanner = ScenarioScanner::new(&catalog);
        let aliases = scanner.alias_catalog([
            "const AUTH = \"auth-service\"\nname := \"other\"\n",
            "var (\n    Target = \"auth-service\"\n)\n",
        ]);
        assert_eq!(aliases.get("AUTH").map(String::as_str), Some("auth-service"));
        assert_eq!(aliases.get("Target").map(String::as_str), Some("auth-service"));
        assert!(!aliases.contains_key("name"));
    }

    #[test]
    fn test_scan_workflows() {
        let (_dir, root) = scenario(&[
            ("initialization/automation/n8n/embedding-generator.json", "{}"),
            ("initialization/huginn/agent.json", "{}"),
            ("initialization/postgres/schema.json", "{}"),
        ]);
        let catalog = CatalogSnapshot::default();
        let flows = ScenarioScanner::new(&catalog).scan_workflows(&root, "svc-a");

        let names: Vec<&str> = flows.iter().map(|f| f.dependency_name.as_str()).collect();
        assert_eq!(names, vec!["embedding-generator.json", "agent.json"]);
        assert!(flows
            .iter()
            .all(|f| f.dependency_type == DependencyKind::SharedWorkflow
                && f.access_method == AccessMethod::WorkflowTrigger));
    }

    #[test]
    fn test_scan_workflows_without_initialization() {
        let (_dir, root) = scenario(&[("api/main.go", "")]);
        let catalog = CatalogSnapshot::default();
        assert!(ScenarioScanner::new(&catalog)
            .scan_workflows(&root, "svc-a")
            .is_empty());
    }
}
