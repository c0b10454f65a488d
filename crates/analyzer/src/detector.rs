//! Detection facade over the catalog and both scanners.

use crate::catalog::CatalogManager;
use crate::config::{declared_scenarios, normalize_name, resolved_resource_map};
use crate::resource_scan::ResourceScanner;
use crate::scenario_scan::ScenarioScanner;
use sda_report_schema::{DependencyDrift, DetectionReport, ScenarioDependency, ServiceConfig};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

pub struct Detector<'a> {
    catalog: &'a CatalogManager,
}

impl<'a> Detector<'a> {
    pub fn new(catalog: &'a CatalogManager) -> Self {
        Self { catalog }
    }

    /// Detector over the process-wide catalog.
    pub fn global() -> Detector<'static> {
        Detector::new(CatalogManager::global())
    }

    pub fn detect_resources(
        &self,
        scenario_path: &Path,
        scenario_name: &str,
        cfg: Option<&ServiceConfig>,
    ) -> Vec<ScenarioDependency> {
        let snapshot = self.catalog.current();
        ResourceScanner::new(&snapshot).scan(scenario_path, scenario_name, cfg)
    }

    pub fn detect_scenarios(&self, scenario_path: &Path, scenario_name: &str) -> Vec<ScenarioDependency> {
        let snapshot = self.catalog.current();
        ScenarioScanner::new(&snapshot).scan_dependencies(scenario_path, scenario_name)
    }

    pub fn detect_workflows(&self, scenario_path: &Path, scenario_name: &str) -> Vec<ScenarioDependency> {
        let snapshot = self.catalog.current();
        ScenarioScanner::new(&snapshot).scan_workflows(scenario_path, scenario_name)
    }

    pub fn known_scenarios(&self) -> BTreeSet<String> {
        self.catalog.known_scenarios()
    }

    pub fn known_resources(&self) -> BTreeSet<String> {
        self.catalog.known_resources()
    }

    pub fn refresh_catalog(&self) {
        self.catalog.refresh();
    }

    /// Declared versus detected dependencies.
    pub fn compare_declared(
        &self,
        cfg: &ServiceConfig,
        resources: &[ScenarioDependency],
        scenarios: &[ScenarioDependency],
    ) -> DependencyDrift {
        let declared_resources: BTreeSet<String> = resolved_resource_map(cfg).into_keys().collect();
        let declared_scenarios: BTreeSet<String> = declared_scenarios(cfg).into_iter().collect();
        let detected_resources = detected_names(resources);
        let detected_scenarios = detected_names(scenarios);

        DependencyDrift {
            missing_resources: difference(&detected_resources, &declared_resources),
            unused_resources: difference(&declared_resources, &detected_resources),
            missing_scenarios: difference(&detected_scenarios, &declared_scenarios),
            unused_scenarios: difference(&declared_scenarios, &detected_scenarios),
        }
    }

    /// Run every detection for one scenario.
    pub fn analyze(
        &self,
        scenario_path: &Path,
        scenario_name: &str,
        cfg: Option<&ServiceConfig>,
    ) -> DetectionReport {
        let resources = self.detect_resources(scenario_path, scenario_name, cfg);
        let scenarios = self.detect_scenarios(scenario_path, scenario_name);
        let workflows = self.detect_workflows(scenario_path, scenario_name);
        let drift = cfg
            .map(|cfg| self.compare_declared(cfg, &resources, &scenarios))
            .unwrap_or_default();

        if !drift.is_clean() {
            info!(
                "Dependency drift in {}: {} undeclared resources, {} undeclared scenarios",
                scenario_name,
                drift.missing_resources.len(),
                drift.missing_scenarios.len()
            );
        }

        DetectionReport {
            scenario: normalize_name(scenario_name),
            resources,
            scenarios,
            workflows,
            drift,
        }
    }
}

fn detected_names(deps: &[ScenarioDependency]) -> BTreeSet<String> {
    deps.iter()
        .map(|dep| normalize_name(&dep.dependency_name))
        .collect()
}

fn difference(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Vec<String> {
    left.difference(right).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AnalyzerConfig;
    use tempfile::{tempdir, TempDir};

    fn repo() -> (TempDir, AnalyzerConfig) {
        let dir = tempdir().unwrap();
        let config = AnalyzerConfig {
            scenarios_root: dir.path().join("scenarios"),
            resources_root: dir.path().join("resources"),
        };
        for name in ["svc-a", "auth-service"] {
            let vrooli = config.scenarios_root.join(name).join(".vrooli");
            std::fs::create_dir_all(&vrooli).unwrap();
            std::fs::write(vrooli.join("service.json"), "{}").unwrap();
        }
        for name in ["postgres", "redis"] {
            std::fs::create_dir_all(config.resources_root.join(name)).unwrap();
        }
        (dir, config)
    }

    #[test]
    fn test_analyze_reports_drift() {
        let (_dir, config) = repo();
        let root = config.scenario_path("svc-a");
        std::fs::create_dir_all(root.join("api")).unwrap();
        std::fs::write(
            root.join("api/main.go"),
            "resource-postgres\nvrooli scenario status auth-service\n",
        )
        .unwrap();

        let cfg: ServiceConfig = serde_json::from_str(
            r#"{"dependencies": {"resources": {"redis": {"type": "cache"}}}}"#,
        )
        .unwrap();

        let catalog = CatalogManager::new(&config);
        let report = Detector::new(&catalog).analyze(&root, "svc-a", Some(&cfg));

        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.scenarios.len(), 1);
        assert!(report.workflows.is_empty());
        assert_eq!(report.drift.missing_resources, vec!["postgres"]);
        assert_eq!(report.drift.unused_resources, vec!["redis"]);
        assert_eq!(report.drift.missing_scenarios, vec!["auth-service"]);
        assert!(report.drift.unused_scenarios.is_empty());
    }

    #[test]
    fn test_catalog_queries_and_refresh() {
        let (_dir, config) = repo();
        let catalog = CatalogManager::new(&config);
        let detector = Detector::new(&catalog);
        assert!(detector.known_resources().contains("postgres"));
        assert!(!detector.known_resources().contains("minio"));

        std::fs::create_dir_all(config.resources_root.join("minio")).unwrap();
        detector.refresh_catalog();
        assert!(detector.known_resources().contains("minio"));
        assert_eq!(detector.known_scenarios().len(), 2);
    }
}
