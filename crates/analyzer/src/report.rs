//! Report assembly and persistence.

use crate::aggregate::compute_aggregates;
use crate::config::{load_service_config, normalize_name, scenario_dir};
use crate::dag::{build_dependency_nodes, scenario_graph_has_cycle};
use crate::gaps::analyze_deployment_gaps;
use crate::manifest::build_bundle_manifest;
use sda_common::io::atomic_write;
use sda_common::{Error, Result, Timestamp};
use sda_report_schema::{DeploymentAnalysisReport, ServiceConfig, REPORT_VERSION};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Report location relative to a scenario root.
pub const REPORT_PATH: &str = ".vrooli/deployment/deployment-report.json";

/// Build the deployment report for one scenario.
///
/// Returns `None` when no descriptor is supplied. Every other degradation is
/// recorded inside the report.
pub fn build_report(
    scenario_name: &str,
    scenario_path: &Path,
    scenarios_dir: &Path,
    cfg: Option<&ServiceConfig>,
) -> Option<DeploymentAnalysisReport> {
    let cfg = cfg?;
    let name = normalize_name(scenario_name);

    let mut visited = BTreeSet::from([name.clone()]);
    let dependencies = build_dependency_nodes(scenarios_dir, &name, cfg, &mut visited);
    if scenario_graph_has_cycle(&name, &dependencies) {
        warn!("Scenario graph rooted at {} contains a dependency cycle", name);
    }

    let aggregates = compute_aggregates(&dependencies);
    let generated_at = Timestamp::now();
    let bundle_manifest =
        build_bundle_manifest(&name, scenario_path, cfg, &dependencies, generated_at);
    let metadata_gaps =
        analyze_deployment_gaps(&name, scenario_path, cfg, &dependencies, &aggregates);

    info!(
        "Built deployment report for {}: {} dependencies, {} tiers, {} gaps",
        name,
        dependencies.len(),
        aggregates.len(),
        metadata_gaps.total_gaps
    );

    Some(DeploymentAnalysisReport {
        scenario: name,
        report_version: REPORT_VERSION,
        generated_at,
        dependencies,
        aggregates,
        bundle_manifest,
        metadata_gaps,
    })
}

/// Load the descriptor under `<scenarios_dir>/<scenario_name>` and build its report.
pub fn analyze_scenario(scenarios_dir: &Path, scenario_name: &str) -> Result<DeploymentAnalysisReport> {
    let name = normalize_name(scenario_name);
    let scenario_path = scenario_dir(scenarios_dir, scenario_name);
    let cfg = load_service_config(&scenario_path)?;
    build_report(&name, &scenario_path, scenarios_dir, Some(&cfg))
        .ok_or_else(|| Error::Config(format!("no report produced for {name}")))
}

pub fn report_path(scenario_path: &Path) -> PathBuf {
    scenario_path.join(REPORT_PATH)
}

/// Atomically replace the persisted report. Returns the written path.
pub fn persist_report(scenario_path: &Path, report: &DeploymentAnalysisReport) -> Result<PathBuf> {
    let path = report_path(scenario_path);
    let data = serde_json::to_vec_pretty(report)?;
    atomic_write(&path, &data)?;
    info!("Persisted deployment report to {}", path.display());
    Ok(path)
}

/// Read a previously persisted report.
pub fn load_report(scenario_path: &Path) -> Result<DeploymentAnalysisReport> {
    let content = std::fs::read_to_string(report_path(scenario_path))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_scenario(scenarios_dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = scenarios_dir.join(name);
        std::fs::create_dir_all(path.join(".vrooli")).unwrap();
        std::fs::write(path.join(".vrooli/service.json"), json).unwrap();
        path
    }

    #[test]
    fn test_no_config_no_report() {
        let dir = tempdir().unwrap();
        assert!(build_report("svc-a", dir.path(), dir.path(), None).is_none());
    }

    #[test]
    fn test_timestamps_agree() {
        let dir = tempdir().unwrap();
        let path = write_scenario(dir.path(), "svc-a", r#"{"service": {"name": "svc-a"}}"#);
        let cfg = load_service_config(&path).unwrap();
        let report = build_report("SVC-A", &path, dir.path(), Some(&cfg)).unwrap();

        assert_eq!(report.scenario, "svc-a");
        assert_eq!(report.report_version, 1);
        assert_eq!(report.generated_at, report.bundle_manifest.generated_at);
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempdir().unwrap();
        let report = analyze_scenario(dir.path(), "svc-a");
        assert!(matches!(report, Err(Error::ConfigMissing { .. })));

        let path = write_scenario(dir.path(), "svc-a", r#"{"service": {"version": "2.0.0"}}"#);
        let report = analyze_scenario(dir.path(), "svc-a").unwrap();
        let written = persist_report(&path, &report).unwrap();
        assert!(written.ends_with(".vrooli/deployment/deployment-report.json"));

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded.scenario, "svc-a");
        assert_eq!(loaded.generated_at, report.generated_at);
        assert_eq!(loaded.bundle_manifest.skeleton.app.version, "2.0.0");
    }

    #[test]
    fn test_mixed_case_directory_is_analyzed() {
        let dir = tempdir().unwrap();
        write_scenario(dir.path(), "Auth-Service", r#"{"service": {"version": "3.1.0"}}"#);

        let report = analyze_scenario(dir.path(), "Auth-Service").unwrap();
        assert_eq!(report.scenario, "auth-service");
        assert_eq!(report.bundle_manifest.skeleton.app.version, "3.1.0");

        let report = analyze_scenario(dir.path(), "auth-service").unwrap();
        assert_eq!(report.bundle_manifest.skeleton.app.version, "3.1.0");
    }

    #[test]
    fn test_load_missing_report_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_report(dir.path()), Err(Error::Io(_))));
    }
}
