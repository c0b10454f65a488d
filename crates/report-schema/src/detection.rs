//! Static detection results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of thing a detected dependency points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Resource,
    Scenario,
    SharedWorkflow,
}

/// How a dependency was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    /// `resource-<name>` CLI token.
    ResourceCli,
    /// Connection string, env var or SDK call heuristic.
    Heuristic,
    /// Declared initialization steps in service.json.
    Initialization,
    /// `vrooli scenario <verb> <name>`.
    VrooliCli,
    /// `<name>-cli` / `<name>-api` reference.
    DirectCli,
    /// `resolveScenarioPortViaCLI(...)` call.
    ScenarioPortCli,
    /// Shared workflow file under initialization/.
    WorkflowTrigger,
}

impl fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessMethod::ResourceCli => "resource_cli",
            AccessMethod::Heuristic => "heuristic",
            AccessMethod::Initialization => "initialization",
            AccessMethod::VrooliCli => "vrooli_cli",
            AccessMethod::DirectCli => "direct_cli",
            AccessMethod::ScenarioPortCli => "scenario_port_cli",
            AccessMethod::WorkflowTrigger => "workflow_trigger",
        };
        f.write_str(s)
    }
}

/// One piece of evidence behind a detected dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionMatch {
    /// Source text of the regex that matched.
    pub pattern: String,
    pub method: AccessMethod,
    /// POSIX path relative to the scenario root.
    pub file: String,
}

/// A dependency edge found by static analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDependency {
    /// Scenario that holds the reference.
    pub scenario_name: String,
    pub dependency_type: DependencyKind,
    /// Normalized target name.
    pub dependency_name: String,
    pub required: bool,
    pub purpose: String,
    pub access_method: AccessMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// File the reference was found in (scenario and workflow edges).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Evidence in file-walk order (resource edges).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<DetectionMatch>,
    #[serde(default)]
    pub initialization_detected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initialization_files: Vec<String>,
}

impl ScenarioDependency {
    /// Create a dependency edge without evidence.
    pub fn new(
        scenario_name: impl Into<String>,
        dependency_type: DependencyKind,
        dependency_name: impl Into<String>,
        access_method: AccessMethod,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            dependency_type,
            dependency_name: dependency_name.into(),
            required: false,
            purpose: String::new(),
            access_method,
            resource_type: None,
            source_file: None,
            matches: Vec::new(),
            initialization_detected: false,
            initialization_files: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }
}

/// Difference between what service.json declares and what the code uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDrift {
    /// Detected in code but not declared.
    pub missing_resources: Vec<String>,
    /// Declared but never detected.
    pub unused_resources: Vec<String>,
    pub missing_scenarios: Vec<String>,
    pub unused_scenarios: Vec<String>,
}

impl DependencyDrift {
    pub fn is_clean(&self) -> bool {
        self.missing_resources.is_empty()
            && self.unused_resources.is_empty()
            && self.missing_scenarios.is_empty()
            && self.unused_scenarios.is_empty()
    }
}

/// Everything the detector finds for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub scenario: String,
    pub resources: Vec<ScenarioDependency>,
    pub scenarios: Vec<ScenarioDependency>,
    pub workflows: Vec<ScenarioDependency>,
    pub drift: DependencyDrift,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_method_serializes_snake_case() {
        let json = serde_json::to_string(&AccessMethod::ScenarioPortCli).unwrap();
        assert_eq!(json, "\"scenario_port_cli\"");
        assert_eq!(AccessMethod::ScenarioPortCli.to_string(), "scenario_port_cli");
    }

    #[test]
    fn test_builder_sets_fields() {
        let dep = ScenarioDependency::new(
            "picker-wheel",
            DependencyKind::Scenario,
            "auth-service",
            AccessMethod::ScenarioPortCli,
        )
        .required(true)
        .purpose("References auth-service port via CLI")
        .source_file("api/main.go");

        assert!(dep.required);
        assert_eq!(dep.source_file.as_deref(), Some("api/main.go"));
        let value = serde_json::to_value(&dep).unwrap();
        assert_eq!(value["dependency_type"], "scenario");
        assert!(value.get("matches").is_none());
    }

    #[test]
    fn test_drift_clean() {
        assert!(DependencyDrift::default().is_clean());
        let drift = DependencyDrift {
            unused_resources: vec!["redis".to_string()],
            ..Default::default()
        };
        assert!(!drift.is_clean());
    }
}
