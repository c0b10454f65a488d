//! Deployment analysis report - output of the analyzer.

use crate::bundle::BundleManifest;
use sda_common::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Current report format. Incompatible changes must bump this.
pub const REPORT_VERSION: u32 = 1;

/// The six tiers every dependency is scored against when nothing is declared.
pub const STANDARD_TIERS: [&str; 6] = ["local", "desktop", "server", "mobile", "saas", "enterprise"];

/// Tiers assumed by the gap analyzer when nothing else names one.
pub const DEFAULT_GAP_TIERS: [&str; 4] = ["desktop", "server", "mobile", "saas"];

/// `DependencyNode.source` for every node produced today.
pub const SOURCE_DECLARED: &str = "declared";

/// Note attached to the second occurrence of a scenario on a path.
pub const NOTE_CYCLE_DETECTED: &str = "cycle detected";

/// The complete report for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentAnalysisReport {
    pub scenario: String,
    pub report_version: u32,
    pub generated_at: Timestamp,
    /// Root-level DAG: resources first, then scenarios, each alphabetical.
    pub dependencies: Vec<DependencyNode>,
    pub aggregates: BTreeMap<String, TierAggregate>,
    pub bundle_manifest: BundleManifest,
    pub metadata_gaps: DeploymentMetadataGaps,
}

/// Node kind in the expanded DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Resource,
    Scenario,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Resource => write!(f, "resource"),
            NodeType::Scenario => write!(f, "scenario"),
        }
    }
}

/// One node of a scenario's expanded dependency tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Normalized name.
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Value>,
    #[serde(default)]
    pub tier_support: BTreeMap<String, TierSupportSummary>,
    /// Deduplicated and sorted.
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// A declared node with no metadata yet.
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            resource_type: None,
            path: None,
            source: SOURCE_DECLARED.to_string(),
            notes: None,
            requirements: None,
            tier_support: BTreeMap::new(),
            alternatives: Vec::new(),
            children: Vec::new(),
        }
    }

    /// `type:name`, unique across a flattened tree.
    pub fn key(&self) -> String {
        format!("{}:{}", self.node_type, self.name)
    }

    pub fn is_cycle_marker(&self) -> bool {
        self.notes.as_deref() == Some(NOTE_CYCLE_DETECTED)
    }

    /// Pre-order walk over this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a DependencyNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Which input produced a tier-support entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSupportSource {
    /// `platform_support` in deployment dependency metadata.
    Declared,
    /// A scenario's own `deployment.tiers` status.
    TierStatus,
    /// Default from the resource decision table.
    Inferred,
}

/// Support of one dependency on one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSupportSummary {
    /// `None` means unknown.
    pub supported: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    pub source: TierSupportSource,
}

impl TierSupportSummary {
    pub fn new(source: TierSupportSource) -> Self {
        Self {
            supported: None,
            fitness_score: None,
            reason: None,
            notes: None,
            requirements: None,
            alternatives: Vec::new(),
            source,
        }
    }
}

/// Per-tier rollup over a DAG.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierAggregate {
    pub dependency_count: usize,
    /// Mean over nodes that carry a score; 0.0 when none do.
    pub fitness_score: f64,
    pub blocking_dependencies: Vec<String>,
}

/// Missing deployment metadata across a scenario and everything it depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentMetadataGaps {
    pub total_gaps: usize,
    pub scenarios_missing_all: usize,
    pub gaps_by_scenario: BTreeMap<String, ScenarioGapInfo>,
    pub missing_tiers: Vec<String>,
    pub secret_requirements: Vec<SecretRequirement>,
    pub resource_swap_suggestions: Vec<ResourceSwapSuggestion>,
    pub recommendations: Vec<String>,
}

/// Gap findings for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioGapInfo {
    pub scenario_path: String,
    pub has_deployment_block: bool,
    pub missing_dependency_catalog: bool,
    pub missing_tier_definitions: Vec<String>,
    pub missing_resource_metadata: Vec<String>,
    pub missing_scenario_metadata: Vec<String>,
    pub suggested_actions: Vec<String>,
}

/// Secrets a dependency needs before deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequirement {
    pub dependency_name: String,
    pub dependency_type: String,
    pub secret_type: String,
    pub required_secrets: Vec<String>,
    pub playbook_reference: String,
    pub priority: String,
}

/// A recommended replacement for a resource on some tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSwapSuggestion {
    pub original_resource: String,
    pub alternative_resource: String,
    pub reason: String,
    pub applicable_tiers: Vec<String>,
    pub relationship: String,
    pub impact_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key_and_walk() {
        let mut root = DependencyNode::new("svc-b", NodeType::Scenario);
        root.children.push(DependencyNode::new("postgres", NodeType::Resource));
        let mut cycle = DependencyNode::new("svc-a", NodeType::Scenario);
        cycle.notes = Some(NOTE_CYCLE_DETECTED.to_string());
        root.children.push(cycle);

        let mut seen = Vec::new();
        root.walk(&mut |n| seen.push(n.key()));
        assert_eq!(seen, vec!["scenario:svc-b", "resource:postgres", "scenario:svc-a"]);
        assert!(root.children[1].is_cycle_marker());
    }

    #[test]
    fn test_node_serializes_type_field() {
        let node = DependencyNode::new("redis", NodeType::Resource);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "resource");
        assert_eq!(value["source"], "declared");
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_unknown_support_serializes_null() {
        let summary = TierSupportSummary::new(TierSupportSource::TierStatus);
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["supported"].is_null());
        assert_eq!(value["source"], "tier_status");
    }
}
