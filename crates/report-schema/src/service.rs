//! Types for a scenario's `.vrooli/service.json` descriptor.
//!
//! Only the fields the analyzer reads are modelled; unknown fields are
//! ignored on deserialization. Free-form blocks (`footprint`,
//! `requirements`, `aggregate_requirements`, scenario declarations) are kept
//! as raw JSON values and passed through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One scenario's description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceInfo,
    #[serde(default)]
    pub dependencies: DependencyDeclarations,
    /// Legacy resource map, consulted only when `dependencies.resources` is empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,
}

/// Identity block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// Declared runtime dependencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyDeclarations {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDeclaration>,
    #[serde(default)]
    pub scenarios: BTreeMap<String, Value>,
}

/// A declared resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub initialization: Vec<BTreeMap<String, Value>>,
}

impl ResourceDeclaration {
    /// `file` fields of the initialization entries, in declaration order.
    pub fn initialization_files(&self) -> impl Iterator<Item = &str> {
        self.initialization
            .iter()
            .filter_map(|step| step.get("file").and_then(Value::as_str))
    }
}

/// The `deployment` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_requirements: Option<Value>,
    #[serde(default)]
    pub tiers: BTreeMap<String, DeploymentTier>,
    #[serde(default)]
    pub dependencies: DeploymentDependencyCatalog,
}

/// Per-tier deployment declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentTier {
    /// Free text: "ready", "supported", "limited", "blocked", or anything else.
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Value>,
    #[serde(default)]
    pub adaptations: Vec<TierAdaptation>,
}

/// A tier adaptation; only the swap target is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierAdaptation {
    #[serde(default)]
    pub swap: String,
}

/// `deployment.dependencies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentDependencyCatalog {
    #[serde(default)]
    pub resources: BTreeMap<String, DeploymentDependency>,
    #[serde(default)]
    pub scenarios: BTreeMap<String, DeploymentDependency>,
}

impl DeploymentDependencyCatalog {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.scenarios.is_empty()
    }
}

/// Deployment metadata for one dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentDependency {
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Value>,
    #[serde(default)]
    pub platform_support: BTreeMap<String, PlatformSupport>,
    #[serde(default)]
    pub swappable_with: Vec<SwapReference>,
}

/// Declared support of a dependency on one tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSupport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Value>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Entry of `swappable_with`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapReference {
    #[serde(default)]
    pub id: String,
}
