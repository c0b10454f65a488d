//! Desktop bundle manifest types.

use crate::report::{NodeType, TierSupportSummary};
use sda_common::{Platform, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes how a scenario could be packaged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub scenario: String,
    pub generated_at: Timestamp,
    /// Conventional locations and whether they exist.
    pub files: Vec<BundleFile>,
    /// Flattened DAG, unique by `type:name`, sorted by (type, name).
    pub dependencies: Vec<BundleDependency>,
    pub skeleton: DesktopBundleSkeleton,
}

/// A conventional file or directory in the scenario tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleFile {
    /// POSIX path relative to the scenario root.
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One flattened dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDependency {
    pub name: String,
    #[serde(rename = "type")]
    pub dependency_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub tier_support: BTreeMap<String, TierSupportSummary>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Scaffold for a local desktop bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopBundleSkeleton {
    pub schema_version: String,
    pub target: String,
    pub app: BundleApp,
    pub ipc: IpcConfig,
    pub telemetry: TelemetryConfig,
    pub ports: PortDefaults,
    pub swaps: Vec<BundleSwap>,
    pub services: Vec<BundleService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleApp {
    pub name: String,
    pub display_name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// How the desktop shell talks to bundled services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcConfig {
    pub mode: String,
    pub host: String,
    pub port: u16,
    pub auth_token_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDefaults {
    pub range: PortRange,
}

/// A resource replaced inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSwap {
    pub original: String,
    pub replacement: String,
    pub reason: String,
}

/// A process or asset set shipped in the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binaries: BTreeMap<Platform, BinaryTarget>,
    pub ports: ServicePorts,
    pub health: HealthCheck,
    pub readiness: ReadinessCheck,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<BundleAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryTarget {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePorts {
    pub requested: Vec<RequestedPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedPort {
    pub name: String,
    pub range: PortRange,
}

/// Health probe for a bundled service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    pub path: String,
    pub port_name: String,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub retries: u32,
}

/// Condition under which a service counts as ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleAsset {
    pub path: String,
    pub sha256: String,
}
