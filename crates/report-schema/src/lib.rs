//! Report schema definitions for the scenario analyzer.
//!
//! This crate defines the input descriptor (`service.json`), the static
//! detection records, and the deployment analysis report with its bundle
//! manifest.

pub mod bundle;
pub mod detection;
pub mod report;
pub mod schema;
pub mod service;
pub mod validation;

pub use bundle::{
    BinaryTarget, BundleApp, BundleAsset, BundleDependency, BundleFile, BundleManifest,
    BundleService, BundleSwap, DesktopBundleSkeleton, HealthCheck, IpcConfig, PortDefaults,
    PortRange, ReadinessCheck, RequestedPort, ServicePorts, TelemetryConfig,
};
pub use detection::{
    AccessMethod, DependencyDrift, DependencyKind, DetectionMatch, DetectionReport,
    ScenarioDependency,
};
pub use report::{
    DependencyNode, DeploymentAnalysisReport, DeploymentMetadataGaps, NodeType,
    ResourceSwapSuggestion, ScenarioGapInfo, SecretRequirement, TierAggregate,
    TierSupportSource, TierSupportSummary, DEFAULT_GAP_TIERS, NOTE_CYCLE_DETECTED,
    REPORT_VERSION, SOURCE_DECLARED, STANDARD_TIERS,
};
pub use service::{
    DependencyDeclarations, DeploymentConfig, DeploymentDependency, DeploymentDependencyCatalog,
    DeploymentTier, PlatformSupport, ResourceDeclaration, ServiceConfig, ServiceInfo,
    SwapReference, TierAdaptation,
};
pub use validation::{validate_report, validate_report_file};
