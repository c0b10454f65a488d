//! Desktop bundle manifest generation.

use crate::config::SERVICE_CONFIG_PATH;
use sda_common::{Platform, Timestamp};
use sda_report_schema::{
    BinaryTarget, BundleApp, BundleAsset, BundleDependency, BundleFile, BundleManifest,
    BundleService, BundleSwap, DependencyNode, DesktopBundleSkeleton, HealthCheck, IpcConfig,
    NodeType, PortDefaults, PortRange, ReadinessCheck, RequestedPort, ServiceConfig,
    ServicePorts, TelemetryConfig,
};
use std::collections::BTreeMap;
use std::path::Path;

pub const SKELETON_SCHEMA_VERSION: &str = "v0.1";
pub const SKELETON_TARGET: &str = "desktop";

const IPC_MODE: &str = "loopback-http";
const IPC_HOST: &str = "127.0.0.1";
const IPC_PORT: u16 = 39200;
const IPC_AUTH_TOKEN_PATH: &str = "runtime/auth_token";
const TELEMETRY_FILE: &str = "telemetry/deployment-telemetry.jsonl";
const DEFAULT_PORT_RANGE: PortRange = PortRange { min: 20000, max: 24000 };
const API_PORT_RANGE: PortRange = PortRange { min: 23100, max: 23200 };
const UI_PORT_RANGE: PortRange = PortRange { min: 24100, max: 24200 };
const SWAP_REASON: &str = "Recommended bundle-safe alternative from dependency metadata";
const PENDING_SHA256: &str = "pending";
const FALLBACK_API_BINARY: &str = "api/server";
const UI_DIST_DIR: &str = "ui/dist";
const UI_INDEX: &str = "ui/dist/index.html";

/// Build the bundle manifest for one scenario.
pub fn build_bundle_manifest(
    scenario_name: &str,
    scenario_path: &Path,
    cfg: &ServiceConfig,
    nodes: &[DependencyNode],
    generated_at: Timestamp,
) -> BundleManifest {
    let dependencies = flatten_dependencies(nodes);
    BundleManifest {
        scenario: scenario_name.to_string(),
        generated_at,
        files: bundle_files(scenario_name, scenario_path),
        skeleton: desktop_skeleton(scenario_name, scenario_path, cfg, &dependencies),
        dependencies,
    }
}

/// Conventional scenario locations and whether each exists.
fn bundle_files(scenario_name: &str, scenario_path: &Path) -> Vec<BundleFile> {
    let entries = [
        (SERVICE_CONFIG_PATH.to_string(), "config"),
        ("api/".to_string(), "directory"),
        (api_binary(scenario_name), "binary"),
        (format!("{UI_DIST_DIR}/"), "directory"),
        (UI_INDEX.to_string(), "ui"),
        (format!("cli/{scenario_name}"), "cli"),
    ];

    entries
        .into_iter()
        .map(|(path, file_type)| {
            let exists = scenario_path.join(path.trim_end_matches('/')).exists();
            BundleFile {
                path,
                file_type: file_type.to_string(),
                exists,
                notes: None,
            }
        })
        .collect()
}

/// Every node once, keyed by `type:name`, sorted by (type, name).
fn flatten_dependencies(nodes: &[DependencyNode]) -> Vec<BundleDependency> {
    let mut flat: BTreeMap<(NodeType, String), BundleDependency> = BTreeMap::new();
    for root in nodes {
        root.walk(&mut |node| {
            flat.entry((node.node_type, node.name.clone()))
                .or_insert_with(|| BundleDependency {
                    name: node.name.clone(),
                    dependency_type: node.node_type,
                    resource_type: node.resource_type.clone(),
                    tier_support: node.tier_support.clone(),
                    alternatives: node.alternatives.clone(),
                });
        });
    }
    flat.into_values().collect()
}

fn desktop_skeleton(
    scenario_name: &str,
    scenario_path: &Path,
    cfg: &ServiceConfig,
    dependencies: &[BundleDependency],
) -> DesktopBundleSkeleton {
    let info = &cfg.service;
    let name = non_empty_or(&info.name, scenario_name);
    let app = BundleApp {
        display_name: non_empty_or(&info.display_name, &name),
        version: non_empty_or(&info.version, "0.0.0"),
        description: info.description.clone(),
        name,
    };

    let swaps = dependencies
        .iter()
        .filter(|dep| dep.dependency_type == NodeType::Resource)
        .filter_map(|dep| {
            dep.alternatives.first().map(|replacement| BundleSwap {
                original: dep.name.clone(),
                replacement: replacement.clone(),
                reason: SWAP_REASON.to_string(),
            })
        })
        .collect();

    let mut services = vec![api_service(scenario_name, scenario_path, &app.display_name)];
    if scenario_path.join(UI_INDEX).exists() || scenario_path.join(UI_DIST_DIR).exists() {
        services.push(ui_service(scenario_path, &app.display_name));
    }

    DesktopBundleSkeleton {
        schema_version: SKELETON_SCHEMA_VERSION.to_string(),
        target: SKELETON_TARGET.to_string(),
        app,
        ipc: IpcConfig {
            mode: IPC_MODE.to_string(),
            host: IPC_HOST.to_string(),
            port: IPC_PORT,
            auth_token_path: IPC_AUTH_TOKEN_PATH.to_string(),
        },
        telemetry: TelemetryConfig {
            file: TELEMETRY_FILE.to_string(),
        },
        ports: PortDefaults {
            range: DEFAULT_PORT_RANGE,
        },
        swaps,
        services,
    }
}

fn api_binary(scenario_name: &str) -> String {
    format!("api/{scenario_name}-api")
}

fn api_service(scenario_name: &str, scenario_path: &Path, display_name: &str) -> BundleService {
    let preferred = api_binary(scenario_name);
    let binary = if scenario_path.join(&preferred).exists() {
        preferred
    } else {
        FALLBACK_API_BINARY.to_string()
    };

    let binaries = Platform::ALL
        .iter()
        .map(|platform| {
            (
                *platform,
                BinaryTarget {
                    path: platform.binary_path(&binary),
                },
            )
        })
        .collect();

    BundleService {
        id: "api".to_string(),
        service_type: "api-binary".to_string(),
        description: format!("{display_name} API server"),
        binaries,
        ports: http_port(API_PORT_RANGE),
        health: http_health("/health"),
        readiness: ReadinessCheck {
            check_type: "port_open".to_string(),
            port_name: Some("http".to_string()),
            timeout_ms: 30000,
        },
        dependencies: Vec::new(),
        critical: true,
        assets: Vec::new(),
    }
}

fn ui_service(scenario_path: &Path, display_name: &str) -> BundleService {
    let asset = if scenario_path.join(UI_INDEX).exists() {
        UI_INDEX.to_string()
    } else {
        format!("{UI_DIST_DIR}/")
    };

    BundleService {
        id: "ui".to_string(),
        service_type: "ui-bundle".to_string(),
        description: format!("{display_name} web UI"),
        binaries: BTreeMap::new(),
        ports: http_port(UI_PORT_RANGE),
        health: http_health("/"),
        readiness: ReadinessCheck {
            check_type: "health_success".to_string(),
            port_name: None,
            timeout_ms: 30000,
        },
        dependencies: vec!["api".to_string()],
        critical: true,
        assets: vec![BundleAsset {
            path: asset,
            sha256: PENDING_SHA256.to_string(),
        }],
    }
}

fn http_port(range: PortRange) -> ServicePorts {
    ServicePorts {
        requested: vec![RequestedPort {
            name: "http".to_string(),
            range,
        }],
    }
}

fn http_health(path: &str) -> HealthCheck {
    HealthCheck {
        check_type: "http".to_string(),
        path: path.to_string(),
        port_name: "http".to_string(),
        interval_ms: 2000,
        timeout_ms: 15000,
        retries: 5,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
