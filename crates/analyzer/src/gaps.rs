//! Missing deployment metadata across a scenario and its dependencies.

use crate::config::{
    declared_scenarios, load_service_config, normalize_name, resolved_resource_map,
};
use crate::decisions::{classify_secret, recommend_swaps};
use sda_report_schema::{
    DependencyNode, DeploymentMetadataGaps, NodeType, ScenarioGapInfo, ServiceConfig,
    TierAggregate, DEFAULT_GAP_TIERS,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Weight of a scenario with no deployment block at all.
pub const MISSING_DEPLOYMENT_WEIGHT: usize = 10;

const ACTION_ADD_DEPLOYMENT: &str = "Add deployment block to .vrooli/service.json";
const ACTION_ADD_CATALOG: &str =
    "Add deployment.dependencies with resource and scenario metadata";
const ACTION_DEFINE_TIERS: &str = "Define deployment.tiers with fitness scores";

/// Analyze `scenario_name` and every scenario reachable through `nodes`.
pub fn analyze_deployment_gaps(
    scenario_name: &str,
    scenario_path: &Path,
    cfg: &ServiceConfig,
    nodes: &[DependencyNode],
    aggregates: &BTreeMap<String, TierAggregate>,
) -> DeploymentMetadataGaps {
    let known_tiers = known_tiers(cfg, aggregates);
    let mut gaps = DeploymentMetadataGaps::default();
    let mut missing_tiers = BTreeSet::new();

    let root = normalize_name(scenario_name);
    let info = scenario_gaps(scenario_path, cfg, &known_tiers);
    record(&mut gaps, &mut missing_tiers, root.clone(), info);

    let mut seen = BTreeSet::from([root]);
    for node in scenario_nodes(nodes) {
        if !seen.insert(node.name.clone()) {
            continue;
        }
        let Some(path) = node.path.as_deref() else {
            continue;
        };
        let child_cfg = match load_service_config(Path::new(path)) {
            Ok(child_cfg) => child_cfg,
            Err(e) => {
                debug!("Skipping gap analysis for {}: {}", node.name, e);
                continue;
            }
        };
        let info = scenario_gaps(Path::new(path), &child_cfg, &known_tiers);
        record(&mut gaps, &mut missing_tiers, node.name.clone(), info);
    }

    gaps.missing_tiers = missing_tiers.into_iter().collect();
    collect_resource_findings(nodes, &mut gaps);
    gaps.recommendations = recommendations(&gaps);
    gaps
}

/// Tiers named by aggregates or the root's own tier definitions.
fn known_tiers(cfg: &ServiceConfig, aggregates: &BTreeMap<String, TierAggregate>) -> BTreeSet<String> {
    let mut tiers: BTreeSet<String> = aggregates.keys().map(|t| normalize_name(t)).collect();
    if let Some(deployment) = &cfg.deployment {
        tiers.extend(deployment.tiers.keys().map(|t| normalize_name(t)));
    }
    if tiers.is_empty() {
        tiers.extend(DEFAULT_GAP_TIERS.iter().map(|t| t.to_string()));
    }
    tiers
}

/// Scenario nodes in pre-order, cycle markers included.
fn scenario_nodes(nodes: &[DependencyNode]) -> Vec<&DependencyNode> {
    let mut found = Vec::new();
    for root in nodes {
        root.walk(&mut |node| {
            if node.node_type == NodeType::Scenario {
                found.push(node);
            }
        });
    }
    found
}

fn scenario_gaps(
    scenario_path: &Path,
    cfg: &ServiceConfig,
    known_tiers: &BTreeSet<String>,
) -> ScenarioGapInfo {
    let mut info = ScenarioGapInfo {
        scenario_path: scenario_path.to_string_lossy().into_owned(),
        ..Default::default()
    };

    let Some(deployment) = &cfg.deployment else {
        info.suggested_actions.push(ACTION_ADD_DEPLOYMENT.to_string());
        return info;
    };
    info.has_deployment_block = true;

    if deployment.dependencies.is_empty() {
        info.missing_dependency_catalog = true;
        info.suggested_actions.push(ACTION_ADD_CATALOG.to_string());
    }

    let defined: BTreeSet<String> = deployment.tiers.keys().map(|t| normalize_name(t)).collect();
    info.missing_tier_definitions = known_tiers.difference(&defined).cloned().collect();
    if defined.is_empty() {
        info.suggested_actions.push(ACTION_DEFINE_TIERS.to_string());
    } else if !info.missing_tier_definitions.is_empty() {
        info.suggested_actions.push(format!(
            "Add tier definitions for: {}",
            info.missing_tier_definitions.join(", ")
        ));
    }

    let described_resources: BTreeSet<String> = deployment
        .dependencies
        .resources
        .keys()
        .map(|name| normalize_name(name))
        .collect();
    info.missing_resource_metadata = resolved_resource_map(cfg)
        .into_keys()
        .filter(|name| !described_resources.contains(name))
        .collect();
    if !info.missing_resource_metadata.is_empty() {
        info.suggested_actions.push(format!(
            "Add deployment metadata for resources: {}",
            info.missing_resource_metadata.join(", ")
        ));
    }

    let described_scenarios: BTreeSet<String> = deployment
        .dependencies
        .scenarios
        .keys()
        .map(|name| normalize_name(name))
        .collect();
    info.missing_scenario_metadata = declared_scenarios(cfg)
        .into_iter()
        .filter(|name| !described_scenarios.contains(name))
        .collect();
    if !info.missing_scenario_metadata.is_empty() {
        info.suggested_actions.push(format!(
            "Add deployment metadata for scenarios: {}",
            info.missing_scenario_metadata.join(", ")
        ));
    }

    info
}

/// Weighted gap count for one scenario.
pub fn gap_weight(info: &ScenarioGapInfo) -> usize {
    if !info.has_deployment_block {
        return MISSING_DEPLOYMENT_WEIGHT;
    }
    usize::from(info.missing_dependency_catalog)
        + info.missing_tier_definitions.len()
        + info.missing_resource_metadata.len()
        + info.missing_scenario_metadata.len()
}

fn record(
    gaps: &mut DeploymentMetadataGaps,
    missing_tiers: &mut BTreeSet<String>,
    name: String,
    info: ScenarioGapInfo,
) {
    gaps.total_gaps += gap_weight(&info);
    if !info.has_deployment_block {
        gaps.scenarios_missing_all += 1;
    }
    missing_tiers.extend(info.missing_tier_definitions.iter().cloned());
    gaps.gaps_by_scenario.insert(name, info);
}

/// Secrets and swaps for each distinct resource, in DAG walk order.
fn collect_resource_findings(nodes: &[DependencyNode], gaps: &mut DeploymentMetadataGaps) {
    let mut seen = BTreeSet::new();
    for root in nodes {
        root.walk(&mut |node| {
            if node.node_type != NodeType::Resource || !seen.insert(node.name.clone()) {
                return;
            }
            if let Some(secret) = classify_secret(&node.name) {
                gaps.secret_requirements.push(secret);
            }
            gaps.resource_swap_suggestions
                .extend(recommend_swaps(&node.name));
        });
    }
}

fn recommendations(gaps: &DeploymentMetadataGaps) -> Vec<String> {
    let mut out = Vec::new();

    if gaps.scenarios_missing_all > 0 {
        out.push(format!(
            "{} scenario(s) have no deployment block; add one to each .vrooli/service.json",
            gaps.scenarios_missing_all
        ));
    }
    if !gaps.missing_tiers.is_empty() {
        out.push(format!(
            "Define fitness for missing tiers: {}",
            gaps.missing_tiers.join(", ")
        ));
    }

    let missing_resources: usize = gaps
        .gaps_by_scenario
        .values()
        .map(|info| info.missing_resource_metadata.len())
        .sum();
    if missing_resources > 0 {
        out.push(format!(
            "Document deployment metadata for {missing_resources} resource dependencies"
        ));
    }
    let missing_scenarios: usize = gaps
        .gaps_by_scenario
        .values()
        .map(|info| info.missing_scenario_metadata.len())
        .sum();
    if missing_scenarios > 0 {
        out.push(format!(
            "Document deployment metadata for {missing_scenarios} scenario dependencies"
        ));
    }

    if !gaps.secret_requirements.is_empty() {
        out.push(format!(
            "Provision {} secret group(s) before deployment; see the referenced secrets playbooks",
            gaps.secret_requirements.len()
        ));
    }
    if !gaps.resource_swap_suggestions.is_empty() {
        out.push(format!(
            "Review {} resource swap suggestion(s) for constrained tiers",
            gaps.resource_swap_suggestions.len()
        ));
    }

    if gaps.total_gaps == 0 {
        out.push("Deployment metadata is complete".to_string());
    }
    out
}
