//! Expansion of declared dependencies into a tree of `DependencyNode`s.
//!
//! Scenario dependencies are expanded recursively. A scoped visited set keyed
//! on normalized names severs cycles: the second occurrence of a scenario on
//! a path becomes a leaf noted "cycle detected".

use crate::config::{
    declared_scenario_keys, load_service_config, lookup_normalized, normalize_name,
    resolved_resource_map, scenario_dir,
};
use crate::decisions::{classify_resource, decide_tier_fitness, interpret_tier_status};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use sda_report_schema::{
    DependencyNode, DeploymentDependency, DeploymentTier, NodeType, PlatformSupport,
    ServiceConfig, TierSupportSource, TierSupportSummary, NOTE_CYCLE_DETECTED, STANDARD_TIERS,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Expand the dependencies declared by `cfg`.
///
/// `visited` holds the normalized scenarios on the current path, including
/// the root; it is restored before returning.
pub fn build_dependency_nodes(
    scenarios_dir: &Path,
    scenario_name: &str,
    cfg: &ServiceConfig,
    visited: &mut BTreeSet<String>,
) -> Vec<DependencyNode> {
    let mut nodes = resource_nodes(cfg);
    nodes.extend(scenario_nodes(scenarios_dir, scenario_name, cfg, visited));
    sort_nodes(&mut nodes);
    nodes
}

/// Resources before scenarios, each alphabetical.
pub fn sort_nodes(nodes: &mut [DependencyNode]) {
    nodes.sort_by(|a, b| {
        a.node_type
            .cmp(&b.node_type)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn resource_nodes(cfg: &ServiceConfig) -> Vec<DependencyNode> {
    let catalog = cfg.deployment.as_ref().map(|d| &d.dependencies.resources);

    resolved_resource_map(cfg)
        .into_iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, decl)| {
            let mut node = DependencyNode::new(name.clone(), NodeType::Resource);
            node.resource_type = non_empty(&decl.resource_type);

            if let Some(meta) = catalog.and_then(|c| lookup_normalized(c, &name)) {
                if let Some(resource_type) = non_empty(&meta.resource_type) {
                    node.resource_type = Some(resource_type);
                }
                node.requirements = meta.footprint.clone();
                node.tier_support = declared_tier_support(&meta.platform_support);
                node.alternatives = metadata_alternatives(meta);
            }

            if node.tier_support.is_empty() {
                node.tier_support = inferred_tier_support(&name);
            }
            node
        })
        .collect()
}

fn scenario_nodes(
    scenarios_dir: &Path,
    parent_name: &str,
    cfg: &ServiceConfig,
    visited: &mut BTreeSet<String>,
) -> Vec<DependencyNode> {
    let catalog = cfg.deployment.as_ref().map(|d| &d.dependencies.scenarios);
    let mut nodes = Vec::new();

    for (name, declared_as) in declared_scenario_keys(cfg) {
        let meta = catalog.and_then(|c| lookup_normalized(c, &name));
        let fallback = ParentMetadata::from(meta);
        let path = scenario_dir(scenarios_dir, &declared_as);

        let mut node = DependencyNode::new(name.clone(), NodeType::Scenario);
        node.path = Some(path.to_string_lossy().into_owned());

        if visited.contains(&name) {
            warn!("Cycle detected: {} -> {}", parent_name, name);
            node.notes = Some(NOTE_CYCLE_DETECTED.to_string());
            fallback.apply(&mut node);
            nodes.push(node);
            continue;
        }

        visited.insert(name.clone());
        match load_service_config(&path) {
            Ok(child_cfg) => {
                let deployment = child_cfg.deployment.as_ref();
                node.requirements = deployment
                    .and_then(|d| d.aggregate_requirements.clone())
                    .or_else(|| fallback.requirements.clone());
                node.tier_support = fallback.tier_support.clone();
                if let Some(deployment) = deployment {
                    overlay_tier_status(&mut node.tier_support, &deployment.tiers);
                }
                node.alternatives = sorted_unique(
                    fallback.alternatives.iter().cloned().chain(
                        deployment
                            .into_iter()
                            .flat_map(|d| d.tiers.values())
                            .flat_map(|tier| tier.adaptations.iter())
                            .map(|adaptation| adaptation.swap.clone()),
                    ),
                );
                node.children = build_dependency_nodes(scenarios_dir, &name, &child_cfg, visited);
            }
            Err(e) => {
                warn!("Unable to load scenario {}: {}", name, e);
                node.notes = Some(format!("unable to load scenario: {e}"));
                fallback.apply(&mut node);
            }
        }
        visited.remove(&name);
        nodes.push(node);
    }
    nodes
}

/// What a parent's deployment catalog says about one scenario dependency.
#[derive(Default)]
struct ParentMetadata {
    requirements: Option<Value>,
    tier_support: BTreeMap<String, TierSupportSummary>,
    alternatives: Vec<String>,
}

impl From<Option<&DeploymentDependency>> for ParentMetadata {
    fn from(meta: Option<&DeploymentDependency>) -> Self {
        match meta {
            Some(meta) => Self {
                requirements: meta.footprint.clone(),
                tier_support: declared_tier_support(&meta.platform_support),
                alternatives: metadata_alternatives(meta),
            },
            None => Self::default(),
        }
    }
}

impl ParentMetadata {
    fn apply(&self, node: &mut DependencyNode) {
        node.requirements = self.requirements.clone();
        node.tier_support = self.tier_support.clone();
        node.alternatives = self.alternatives.clone();
    }
}

fn declared_tier_support(
    platform_support: &BTreeMap<String, PlatformSupport>,
) -> BTreeMap<String, TierSupportSummary> {
    platform_support
        .iter()
        .map(|(tier, support)| {
            let mut summary = TierSupportSummary::new(TierSupportSource::Declared);
            summary.supported = support.supported;
            summary.fitness_score = support.fitness_score;
            summary.reason = non_empty(&support.reason);
            summary.notes = non_empty(&support.notes);
            summary.requirements = support.requirements.clone();
            summary.alternatives = sorted_unique(support.alternatives.iter().cloned());
            (normalize_name(tier), summary)
        })
        .collect()
}

fn inferred_tier_support(resource: &str) -> BTreeMap<String, TierSupportSummary> {
    let classification = classify_resource(resource);
    STANDARD_TIERS
        .iter()
        .map(|tier| (tier.to_string(), decide_tier_fitness(tier, classification)))
        .collect()
}

/// Layer a scenario's own `deployment.tiers` over inherited support.
/// Fields present in the tier definition win.
fn overlay_tier_status(
    tier_support: &mut BTreeMap<String, TierSupportSummary>,
    tiers: &BTreeMap<String, DeploymentTier>,
) {
    for (tier, definition) in tiers {
        let entry = tier_support
            .entry(normalize_name(tier))
            .or_insert_with(|| TierSupportSummary::new(TierSupportSource::TierStatus));
        entry.source = TierSupportSource::TierStatus;

        if let Some(supported) = interpret_tier_status(&definition.status).supported() {
            entry.supported = Some(supported);
        }
        if definition.fitness_score.is_some() {
            entry.fitness_score = definition.fitness_score;
        }
        if let Some(notes) = non_empty(&definition.notes) {
            entry.notes = Some(notes);
        }
        if definition.requirements.is_some() {
            entry.requirements = definition.requirements.clone();
        }
    }
}

/// `swappable_with` ids plus every per-tier alternative.
fn metadata_alternatives(meta: &DeploymentDependency) -> Vec<String> {
    sorted_unique(
        meta.swappable_with
            .iter()
            .map(|swap| swap.id.clone())
            .chain(
                meta.platform_support
                    .values()
                    .flat_map(|support| support.alternatives.iter().cloned()),
            ),
    )
}

fn sorted_unique(names: impl IntoIterator<Item = String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| normalize_name(&name))
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Whether the scenario edges reachable from `root`, including the edges
/// that were severed at cycle markers, form a cycle.
pub fn scenario_graph_has_cycle(root: &str, nodes: &[DependencyNode]) -> bool {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();
    let root = normalize_name(root);

    fn node_index(
        graph: &mut DiGraph<String, ()>,
        index: &mut HashMap<String, NodeIndex>,
        name: &str,
    ) -> NodeIndex {
        *index
            .entry(name.to_string())
            .or_insert_with(|| graph.add_node(name.to_string()))
    }

    fn add_edges(
        graph: &mut DiGraph<String, ()>,
        index: &mut HashMap<String, NodeIndex>,
        parent: &str,
        nodes: &[DependencyNode],
    ) {
        let from = node_index(graph, index, parent);
        for node in nodes.iter().filter(|n| n.node_type == NodeType::Scenario) {
            let to = node_index(graph, index, &node.name);
            if graph.find_edge(from, to).is_none() {
                graph.add_edge(from, to, ());
            }
            add_edges(graph, index, &node.name, &node.children);
        }
    }

    add_edges(&mut graph, &mut index, &root, nodes);
    let cyclic = toposort(&graph, None).is_err();
    if cyclic {
        debug!("Scenario graph rooted at {} contains a cycle", root);
    }
    cyclic
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn scenarios(defs: &[(&str, Value)]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("scenarios");
        for (name, cfg) in defs {
            let vrooli = root.join(name).join(".vrooli");
            std::fs::create_dir_all(&vrooli).unwrap();
            std::fs::write(vrooli.join("service.json"), cfg.to_string()).unwrap();
        }
        (dir, root)
    }

    fn cfg(value: Value) -> ServiceConfig {
        serde_json::from_value(value).unwrap()
    }

    fn build(root: &Path, name: &str, cfg: &ServiceConfig) -> Vec<DependencyNode> {
        let mut visited = BTreeSet::from([normalize_name(name)]);
        let nodes = build_dependency_nodes(root, name, cfg, &mut visited);
        assert_eq!(visited, BTreeSet::from([normalize_name(name)]));
        nodes
    }

    #[test]
    fn test_resource_without_metadata_is_inferred() {
        let (_dir, root) = scenarios(&[]);
        let cfg = cfg(json!({"dependencies": {"resources": {"postgres": {"type": "database", "required": true}}}}));
        let nodes = build(&root, "svc-a", &cfg);

        assert_eq!(nodes.len(), 1);
        let pg = &nodes[0];
        assert_eq!(pg.name, "postgres");
        assert_eq!(pg.resource_type.as_deref(), Some("database"));
        assert_eq!(pg.source, "declared");
        assert_eq!(pg.tier_support.len(), 6);
        assert_eq!(pg.tier_support["desktop"].fitness_score, Some(0.6));
        assert_eq!(pg.tier_support["mobile"].supported, Some(false));
        assert_eq!(pg.tier_support["mobile"].source, TierSupportSource::Inferred);
        assert!(pg.alternatives.is_empty());
    }

    #[test]
    fn test_resource_metadata_is_declared() {
        let (_dir, root) = scenarios(&[]);
        let cfg = cfg(json!({
            "dependencies": {"resources": {"Ollama": {"type": "ai"}}},
            "deployment": {"dependencies": {"resources": {"ollama": {
                "resource_type": "llm",
                "footprint": {"ram_mb": 8192},
                "platform_support": {
                    "Desktop": {"supported": true, "fitness_score": 0.5, "alternatives": ["OpenRouter"]}
                },
                "swappable_with": [{"id": "anthropic"}, {"id": "openrouter"}]
            }}}}
        }));
        let nodes = build(&root, "svc-a", &cfg);
        let ollama = &nodes[0];

        assert_eq!(ollama.name, "ollama");
        assert_eq!(ollama.resource_type.as_deref(), Some("llm"));
        assert_eq!(ollama.requirements, Some(json!({"ram_mb": 8192})));
        assert_eq!(ollama.tier_support.keys().collect::<Vec<_>>(), vec!["desktop"]);
        assert_eq!(ollama.tier_support["desktop"].source, TierSupportSource::Declared);
        assert_eq!(ollama.alternatives, vec!["anthropic", "openrouter"]);
    }

    #[test]
    fn test_mutual_recursion_is_severed() {
        let (_dir, root) = scenarios(&[
            ("svc-a", json!({"dependencies": {"scenarios": {"svc-b": {}}}})),
            ("svc-b", json!({"dependencies": {"scenarios": {"svc-a": {}}}})),
        ]);
        let cfg_a = cfg(json!({"dependencies": {"scenarios": {"svc-b": {}}}}));
        let nodes = build(&root, "svc-a", &cfg_a);

        assert_eq!(nodes.len(), 1);
        let b = &nodes[0];
        assert_eq!(b.name, "svc-b");
        assert!(b.notes.is_none());
        assert_eq!(b.children.len(), 1);
        let a = &b.children[0];
        assert_eq!(a.name, "svc-a");
        assert!(a.is_cycle_marker());
        assert!(a.children.is_empty());

        assert!(scenario_graph_has_cycle("svc-a", &nodes));
    }

    #[test]
    fn test_self_loop_is_severed() {
        let (_dir, root) = scenarios(&[]);
        let cfg = cfg(json!({"dependencies": {"scenarios": {"SVC-A": {}}}}));
        let nodes = build(&root, "svc-a", &cfg);
        assert!(nodes[0].is_cycle_marker());
        assert!(scenario_graph_has_cycle("svc-a", &nodes));
    }

    #[test]
    fn test_mixed_case_scenario_directory_loads() {
        let (_dir, root) = scenarios(&[(
            "Auth-Service",
            json!({"dependencies": {"resources": {"redis": {"type": "cache"}}}}),
        )]);
        let cfg = cfg(json!({"dependencies": {"scenarios": {"Auth-Service": {}}}}));
        let nodes = build(&root, "svc-a", &cfg);

        let auth = &nodes[0];
        assert_eq!(auth.name, "auth-service");
        assert!(auth.notes.is_none());
        assert_eq!(auth.path.as_deref(), Some(root.join("Auth-Service").to_string_lossy().as_ref()));
        assert_eq!(auth.children[0].name, "redis");
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let (_dir, root) = scenarios(&[
            ("svc-b", json!({"dependencies": {"scenarios": {"svc-d": {}}}})),
            ("svc-c", json!({"dependencies": {"scenarios": {"svc-d": {}}}})),
            ("svc-d", json!({})),
        ]);
        let cfg = cfg(json!({"dependencies": {"scenarios": {"svc-c": {}, "svc-b": {}}}}));
        let nodes = build(&root, "svc-a", &cfg);

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["svc-b", "svc-c"]);
        assert!(nodes.iter().all(|n| n.children[0].name == "svc-d" && n.children[0].notes.is_none()));
        assert!(!scenario_graph_has_cycle("svc-a", &nodes));
    }

    #[test]
    fn test_unloadable_scenario_uses_parent_metadata() {
        let (_dir, root) = scenarios(&[]);
        let cfg = cfg(json!({
            "dependencies": {"scenarios": {"ghost": {}}},
            "deployment": {"dependencies": {"scenarios": {"ghost": {
                "footprint": {"cpu": 1},
                "platform_support": {"server": {"supported": true, "fitness_score": 0.9}},
                "swappable_with": [{"id": "phantom"}]
            }}}}
        }));
        let nodes = build(&root, "svc-a", &cfg);
        let ghost = &nodes[0];

        assert!(ghost
            .notes
            .as_deref()
            .unwrap()
            .starts_with("unable to load scenario: "));
        assert_eq!(ghost.requirements, Some(json!({"cpu": 1})));
        assert_eq!(ghost.tier_support["server"].fitness_score, Some(0.9));
        assert_eq!(ghost.alternatives, vec!["phantom"]);
        assert!(ghost.children.is_empty());
    }

    #[test]
    fn test_tier_status_overrides_parent_support() {
        let (_dir, root) = scenarios(&[(
            "svc-b",
            json!({
                "deployment": {
                    "aggregate_requirements": {"ram_mb": 512},
                    "tiers": {
                        "desktop": {"status": "limited", "fitness_score": 0.4, "adaptations": [{"swap": "sqlite"}]},
                        "server": {"status": "ready"}
                    }
                }
            }),
        )]);
        let cfg = cfg(json!({
            "dependencies": {"scenarios": {"svc-b": {}}},
            "deployment": {"dependencies": {"scenarios": {"svc-b": {
                "footprint": {"ram_mb": 64},
                "platform_support": {
                    "desktop": {"supported": true, "fitness_score": 0.9},
                    "mobile": {"supported": false, "fitness_score": 0.1}
                },
                "swappable_with": [{"id": "svc-c"}]
            }}}}
        }));
        let nodes = build(&root, "svc-a", &cfg);
        let b = &nodes[0];

        assert_eq!(b.requirements, Some(json!({"ram_mb": 512})));
        let desktop = &b.tier_support["desktop"];
        assert_eq!(desktop.supported, Some(false));
        assert_eq!(desktop.fitness_score, Some(0.4));
        assert_eq!(desktop.source, TierSupportSource::TierStatus);
        assert_eq!(b.tier_support["server"].supported, Some(true));
        assert_eq!(b.tier_support["server"].fitness_score, None);
        assert_eq!(b.tier_support["mobile"].source, TierSupportSource::Declared);
        assert_eq!(b.alternatives, vec!["sqlite", "svc-c"]);
    }

    #[test]
    fn test_nodes_sorted_resources_first() {
        let (_dir, root) = scenarios(&[("alpha", json!({}))]);
        let cfg = cfg(json!({
            "dependencies": {
                "resources": {"redis": {}, "postgres": {}},
                "scenarios": {"alpha": {}}
            }
        }));
        let nodes = build(&root, "svc-a", &cfg);
        let keys: Vec<String> = nodes.iter().map(|n| n.key()).collect();
        assert_eq!(keys, vec!["resource:postgres", "resource:redis", "scenario:alpha"]);
    }
}
