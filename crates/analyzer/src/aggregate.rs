//! Per-tier rollups over a dependency tree.

use crate::decisions::is_tier_blocker;
use sda_report_schema::{DependencyNode, TierAggregate};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct Accumulator {
    count: usize,
    scores: Vec<f64>,
    blockers: BTreeSet<String>,
}

/// Aggregate every tier referenced anywhere in `nodes`, children included.
pub fn compute_aggregates(nodes: &[DependencyNode]) -> BTreeMap<String, TierAggregate> {
    let mut tiers: BTreeMap<String, Accumulator> = BTreeMap::new();

    for root in nodes {
        root.walk(&mut |node| {
            for (tier, support) in &node.tier_support {
                let acc = tiers.entry(tier.clone()).or_default();
                acc.count += 1;
                if let Some(score) = support.fitness_score {
                    acc.scores.push(score);
                }
                if is_tier_blocker(support) {
                    acc.blockers.insert(node.name.clone());
                }
            }
        });
    }

    tiers
        .into_iter()
        .map(|(tier, acc)| {
            let fitness_score = if acc.scores.is_empty() {
                0.0
            } else {
                acc.scores.iter().sum::<f64>() / acc.scores.len() as f64
            };
            let aggregate = TierAggregate {
                dependency_count: acc.count,
                fitness_score,
                blocking_dependencies: acc.blockers.into_iter().collect(),
            };
            (tier, aggregate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sda_report_schema::{NodeType, TierSupportSource, TierSupportSummary};

    fn support(supported: Option<bool>, score: Option<f64>) -> TierSupportSummary {
        let mut s = TierSupportSummary::new(TierSupportSource::Declared);
        s.supported = supported;
        s.fitness_score = score;
        s
    }

    #[test]
    fn test_empty_tree_has_no_aggregates() {
        assert!(compute_aggregates(&[]).is_empty());
    }

    #[test]
    fn test_mean_skips_missing_scores_but_counts_nodes() {
        let mut pg = DependencyNode::new("postgres", NodeType::Resource);
        pg.tier_support.insert("desktop".into(), support(Some(true), Some(0.6)));
        pg.tier_support.insert("server".into(), support(Some(true), Some(0.95)));

        let mut svc = DependencyNode::new("svc-b", NodeType::Scenario);
        svc.tier_support.insert("desktop".into(), support(None, None));
        let mut redis = DependencyNode::new("redis", NodeType::Resource);
        redis.tier_support.insert("desktop".into(), support(Some(true), Some(0.9)));
        svc.children.push(redis);

        let aggregates = compute_aggregates(&[pg, svc]);
        let desktop = &aggregates["desktop"];
        assert_eq!(desktop.dependency_count, 3);
        assert!((desktop.fitness_score - 0.75).abs() < 1e-9);
        assert_eq!(desktop.blocking_dependencies, vec!["postgres"]);

        let server = &aggregates["server"];
        assert_eq!(server.dependency_count, 1);
        assert!(server.blocking_dependencies.is_empty());
    }

    #[test]
    fn test_blockers_are_sorted_and_unique() {
        let mut zed = DependencyNode::new("zed", NodeType::Scenario);
        zed.tier_support.insert("mobile".into(), support(Some(false), None));
        let mut again = DependencyNode::new("zed", NodeType::Scenario);
        again.tier_support.insert("mobile".into(), support(Some(true), Some(0.2)));
        let mut alpha = DependencyNode::new("alpha", NodeType::Resource);
        alpha.tier_support.insert("mobile".into(), support(Some(true), Some(0.1)));
        zed.children.push(again);

        let aggregates = compute_aggregates(&[alpha, zed]);
        assert_eq!(aggregates["mobile"].blocking_dependencies, vec!["alpha", "zed"]);
        assert_eq!(aggregates["mobile"].dependency_count, 3);
        assert!((aggregates["mobile"].fitness_score - 0.15).abs() < 1e-9);
    }
}
