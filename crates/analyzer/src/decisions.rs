//! Deployment decision tables.
//!
//! Every function here is pure and total: the same name or tier always
//! yields the same answer, and unknown inputs fall through to a documented
//! default.

use crate::config::normalize_name;
use sda_report_schema::{
    ResourceSwapSuggestion, SecretRequirement, TierSupportSource, TierSupportSummary,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fitness below this marks a dependency as a tier blocker.
pub const BLOCKER_FITNESS_THRESHOLD: f64 = 0.75;

/// Broad class of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Database,
    Ai,
    Automation,
    Storage,
    Browser,
    Execution,
    Service,
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceClass::Database => "database",
            ResourceClass::Ai => "ai",
            ResourceClass::Automation => "automation",
            ResourceClass::Storage => "storage",
            ResourceClass::Browser => "browser",
            ResourceClass::Execution => "execution",
            ResourceClass::Service => "service",
        };
        f.write_str(s)
    }
}

/// Class plus whether the resource is heavy to run locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceClassification {
    pub class: ResourceClass,
    pub heavy: bool,
}

impl ResourceClassification {
    fn is_data_store(&self) -> bool {
        matches!(self.class, ResourceClass::Database | ResourceClass::Storage)
    }

    fn is_heavy_ai(&self) -> bool {
        self.class == ResourceClass::Ai && self.heavy
    }
}

/// Classify a resource by name.
pub fn classify_resource(name: &str) -> ResourceClassification {
    let (class, heavy) = match normalize_name(name).as_str() {
        "postgres" | "mysql" | "mongodb" => (ResourceClass::Database, true),
        "redis" | "qdrant" => (ResourceClass::Database, false),
        "ollama" => (ResourceClass::Ai, true),
        "claude-code" | "openai" | "anthropic" => (ResourceClass::Ai, false),
        "n8n" | "huginn" | "windmill" => (ResourceClass::Automation, true),
        "minio" | "s3" => (ResourceClass::Storage, false),
        "browserless" | "playwright" => (ResourceClass::Browser, true),
        "judge0" | "sandbox" => (ResourceClass::Execution, true),
        _ => (ResourceClass::Service, false),
    };
    ResourceClassification { class, heavy }
}

/// Default support of a resource class on a tier.
pub fn decide_tier_fitness(tier: &str, classification: ResourceClassification) -> TierSupportSummary {
    let mut summary = TierSupportSummary::new(TierSupportSource::Inferred);
    let (supported, score) = match normalize_name(tier).as_str() {
        "local" => (true, 1.0),
        "desktop" => (true, if classification.heavy { 0.6 } else { 0.9 }),
        "server" => (true, 0.95),
        "mobile" => {
            if classification.is_heavy_ai() {
                summary.reason = Some("Resource-intensive AI not supported on mobile".to_string());
                (false, 0.0)
            } else if classification.is_data_store() {
                summary.reason = Some("Database should be remote for mobile deployments".to_string());
                summary.alternatives = vec!["saas-variant".to_string(), "cloud-variant".to_string()];
                (false, 0.2)
            } else if classification.heavy {
                summary.reason = Some("Heavy operations not suitable for mobile".to_string());
                (false, 0.1)
            } else {
                (true, 0.4)
            }
        }
        "saas" => {
            if classification.is_data_store() {
                (true, 0.95)
            } else if classification.is_heavy_ai() {
                summary.alternatives = vec![
                    "openai".to_string(),
                    "anthropic".to_string(),
                    "openrouter".to_string(),
                ];
                summary.notes = Some("Consider using managed AI API for SaaS deployment".to_string());
                (true, 0.3)
            } else {
                (true, 0.85)
            }
        }
        "enterprise" => (true, 0.98),
        _ => {
            summary.notes = Some("Unknown tier - using default fitness".to_string());
            (true, 0.7)
        }
    };
    summary.supported = Some(supported);
    summary.fitness_score = Some(score);
    summary
}

/// Whether `support` prevents a clean deployment to its tier.
pub fn is_tier_blocker(support: &TierSupportSummary) -> bool {
    support.supported == Some(false)
        || support
            .fitness_score
            .map(|score| score < BLOCKER_FITNESS_THRESHOLD)
            .unwrap_or(false)
}

/// Interpreted `deployment.tiers.<tier>.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierStatus {
    Ready,
    Limited,
    Unknown,
}

impl TierStatus {
    /// Tri-state `supported` flag for this status.
    pub fn supported(&self) -> Option<bool> {
        match self {
            TierStatus::Ready => Some(true),
            TierStatus::Limited => Some(false),
            TierStatus::Unknown => None,
        }
    }
}

/// Interpret a tier status string.
///
/// Matching is case-sensitive unless the `case-insensitive-tier-status`
/// feature is enabled.
pub fn interpret_tier_status(status: &str) -> TierStatus {
    #[cfg(feature = "case-insensitive-tier-status")]
    let status = status.to_lowercase();
    #[cfg(feature = "case-insensitive-tier-status")]
    let status = status.as_str();

    match status {
        "ready" | "supported" => TierStatus::Ready,
        "limited" | "blocked" => TierStatus::Limited,
        _ => TierStatus::Unknown,
    }
}

/// Secrets a resource needs, if any.
pub fn classify_secret(resource: &str) -> Option<SecretRequirement> {
    let name = normalize_name(resource);
    let (secret_type, secrets): (&str, Vec<String>) = match name.as_str() {
        "postgres" | "mysql" | "mongodb" => (
            "database_credentials",
            vec![format!("{name}_password"), format!("{name}_user")],
        ),
        "redis" => ("cache_credentials", vec!["redis_password".to_string()]),
        "minio" | "s3" => (
            "object_storage_credentials",
            vec![format!("{name}_access_key"), format!("{name}_secret_key")],
        ),
        "n8n" | "huginn" | "windmill" => (
            "automation_credentials",
            vec![format!("{name}_api_key"), format!("{name}_webhook_secret")],
        ),
        "claude-code" | "anthropic" | "openai" => ("ai_api_key", vec![format!("{name}_api_key")]),
        "qdrant" => ("vector_db_credentials", vec!["qdrant_api_key".to_string()]),
        "browserless" | "playwright" => ("browser_automation_token", vec![format!("{name}_token")]),
        _ => return None,
    };

    Some(SecretRequirement {
        dependency_name: name.clone(),
        dependency_type: "resource".to_string(),
        secret_type: secret_type.to_string(),
        required_secrets: secrets,
        playbook_reference: format!("secrets/{secret_type}"),
        priority: "required".to_string(),
    })
}

/// Recommended replacements for a resource.
pub fn recommend_swaps(resource: &str) -> Vec<ResourceSwapSuggestion> {
    let name = normalize_name(resource);
    let table: &[(&str, &[&str], &str, &str)] = match name.as_str() {
        "ollama" => &[
            (
                "openrouter",
                &["mobile", "saas"],
                "Hosted model routing removes the local GPU/RAM footprint",
                "Requires network access and an API key; per-token cost",
            ),
            (
                "anthropic",
                &["saas", "enterprise"],
                "Managed model API suited to multi-tenant deployments",
                "Requires an API key; prompts leave the host",
            ),
        ],
        "postgres" => &[(
            "supabase",
            &["mobile", "saas"],
            "Managed Postgres keeps the database off constrained devices",
            "Connection string and credentials move to a hosted project",
        )],
        "minio" => &[(
            "s3",
            &["saas", "enterprise"],
            "Managed object storage with the same API surface",
            "Bucket credentials and endpoint change; egress is billed",
        )],
        "redis" => &[(
            "in-memory-cache",
            &["desktop"],
            "An embedded cache avoids shipping a Redis daemon",
            "Cache is per-process and lost on restart",
        )],
        _ => &[],
    };

    table
        .iter()
        .map(|(alternative, tiers, reason, impact)| ResourceSwapSuggestion {
            original_resource: name.clone(),
            alternative_resource: alternative.to_string(),
            reason: reason.to_string(),
            applicable_tiers: tiers.iter().map(|t| t.to_string()).collect(),
            relationship: "alternative".to_string(),
            impact_description: impact.to_string(),
        })
        .collect()
}
