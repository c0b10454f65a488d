//! Regex patterns for detecting resource and scenario references.

use regex::Regex;
use std::sync::LazyLock;

/// `resource-<name>` CLI invocation.
pub static RESOURCE_COMMAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"resource-([a-z0-9-]+)").unwrap());

/// `vrooli scenario <verb> <name>`.
pub static VROOLI_SCENARIO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"vrooli\s+scenario\s+(run|test|status|start|stop)\s+([a-z0-9-]+)").unwrap()
});

/// `<name>-cli` or `<name>-api`, optionally with `.sh`.
pub static CLI_SCENARIO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9-]+)-(cli|api)(?:\.sh)?").unwrap());

/// `resolveScenarioPortViaCLI(ctx, "name", ...)` or with an identifier.
pub static SCENARIO_PORT_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"resolveScenarioPortViaCLI\s*\(\s*[^,]+,\s*(?:"([a-z0-9-]+)"|([A-Za-z0-9_]+))\s*,"#,
    )
    .unwrap()
});

/// `const NAME = "literal"` / `var NAME string = "literal"`.
pub static ALIAS_DECLARATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:const|var)\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:string\s*)?=\s*"([a-z0-9-]+)""#)
        .unwrap()
});

/// `name := "literal"`.
pub static ALIAS_SHORT_ASSIGN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*:=\s*"([a-z0-9-]+)""#).unwrap()
});

/// A line inside a `const ( ... )` / `var ( ... )` block.
pub static ALIAS_BLOCK_ASSIGN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:string\s*)?=\s*"([a-z0-9-]+)"\s*$"#)
        .unwrap()
});

/// Shared workflow definitions under `initialization/`.
pub static SHARED_WORKFLOW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"initialization/(?:automation/)?(?:n8n|huginn|windmill)/([^/]+\.json)").unwrap()
});

/// All alias patterns, in match order.
pub fn alias_patterns() -> [&'static Regex; 3] {
    [
        &ALIAS_DECLARATION_PATTERN,
        &ALIAS_SHORT_ASSIGN_PATTERN,
        &ALIAS_BLOCK_ASSIGN_PATTERN,
    ]
}

/// A set of regexes that together indicate use of one resource.
#[derive(Debug)]
pub struct ResourceHeuristic {
    /// Canonical resource name.
    pub name: &'static str,
    pub patterns: Vec<Regex>,
}

impl ResourceHeuristic {
    fn new(name: &'static str, patterns: &[&str]) -> Self {
        Self {
            name,
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }
    }

    /// First pattern that matches `content`.
    pub fn first_match(&self, content: &str) -> Option<&Regex> {
        self.patterns.iter().find(|p| p.is_match(content))
    }
}

/// Heuristics in evaluation order.
pub static RESOURCE_HEURISTICS: LazyLock<Vec<ResourceHeuristic>> = LazyLock::new(|| {
    vec![
        ResourceHeuristic::new(
            "postgres",
            &[
                r"postgres(?:ql)?://",
                r"PGHOST|POSTGRES_HOST|POSTGRES_URL",
                r"github\.com/(?:lib/pq|jackc/pgx)",
            ],
        ),
        ResourceHeuristic::new(
            "redis",
            &[
                r"redis://",
                r"REDIS_(?:HOST|URL|ADDR|PORT)",
                r"redis\.(?:NewClient|createClient)|go-redis|ioredis",
            ],
        ),
        ResourceHeuristic::new(
            "ollama",
            &[
                r"OLLAMA_(?:HOST|URL|API|BASE_URL)",
                r"ollama(?:\.|\s+)(?:generate|embeddings|list|pull|push)",
            ],
        ),
        ResourceHeuristic::new(
            "qdrant",
            &[
                r"QDRANT_(?:HOST|URL|API_KEY)",
                r"QdrantClient|qdrant[_-]client",
                r"https?://(?:localhost|127\.0\.0\.1|qdrant):6333",
            ],
        ),
        ResourceHeuristic::new(
            "n8n",
            &[
                r"N8N_(?:HOST|URL|BASE_URL|API_KEY|WEBHOOK_URL)",
                r"https?://(?:localhost|127\.0\.0\.1|n8n):5678",
            ],
        ),
        ResourceHeuristic::new(
            "minio",
            &[
                r"MINIO_(?:ENDPOINT|URL|ACCESS_KEY|SECRET_KEY|ROOT_USER)",
                r"minio\.New\(|new Minio\.Client|minio-go",
                r"https?://(?:localhost|127\.0\.0\.1|minio):9000",
            ],
        ),
    ]
});
