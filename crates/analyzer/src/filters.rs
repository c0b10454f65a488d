//! Path predicates shared by the scanners.

use std::path::Path;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    "logs",
    "tmp",
    "vendor",
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".cache",
    ".next",
    ".nuxt",
    ".svelte-kit",
    ".vercel",
    ".parcel-cache",
    ".turbo",
];

/// Path segments that mark documentation, fixtures or generated output.
const IGNORED_SEGMENTS: &[&str] = &[
    "docs",
    "doc",
    "documentation",
    "readme",
    "test",
    "tests",
    "testdata",
    "__tests__",
    "spec",
    "specs",
    "coverage",
    "examples",
    "playbooks",
    "data",
    "draft",
    "drafts",
    "prd-drafts",
    "dist",
    "build",
    "out",
    "outputs",
];

const IGNORED_EXTENSIONS: &[&str] = &["md", "mdx", "rst", "txt"];

/// Top-level directories where a `resource-<name>` token counts.
const RESOURCE_CLI_DIRS: &[&str] = &[
    "api",
    "cli",
    "cmd",
    "scripts",
    "script",
    "ui",
    "src",
    "server",
    "service",
    "services",
    "lib",
    "pkg",
    "internal",
    "tools",
    "initialization",
    "automation",
    "test",
    "tests",
    "integration",
    "config",
];

/// Extensions scanned for resource references.
pub const RESOURCE_EXTENSIONS: &[&str] = &[
    "go", "js", "ts", "tsx", "sh", "py", "md", "json", "yml", "yaml",
];

/// Extensions scanned for scenario references.
pub const SCENARIO_EXTENSIONS: &[&str] = &["go", "js", "sh", "py", "md"];

/// Whether a (non-root) directory should be pruned from a walk.
pub fn should_skip_dir(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower == ".vrooli" {
        return false;
    }
    if lower.starts_with('.') || SKIP_DIRS.contains(&lower.as_str()) {
        return true;
    }
    lower.starts_with("node_modules") || lower.starts_with(".ignored")
}

/// Whether a file should be left out of detection.
///
/// `rel_path` is POSIX-style and relative to the scenario root.
pub fn should_ignore_file(rel_path: &str) -> bool {
    let lower = rel_path.to_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if basename.starts_with("readme")
        || basename == "prd.md"
        || basename == "problems.md"
        || basename.starts_with("requirements.md")
    {
        return true;
    }

    if let Some(ext) = Path::new(basename).extension().and_then(|e| e.to_str()) {
        if IGNORED_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    lower
        .split('/')
        .any(|segment| IGNORED_SEGMENTS.contains(&segment))
}

/// Whether a `resource-<name>` token in `rel_path` may count as usage.
pub fn is_resource_cli_path_allowed(rel_path: &str) -> bool {
    let mut segments = rel_path.split('/').filter(|s| !s.is_empty());
    let first = segments.next();
    match (first, segments.next()) {
        // File at the scenario root.
        (Some(_), None) | (None, _) => true,
        (Some(top), Some(_)) => RESOURCE_CLI_DIRS.contains(&top.to_lowercase().as_str()),
    }
}

/// Whether `path` has one of `extensions` (case-insensitive, without dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_dir() {
        assert!(should_skip_dir("node_modules"));
        assert!(should_skip_dir("node_modules.bak"));
        assert!(should_skip_dir(".git"));
        assert!(should_skip_dir(".svelte-kit"));
        assert!(should_skip_dir(".ignored-stuff"));
        assert!(should_skip_dir(".hidden"));
        assert!(should_skip_dir("__pycache__"));
        assert!(!should_skip_dir(".vrooli"));
        assert!(!should_skip_dir("api"));
        assert!(!should_skip_dir("initialization"));
    }

    #[test]
    fn test_should_ignore_documentation() {
        assert!(should_ignore_file("README.md"));
        assert!(should_ignore_file("readme"));
        assert!(should_ignore_file("PRD.md"));
        assert!(should_ignore_file("requirements.md.bak"));
        assert!(should_ignore_file("notes.txt"));
        assert!(should_ignore_file("guide.rst"));
        assert!(should_ignore_file("docs/example.go"));
        assert!(should_ignore_file("api/tests/handler_test.go"));
        assert!(should_ignore_file("ui/drafts/idea.js"));
        assert!(should_ignore_file("initialization/data/seed.json"));
    }

    #[test]
    fn test_should_keep_source_files() {
        assert!(!should_ignore_file("api/main.go"));
        assert!(!should_ignore_file("cli/install.sh"));
        assert!(!should_ignore_file("ui/src/app.tsx"));
        assert!(!should_ignore_file("initialization/n8n/flow.json"));
    }

    #[test]
    fn test_resource_cli_allow_list() {
        assert!(is_resource_cli_path_allowed("api/main.go"));
        assert!(is_resource_cli_path_allowed("scripts/setup.sh"));
        assert!(is_resource_cli_path_allowed("initialization/postgres/seed.sh"));
        assert!(is_resource_cli_path_allowed("Makefile.sh"));
        assert!(!is_resource_cli_path_allowed("misc/notes.sh"));
        assert!(!is_resource_cli_path_allowed("deploy/run.sh"));
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("api/main.go"), SCENARIO_EXTENSIONS));
        assert!(has_extension(Path::new("ui/App.TSX"), RESOURCE_EXTENSIONS));
        assert!(!has_extension(Path::new("ui/App.tsx"), SCENARIO_EXTENSIONS));
        assert!(!has_extension(Path::new("Makefile"), RESOURCE_EXTENSIONS));
    }
}
