//! Analyzer configuration.

use crate::config::scenario_dir;
use sda_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the scenarios root.
pub const SCENARIOS_DIR_ENV: &str = "SDA_SCENARIOS_DIR";
/// Environment variable naming the resources root.
pub const RESOURCES_DIR_ENV: &str = "SDA_RESOURCES_DIR";

/// Where the analyzer finds scenarios and resources on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// `<repo>/scenarios`, absolute.
    pub scenarios_root: PathBuf,
    /// `<repo>/resources`, absolute.
    pub resources_root: PathBuf,
}

impl AnalyzerConfig {
    /// Resolve roots, filling empty values with defaults.
    ///
    /// An empty scenarios root means two directories up from the working
    /// directory (the service normally runs from `scenarios/<name>/api`).
    /// An empty resources root means `<scenarios_root>/../resources`.
    pub fn resolve(scenarios_root: Option<&Path>, resources_root: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;

        let scenarios_root = match scenarios_root.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => absolutize(&cwd, p),
            None => absolutize(&cwd, Path::new("../..")),
        };

        let resources_root = match resources_root.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => absolutize(&cwd, p),
            None => match scenarios_root.parent() {
                Some(repo) => repo.join("resources"),
                None => {
                    return Err(Error::Config(format!(
                        "cannot derive resources root from {}",
                        scenarios_root.display()
                    )))
                }
            },
        };

        Ok(Self {
            scenarios_root,
            resources_root,
        })
    }

    /// Resolve roots from `SDA_SCENARIOS_DIR` / `SDA_RESOURCES_DIR`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_overrides(None, None)
    }

    /// Explicit roots win over the environment; the environment wins over
    /// defaults.
    pub fn from_env_with_overrides(
        scenarios_root: Option<PathBuf>,
        resources_root: Option<PathBuf>,
    ) -> Result<Self> {
        let scenarios =
            scenarios_root.or_else(|| std::env::var_os(SCENARIOS_DIR_ENV).map(PathBuf::from));
        let resources =
            resources_root.or_else(|| std::env::var_os(RESOURCES_DIR_ENV).map(PathBuf::from));
        Self::resolve(scenarios.as_deref(), resources.as_deref())
    }

    /// Directory of one scenario, matched case-insensitively on disk.
    pub fn scenario_path(&self, scenario_name: &str) -> PathBuf {
        scenario_dir(&self.scenarios_root, scenario_name)
    }
}

/// Absolute, lexically cleaned form of `path` relative to `base`.
fn absolutize(base: &Path, path: &Path) -> PathBuf {
    use std::path::Component;

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
