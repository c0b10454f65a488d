//! Scenario dependency analyzer - detect dependencies and build deployment reports.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod dag;
pub mod decisions;
pub mod detector;
pub mod filters;
pub mod gaps;
pub mod manifest;
pub mod patterns;
pub mod report;
pub mod resource_scan;
pub mod scenario_scan;
pub mod settings;
pub mod walk;

pub use catalog::{CatalogManager, CatalogSnapshot};
pub use config::{load_service_config, normalize_name, resolved_resource_map, scenario_dir};
pub use detector::Detector;
pub use report::{analyze_scenario, build_report, load_report, persist_report, report_path};
pub use settings::AnalyzerConfig;
