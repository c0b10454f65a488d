//! sda - Scenario dependency and deployment analyzer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sda_analyzer::{
    analyze_scenario, load_report, load_service_config, persist_report, scenario_dir,
    AnalyzerConfig, CatalogManager, Detector,
};
use sda_report_schema::{validate_report_file, DeploymentAnalysisReport};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sda")]
#[command(
    author,
    version,
    about = "Detect scenario dependencies and build deployment readiness reports"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory holding one sub-directory per scenario [env: SDA_SCENARIOS_DIR]
    #[arg(long, global = true)]
    scenarios_dir: Option<PathBuf>,

    /// Directory holding one sub-directory per resource [env: SDA_RESOURCES_DIR]
    #[arg(long, global = true)]
    resources_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deployment report for one scenario
    Analyze {
        /// Scenario name
        #[arg(long)]
        scenario: String,

        /// Print the report without writing it to disk
        #[arg(long)]
        no_persist: bool,

        #[arg(long, value_enum, default_value = "summary")]
        format: OutputFormat,
    },

    /// Build and persist reports for every scenario in the catalog
    AnalyzeAll {
        /// Keep going (and exit successfully) when a scenario fails
        #[arg(long)]
        continue_on_failure: bool,
    },

    /// Run static dependency detection for one scenario
    Detect {
        #[arg(long)]
        scenario: String,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Print a previously persisted report
    ShowReport {
        #[arg(long)]
        scenario: String,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Validate a report file against the report schema
    ValidateReport {
        /// Report file path
        #[arg(long)]
        path: PathBuf,
    },

    /// List known scenarios and resources
    Catalog {
        /// Re-scan the filesystem before listing
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = AnalyzerConfig::from_env_with_overrides(cli.scenarios_dir, cli.resources_dir)
        .context("Failed to resolve scenario and resource directories")?;
    let catalog = CatalogManager::install_global(&config);

    match cli.command {
        Commands::Analyze {
            scenario,
            no_persist,
            format,
        } => {
            info!("Analyzing scenario: {}", scenario);
            let report = analyze_scenario(&config.scenarios_root, &scenario)
                .with_context(|| format!("Failed to analyze scenario {scenario}"))?;

            if !no_persist {
                let path = persist_report(&config.scenario_path(&scenario), &report)
                    .context("Failed to persist report")?;
                info!("Report written to {}", path.display());
            }
            print_report(&report, format)?;
        }

        Commands::AnalyzeAll {
            continue_on_failure,
        } => {
            analyze_all(&config, catalog, continue_on_failure).await?;
        }

        Commands::Detect { scenario, format } => {
            let path = config.scenario_path(&scenario);
            let cfg = match load_service_config(&path) {
                Ok(cfg) => Some(cfg),
                Err(e) if e.is_config_missing() => {
                    warn!("{}; detecting without declared dependencies", e);
                    None
                }
                Err(e) => return Err(e).context("Failed to load service config"),
            };

            let report = Detector::new(catalog).analyze(&path, &scenario, cfg.as_ref());
            match format {
                OutputFormat::Summary => {
                    println!("Scenario: {}", report.scenario);
                    for dep in report
                        .resources
                        .iter()
                        .chain(&report.scenarios)
                        .chain(&report.workflows)
                    {
                        println!(
                            "  {:<16} {:<32} {}",
                            dep.access_method.to_string(),
                            dep.dependency_name,
                            dep.purpose
                        );
                    }
                    if !report.drift.is_clean() {
                        println!("Drift: {}", serde_json::to_string(&report.drift)?);
                    }
                }
                other => print_structured(&report, other)?,
            }
        }

        Commands::ShowReport { scenario, format } => {
            let path = config.scenario_path(&scenario);
            let report = load_report(&path)
                .with_context(|| format!("No readable report for scenario {scenario}"))?;
            print_report(&report, format)?;
        }

        Commands::ValidateReport { path } => {
            info!("Validating report: {:?}", path);
            let result = validate_report_file(&path).context("Failed to read report")?;

            for warning in &result.warnings {
                println!("warning: {}", warning);
            }
            if result.valid {
                println!("Report is valid.");
            } else {
                println!("Report has {} error(s):", result.errors.len());
                for error in &result.errors {
                    println!("  - {}", error);
                }
                anyhow::bail!("Report validation failed");
            }
        }

        Commands::Catalog { refresh } => {
            if refresh {
                catalog.refresh();
            }
            let snapshot = catalog.snapshot();
            println!("Scenarios ({}):", snapshot.scenarios.len());
            for name in &snapshot.scenarios {
                println!("  {}", name);
            }
            println!("Resources ({}):", snapshot.resources.len());
            for name in &snapshot.resources {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(filter)
        .init();
}

/// Analyze every known scenario on the blocking pool.
async fn analyze_all(
    config: &AnalyzerConfig,
    catalog: &'static CatalogManager,
    continue_on_failure: bool,
) -> Result<()> {
    let scenarios = catalog.known_scenarios();
    if scenarios.is_empty() {
        warn!(
            "No scenarios found under {}",
            config.scenarios_root.display()
        );
        return Ok(());
    }

    let mut tasks = Vec::new();
    for name in scenarios {
        let scenarios_root = config.scenarios_root.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let report = analyze_scenario(&scenarios_root, &name)?;
            persist_report(&scenario_dir(&scenarios_root, &name), &report)?;
            Ok::<_, sda_common::Error>(report)
        });
        tasks.push(handle);
    }

    let mut failures = 0usize;
    println!(
        "{:<32} {:>6} {:>6} {:>8}",
        "SCENARIO", "DEPS", "GAPS", "BLOCKERS"
    );
    for task in tasks {
        match task.await.context("Analysis task panicked")? {
            Ok(report) => {
                let blockers: usize = report
                    .aggregates
                    .values()
                    .map(|a| a.blocking_dependencies.len())
                    .sum();
                println!(
                    "{:<32} {:>6} {:>6} {:>8}",
                    report.scenario,
                    report.bundle_manifest.dependencies.len(),
                    report.metadata_gaps.total_gaps,
                    blockers
                );
            }
            Err(e) => {
                failures += 1;
                error!("Analysis failed: {}", e);
            }
        }
    }

    if failures > 0 && !continue_on_failure {
        anyhow::bail!("{} scenario(s) failed to analyze", failures);
    }
    Ok(())
}

fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_report(report: &DeploymentAnalysisReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Summary {
        return print_structured(report, format);
    }

    let app = &report.bundle_manifest.skeleton.app;
    println!("Scenario: {} ({} {})", report.scenario, app.display_name, app.version);
    println!("Generated: {}", report.generated_at);

    println!("Dependencies:");
    for root in &report.dependencies {
        root.walk(&mut |node| {
            let note = node
                .notes
                .as_deref()
                .map(|n| format!(" [{n}]"))
                .unwrap_or_default();
            println!("  {}:{}{}", node.node_type, node.name, note);
        });
    }

    if !report.aggregates.is_empty() {
        println!("{:<12} {:>6} {:>8}  BLOCKING", "TIER", "DEPS", "FITNESS");
        for (tier, aggregate) in &report.aggregates {
            println!(
                "{:<12} {:>6} {:>8.2}  {}",
                tier,
                aggregate.dependency_count,
                aggregate.fitness_score,
                aggregate.blocking_dependencies.join(", ")
            );
        }
    }

    let gaps = &report.metadata_gaps;
    println!(
        "Metadata gaps: {} ({} scenario(s) without a deployment block)",
        gaps.total_gaps, gaps.scenarios_missing_all
    );
    for recommendation in &gaps.recommendations {
        println!("  - {}", recommendation);
    }
    Ok(())
}
