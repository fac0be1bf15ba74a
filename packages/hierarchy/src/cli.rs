//! Command-line interface for hierarchy inference.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use crate::ancestry::ancestor_chain;
use crate::crosswalk::Crosswalk;
use crate::error::{HierarchyError, Result};
use crate::registry::{load_registry, FrameworkRegistry};
use crate::rules::RefShape;
use crate::runner::{process_all, ImportSummary};
use crate::store::MemoryStore;
use crate::types::FrameworkId;
use crate::yaml::{load_store, save_store};

/// ControlMap hierarchy - infer control hierarchies from reference codes.
#[derive(Parser)]
#[command(name = "controlmap-hierarchy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer parents, groups, levels and display order for every framework in a store file.
    Infer {
        /// Store file (YAML)
        store: PathBuf,

        /// Write the result here instead of updating the store file in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Framework registry file (default: built-in table)
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ancestor chain of a reference code.
    Parent {
        /// Framework code (e.g., HIPAA)
        code: String,

        /// Framework version (e.g., 2013)
        version: String,

        /// Reference code (e.g., "164.306(b)(2)(i)")
        ref_code: String,

        /// Framework registry file (default: built-in table)
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// List registered frameworks.
    Frameworks {
        /// Framework registry file (default: built-in table)
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Seed a store file with the framework controls referenced by SCF mappings.
    Seed {
        /// Mapping rows (YAML list of `scf_control` + `mappings` by sheet header)
        mappings: PathBuf,

        /// Store file to create or extend
        store: PathBuf,

        /// Framework registry file (default: built-in table)
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Infer {
            store,
            output,
            registry,
            json,
        } => infer_command(&store, output.as_deref(), registry.as_deref(), json),
        Commands::Parent {
            code,
            version,
            ref_code,
            registry,
        } => parent_command(&code, &version, &ref_code, registry.as_deref()),
        Commands::Frameworks { registry } => frameworks_command(registry.as_deref()),
        Commands::Seed {
            mappings,
            store,
            registry,
        } => seed_command(&mappings, &store, registry.as_deref()),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the infer command.
fn infer_command(
    store_path: &Path,
    output: Option<&Path>,
    registry_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let mut store = load_store(store_path)?;

    let pb = spinner();
    pb.set_message("Inferring hierarchies...");
    let summary = process_all(&mut store, &registry);

    pb.set_message("Saving store...");
    let output_path = output.unwrap_or(store_path);
    if let Err(e) = save_store(&store, output_path) {
        pb.finish_and_clear();
        return Err(e);
    }
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!();
        println!(
            "{} {}",
            style("Saved to:").green().bold(),
            output_path.display()
        );
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(HierarchyError::FrameworksFailed(summary.failures.len()))
    }
}

fn print_summary(summary: &ImportSummary) {
    for report in &summary.reports {
        println!(
            "{} {}",
            style(&report.framework_id).cyan().bold(),
            style(report.family).dim()
        );
        println!(
            "  Nodes: {}  Created: {}  Changed: {}  Roots: {}  Groups: {}",
            report.loaded, report.created, report.changed, report.roots, report.groups
        );
        if report.warnings.total() > 0 {
            println!("  Warnings: {}", style(report.warnings.total()).yellow().bold());
            for sample in &report.samples {
                println!("    {sample}");
            }
        }
    }

    for failure in &summary.failures {
        println!(
            "{} {}: {}",
            style("Failed").red().bold(),
            style(&failure.framework_id).cyan(),
            failure.error
        );
    }
}

/// Execute the parent command.
fn parent_command(
    code: &str,
    version: &str,
    ref_code: &str,
    registry_path: Option<&Path>,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let spec = registry
        .find(code, version)
        .ok_or_else(|| HierarchyError::UnknownFramework(FrameworkId::new(code, version)))?;
    let family = &spec.family;

    if family.classify(ref_code) == RefShape::Unrecognized {
        println!(
            "{} '{}' matches no {} pattern",
            style("Warning:").yellow().bold(),
            ref_code,
            family.name()
        );
        return Ok(());
    }

    let chain = match ancestor_chain(ref_code, family) {
        Ok(chain) => chain,
        Err(e) => {
            println!("{} {e}", style("Warning:").yellow().bold());
            return Ok(());
        }
    };

    println!(
        "{}  {}",
        style(ref_code).cyan().bold(),
        style(family.hierarchy_level(ref_code, false)).dim()
    );
    for (depth, ancestor) in chain.iter().enumerate() {
        println!(
            "{}{}  {}",
            "  ".repeat(depth + 1),
            ancestor,
            style(family.hierarchy_level(ancestor, true)).dim()
        );
    }

    Ok(())
}

/// Execute the frameworks command.
fn frameworks_command(registry_path: Option<&Path>) -> Result<()> {
    let registry = load_registry(registry_path)?;

    for spec in registry.iter() {
        let groups = if spec.synthesize_groups { "" } else { " (no synthesis)" };
        println!(
            "{:<28} {:<20} {}{}",
            style(spec.id()).cyan(),
            spec.family.name(),
            spec.display_name(),
            style(groups).dim()
        );
    }
    println!();
    println!("{} frameworks", style(registry.len()).bold());

    Ok(())
}

/// One row of the SCF mapping sheet.
#[derive(Debug, Deserialize)]
struct MappingRow {
    scf_control: String,
    #[serde(default)]
    mappings: BTreeMap<String, String>,
}

/// Execute the seed command.
fn seed_command(mappings_path: &Path, store_path: &Path, registry_path: Option<&Path>) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let rows: Vec<MappingRow> = serde_yaml_ng::from_str(&std::fs::read_to_string(mappings_path)?)?;

    let crosswalk = build_crosswalk(&rows, &registry);

    let mut store = if store_path.exists() {
        load_store(store_path)?
    } else {
        MemoryStore::new()
    };
    let seeded = crosswalk.seed_store(&mut store, registry.iter())?;
    save_store(&store, store_path)?;

    println!(
        "{} {} mappings ({} partial) across {} frameworks",
        style("Seeded").green().bold(),
        seeded.mappings,
        seeded.partial,
        seeded.frameworks.len()
    );
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        store_path.display()
    );

    Ok(())
}

fn build_crosswalk(rows: &[MappingRow], registry: &FrameworkRegistry) -> Crosswalk {
    let mut crosswalk = Crosswalk::new();
    for row in rows {
        for (header, cell) in &row.mappings {
            match registry.find_by_header(header) {
                Some(spec) => {
                    crosswalk.add_cell(&row.scf_control, spec, header, cell);
                }
                None => {
                    tracing::warn!(header = %header, "No framework registered for mapping column, skipping");
                }
            }
        }
    }
    crosswalk
}
