//! kinforge CLI — resolve CAD assembly snapshots into kinematic trees.
//!
//! The resolution core is synchronous and per-assembly independent, so
//! the `batch` subcommand simply runs one resolver per rayon task.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinforge::{resolve, AssemblySnapshot, ResolveConfig, Warning};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "kinforge")]
#[command(about = "Convert CAD assembly snapshots into robot kinematic trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one assembly snapshot into a kinematic tree
    Resolve {
        /// Input snapshot (.json)
        snapshot: PathBuf,
        /// Resolution configuration (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output tree file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Display a summary of a resolved assembly
    Info {
        /// Input snapshot (.json)
        snapshot: PathBuf,
        /// Resolution configuration (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Resolve every snapshot in a directory
    Batch {
        /// Directory containing snapshot .json files
        dir: PathBuf,
        /// Resolution configuration applied to every assembly (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory (defaults to the input directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            snapshot,
            config,
            output,
        } => resolve_one(&snapshot, config.as_deref(), output.as_deref()),
        Commands::Info { snapshot, config } => show_info(&snapshot, config.as_deref()),
        Commands::Batch {
            dir,
            config,
            output,
        } => run_batch(&dir, config.as_deref(), output.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ResolveConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ResolveConfig::from_toml(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(ResolveConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<AssemblySnapshot> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    AssemblySnapshot::from_json(&json)
        .with_context(|| format!("parsing snapshot {}", path.display()))
}

fn resolve_one(snapshot: &Path, config: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let snapshot = load_snapshot(snapshot)?;
    let resolution = resolve(&snapshot, &config)?;
    for warning in &resolution.warnings {
        eprintln!("warning: {warning}");
    }

    let json = resolution.tree.to_json()?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn show_info(snapshot: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let snapshot = load_snapshot(snapshot)?;
    let resolution = resolve(&snapshot, &config)?;
    let tree = &resolution.tree;

    println!("Root: {}", tree.link(tree.root).name);
    println!("Links ({}):", tree.links.len());
    for link in &tree.links {
        println!(
            "  {} ({} part{}, {} frame{})",
            link.name,
            link.parts.len(),
            if link.parts.len() == 1 { "" } else { "s" },
            link.frames.len(),
            if link.frames.len() == 1 { "" } else { "s" },
        );
    }
    println!("Joints ({}):", tree.joints.len());
    for joint in &tree.joints {
        let limits = match joint.limits {
            Some(l) => format!(
                " [{}: {}]",
                l.lower.map_or("open".into(), |v| format!("{v:.3}")),
                l.upper.map_or("open".into(), |v| format!("{v:.3}")),
            ),
            None => String::new(),
        };
        println!(
            "  {} ({:?}) {} -> {}{}",
            joint.name,
            joint.kind,
            tree.link(joint.parent).name,
            tree.link(joint.child).name,
            limits,
        );
    }
    if !resolution.warnings.is_empty() {
        println!("Warnings ({}):", resolution.warnings.len());
        for warning in &resolution.warnings {
            println!("  {warning}");
        }
    }
    Ok(())
}

fn run_batch(dir: &Path, config: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let out_dir = output.unwrap_or(dir);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut snapshots: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    snapshots.sort();

    // Each assembly resolves independently; a failure is reported and
    // the remaining assemblies continue.
    let failures: usize = snapshots
        .par_iter()
        .map(|path| match convert_one(path, &config, out_dir) {
            Ok(warnings) => {
                for warning in warnings {
                    eprintln!("{}: warning: {warning}", path.display());
                }
                0
            }
            Err(err) => {
                eprintln!("{}: error: {err:#}", path.display());
                1
            }
        })
        .sum();

    println!(
        "Resolved {} of {} assemblies",
        snapshots.len() - failures,
        snapshots.len()
    );
    if failures > 0 {
        anyhow::bail!("{failures} assembly(ies) failed to resolve");
    }
    Ok(())
}

fn convert_one(path: &Path, config: &ResolveConfig, out_dir: &Path) -> Result<Vec<Warning>> {
    let snapshot = load_snapshot(path)?;
    let resolution = resolve(&snapshot, config)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("assembly");
    let out = out_dir.join(format!("{stem}.tree.json"));
    fs::write(&out, resolution.tree.to_json()?)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(resolution.warnings)
}
