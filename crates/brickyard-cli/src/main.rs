//! brickyard CLI - import brick placement files from the command line
//!
//! Assembles a model exactly as an application would and prints what came
//! out: a summary, or the full scene as JSON.

use anyhow::{Context, Result};
use brickyard::{
    scan, AssetResolver, DirectoryAssets, ImportOptions, ImporterConfig, ModelAssembler, ReimportPolicy,
    RecordStats,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "brickyard")]
#[command(about = "Import brick placement files into a scene of placed parts", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a model and print the result
    Import {
        /// Input model file (.ldr)
        input: PathBuf,
        /// Importer configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Part library directory (overrides the configuration)
        #[arg(short, long)]
        library: Option<PathBuf>,
        /// Re-import policy (overrides the configuration)
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Keep the file's Y axis instead of negating it
        #[arg(long)]
        no_invert_y: bool,
        /// Center the model on the origin after import
        #[arg(long)]
        center: bool,
        /// Print the assembled scene as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count placements, parts and colors without resolving anything
    Info {
        /// Input model file (.ldr)
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Replace,
    Pool,
}

impl From<PolicyArg> for ReimportPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Replace => ReimportPolicy::Replace,
            PolicyArg::Pool => ReimportPolicy::Pool,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Import {
            input,
            config,
            library,
            policy,
            no_invert_y,
            center,
            json,
        } => {
            let mut config = match config {
                Some(path) => ImporterConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => ImporterConfig::default(),
            };
            if let Some(library) = library {
                config.library = Some(library);
            }
            if let Some(policy) = policy {
                config.import.policy = policy.into();
            }
            if no_invert_y {
                config.import.invert_y = false;
            }
            import_file(&input, config, center, json)?;
        }
        Commands::Info { input } => {
            show_info(&input)?;
        }
    }

    Ok(())
}

fn import_file(input: &Path, config: ImporterConfig, center: bool, json: bool) -> Result<()> {
    let materials = config.materials()?;
    match config.library {
        Some(library) => {
            debug!(library = %library.display(), "resolving parts from library");
            let assets = DirectoryAssets::new(library, materials);
            run_import(input, assets, config.import, center, json)
        }
        None => {
            debug!("no part library; accepting every part");
            run_import(input, materials.accept_any_geometry(), config.import, center, json)
        }
    }
}

fn run_import<R: AssetResolver>(
    input: &Path,
    assets: R,
    options: ImportOptions,
    center: bool,
    json: bool,
) -> Result<()> {
    let mut assembler = ModelAssembler::new(assets, options);
    let root = assembler
        .import(input)
        .with_context(|| format!("failed to import {}", input.display()))?;

    if center {
        if let Some(offset) = assembler.center_to_origin(root) {
            info!(x = offset.x, y = offset.y, z = offset.z, "centered model");
        }
    }

    let snapshot = assembler
        .scene()
        .snapshot(root)
        .context("model root disappeared")?;

    if json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    println!("Model: {}", snapshot.name);
    println!("  Nodes: {}", snapshot.nodes.len());
    if let Some(summary) = assembler.last_summary() {
        println!("  Created: {}, reused: {}", summary.created, summary.reused);
        if !summary.diagnostics.is_empty() {
            println!("  Diagnostics:");
            for diagnostic in &summary.diagnostics {
                println!("    {diagnostic}");
            }
        }
    }
    if let Some(bounds) = assembler.scene().bounds(root) {
        let size = bounds.size();
        println!("  Extent: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let text =
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let stats = scan(&text);
    print_stats(input, &stats);
    Ok(())
}

fn print_stats(input: &Path, stats: &RecordStats) {
    println!("File: {}", input.display());
    println!("  Lines: {}", stats.lines);
    println!("  Placements: {}", stats.placements);
    println!("  Malformed: {}", stats.malformed);

    if !stats.parts.is_empty() {
        println!("  Parts:");
        for (part, count) in &stats.parts {
            println!("    {part}: {count}");
        }
    }
    if !stats.colors.is_empty() {
        println!("  Colors:");
        for (color, count) in &stats.colors {
            println!("    {color}: {count}");
        }
    }
}
