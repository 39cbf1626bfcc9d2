// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use the_arcwood::backends::local::LocalParticleFactory;
use the_arcwood::config::{load_and_validate_manifest, load_config, ArcwoodConfig};
use the_arcwood::engine::Planner;
use the_arcwood::recipe::Search;
use the_arcwood::runtime::{Context, Scheduler};
use the_arcwood::traits::ParticleFactory;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "arcwood",
    version,
    about = "Suggests particle compositions for a context by searching and speculatively running recipes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speculatively run every plan and print the relevant ones, best first
    Suggest(PlanArgs),
    /// Print every resolved plan the search finds
    Plan(PlanArgs),
    /// List built-in particle implementations and the manifest's particles
    Particles {
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Particles, seed recipes, views and slots (YAML)
    #[arg(long)]
    manifest: PathBuf,
    /// Planner config (YAML or TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search phrase; overrides the manifest's
    #[arg(long)]
    search: Option<String>,
    /// Planning window; overrides the config's
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Suggest(args) => suggest(args).await,
        Command::Plan(args) => plan(args).await,
        Command::Particles { manifest } => particles(manifest),
    }
}

/// Planner for the manifest's context, and the planning window to use.
fn planner(args: &PlanArgs) -> Result<(Planner, Duration)> {
    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ArcwoodConfig::default(),
    };
    let factory = Arc::new(LocalParticleFactory);
    let manifest = load_and_validate_manifest(&args.manifest, factory.as_ref())
        .with_context(|| format!("loading manifest {}", args.manifest.display()))?;

    let context = Context::from_manifest("arcwood", &manifest, factory, Scheduler::new())
        .context("building context from manifest")?;
    if let Some(phrase) = &args.search {
        context.set_search(Some(Search::new(phrase)));
    }
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.planner.get_timeout());
    Ok((Planner::init(Arc::new(context), &config), timeout))
}

async fn suggest(args: PlanArgs) -> Result<()> {
    let (mut planner, timeout) = planner(&args)?;
    let mut suggestions = planner.suggest(timeout, None).await?;
    suggestions.sort_by(|a, b| b.rank.total_cmp(&a.rank));

    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for suggestion in &suggestions {
        println!(
            "{}  {:>8.3}  {}",
            suggestion.hash, suggestion.rank, suggestion.description
        );
    }
    planner.context().stop();
    Ok(())
}

async fn plan(args: PlanArgs) -> Result<()> {
    let (mut planner, timeout) = planner(&args)?;
    let plans = planner.plan(timeout, None).await?;

    for plan in &plans {
        let particles: Vec<&str> = plan.particles.iter().map(|p| p.display_name()).collect();
        println!(
            "{}  {}  [{}]",
            planner.short_hash(&plan.digest()),
            plan.label(),
            particles.join(", ")
        );
    }
    println!("{} resolved plans", plans.len());
    planner.context().stop();
    Ok(())
}

fn particles(manifest: Option<PathBuf>) -> Result<()> {
    let factory = LocalParticleFactory;
    println!("Built-in implementations:");
    for implementation in factory.list_available_implementations() {
        println!("  {}", implementation);
    }

    if let Some(path) = manifest {
        let manifest = load_and_validate_manifest(&path, &factory)
            .with_context(|| format!("loading manifest {}", path.display()))?;
        println!("Particles in {}:", path.display());
        for spec in &manifest.particles {
            let verbs = if spec.verbs.is_empty() {
                String::new()
            } else {
                format!(" ({})", spec.verbs.join(", "))
            };
            println!("  {} -> {}{}", spec.name, spec.implementation, verbs);
        }
    }
    Ok(())
}
