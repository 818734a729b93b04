use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pilot_world::Tuning;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod overrides;
mod run_result;
mod runner;
mod scenario;
mod summary;

use run_result::{write_json_atomic, SeedMetrics};
use runner::{SeedPlan, SeedResult};
use scenario::Scenario;

#[derive(Parser)]
#[command(
    name = "pilot_bench",
    about = "Batch scenario runner for autopilot tuning experiments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario on every seed it lists, seeds in parallel.
    Run {
        /// Path to the scenario JSON file.
        #[arg(long)]
        scenario: PathBuf,
        /// Parent directory for the timestamped run directory.
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
        /// Worker threads; defaults to one per core.
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Load a scenario and its tuning with overrides applied, then exit.
    Check {
        #[arg(long)]
        scenario: PathBuf,
    },
}

/// Scenario plus the tuning it resolves to.
fn prepare(scenario_path: &Path) -> Result<(Scenario, Tuning)> {
    let scenario = scenario::load_scenario(scenario_path)?;
    let mut tuning = pilot_world::load_tuning(&scenario.content_dir)?;
    overrides::apply_overrides(&mut tuning, &scenario.overrides)?;
    pilot_world::validate_tuning(&tuning)
        .with_context(|| format!("tuning for scenario '{}'", scenario.name))?;
    Ok((scenario, tuning))
}

fn check(scenario_path: &Path) -> Result<()> {
    let (scenario, tuning) = prepare(scenario_path)?;
    println!(
        "'{}' ok: {} seeds, {} games × {} ticks, {} teams, {} overrides",
        scenario.name,
        scenario.seeds.expand().len(),
        scenario.games,
        scenario.ticks,
        tuning.world.teams.len(),
        scenario.overrides.len()
    );
    Ok(())
}

fn run(scenario_path: &Path, output_dir: &Path, threads: Option<usize>) -> Result<()> {
    let (scenario, tuning) = prepare(scenario_path)?;
    let seeds = scenario.seeds.expand();
    let scenario_params = serde_json::json!({
        "ticks": scenario.ticks,
        "games": scenario.games,
        "metrics_every": scenario.metrics_every,
        "content_dir": scenario.content_dir,
        "overrides": scenario.overrides,
    });

    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("{}_{stamp}", scenario.name));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;
    std::fs::copy(scenario_path, run_dir.join("scenario.json"))
        .context("copying scenario file")?;

    tracing::info!(
        scenario = %scenario.name,
        seeds = seeds.len(),
        games = scenario.games,
        ticks = scenario.ticks,
        output = %run_dir.display(),
        "starting batch"
    );

    let plan = SeedPlan {
        tuning: &tuning,
        ticks: scenario.ticks,
        games: scenario.games,
        metrics_every: scenario.metrics_every,
        scenario_name: &scenario.name,
        scenario_params: &scenario_params,
    };
    let play_all = || -> Vec<Result<SeedResult>> {
        seeds
            .par_iter()
            .map(|&seed| runner::run_seed(&plan, seed, &run_dir.join(format!("seed_{seed}"))))
            .collect()
    };
    let results = match threads {
        Some(count) => rayon::ThreadPoolBuilder::new()
            .num_threads(count)
            .build()
            .context("building worker pool")?
            .install(play_all),
        None => play_all(),
    };

    let mut finished = Vec::with_capacity(results.len());
    for (seed, result) in seeds.iter().zip(results) {
        match result {
            Ok(seed_result) => finished.push(seed_result),
            Err(err) => tracing::error!(seed, error = %format!("{err:#}"), "seed failed"),
        }
    }
    if finished.is_empty() {
        bail!("all {} seeds failed", seeds.len());
    }

    let by_seed: Vec<(u64, &SeedMetrics)> = finished
        .iter()
        .map(|result| (result.seed, &result.metrics))
        .collect();
    let stats = summary::compute_summary(&by_seed);
    summary::print_summary(&scenario.name, scenario.ticks, scenario.games, &stats);

    write_json_atomic(&run_dir.join("summary.json"), &stats)?;
    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "scenario_name": scenario.name,
        "scenario_params": scenario_params,
        "seed_count": finished.len(),
        "failed_count": seeds.len() - finished.len(),
        "run_ids": finished.iter().map(|result| result.run_id.as_str()).collect::<Vec<_>>(),
        "scoreless_count": stats.scoreless_count,
        "aggregated_metrics": summary::build_aggregated_metrics(&stats),
    });
    write_json_atomic(&run_dir.join("batch_summary.json"), &batch_summary)?;

    println!("Results in {}", run_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run {
            scenario,
            output_dir,
            threads,
        } => run(&scenario, &output_dir, threads),
        Commands::Check { scenario } => check(&scenario),
    }
}
