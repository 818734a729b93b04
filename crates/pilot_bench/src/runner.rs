use crate::run_result::{self, RunResult, SeedMetrics};
use anyhow::{Context, Result};
use pilot_control::EvolutionEngine;
use pilot_core::ObjectKind;
use pilot_world::{evolve_if_ready, Game, GameOutcome, Tuning};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Spreads the games of neighbouring seeds apart so seed 1 game 0 never
/// replays seed 0 game 1.
const GAME_SEED_STRIDE: u64 = 1_000_003;

/// Everything a seed needs besides the seed itself.
pub struct SeedPlan<'a> {
    pub tuning: &'a Tuning,
    pub ticks: u64,
    pub games: u32,
    pub metrics_every: u64,
    pub scenario_name: &'a str,
    pub scenario_params: &'a serde_json::Value,
}

pub struct SeedResult {
    pub seed: u64,
    pub metrics: SeedMetrics,
    #[allow(dead_code)]
    pub wall_time_ms: u64,
    pub run_id: String,
}

#[derive(Debug, Serialize)]
struct MetricsRow {
    game: u32,
    tick: u64,
    craft: usize,
    depots: usize,
    mined: f64,
    score: f64,
    stranded: u32,
}

impl MetricsRow {
    fn capture(game_index: u32, game: &Game) -> Self {
        let count = |kind: ObjectKind| {
            game.world()
                .objects
                .iter()
                .filter(|object| object.kind == kind && object.team.is_some())
                .count()
        };
        Self {
            game: game_index,
            tick: game.world().tick,
            craft: count(ObjectKind::MobileCraft),
            depots: count(ObjectKind::Depot),
            mined: game.mined(),
            score: game
                .economy()
                .accounts()
                .values()
                .map(|account| account.score)
                .sum(),
            stranded: game.stranded(),
        }
    }
}

pub fn game_seed(seed: u64, game: u32) -> u64 {
    seed.wrapping_mul(GAME_SEED_STRIDE)
        .wrapping_add(u64::from(game))
}

/// Plays every game of one seed with its own evolution engine, so seeds
/// never share learned state and can run in parallel.
pub fn run_seed(plan: &SeedPlan<'_>, seed: u64, seed_dir: &Path) -> Result<SeedResult> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    std::fs::create_dir_all(seed_dir)
        .with_context(|| format!("creating seed directory: {}", seed_dir.display()))?;
    let metrics_path = seed_dir.join("metrics.csv");
    let mut metrics_writer = csv::Writer::from_path(&metrics_path)
        .with_context(|| format!("opening {}", metrics_path.display()))?;

    let evolution = EvolutionEngine::fresh(plan.tuning.evolution.clone(), seed).into_shared();
    let mut outcomes: Vec<GameOutcome> = Vec::with_capacity(plan.games as usize);

    for game_index in 0..plan.games {
        let mut game = Game::new(plan.tuning, &evolution, game_seed(seed, game_index))
            .with_context(|| format!("building game {game_index} of seed {seed}"))?;
        for _ in 0..plan.ticks {
            game.tick();
            let tick = game.world().tick;
            if tick % plan.metrics_every == 0 || tick == plan.ticks {
                metrics_writer
                    .serialize(MetricsRow::capture(game_index, &game))
                    .context("writing metrics row")?;
            }
        }
        outcomes.push(game.finish());
        if evolve_if_ready(&evolution) {
            tracing::debug!(seed, game = game_index, "evolved population");
        }
    }
    metrics_writer.flush().context("flushing metrics")?;

    let metrics = SeedMetrics::from_outcomes(&outcomes, evolution.lock().population());

    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;
    let total_ticks = plan.ticks * u64::from(plan.games);
    let sim_ticks_per_second = if wall_time_ms > 0 {
        (total_ticks as f64) / (wall_time_ms as f64 / 1000.0)
    } else {
        0.0
    };

    let run_result = RunResult {
        run_schema_version: 1,
        run_status: "completed".to_string(),
        run_id: run_id.clone(),
        git_sha: run_result::git_sha(),
        git_dirty: run_result::git_dirty(),
        seed,
        scenario_name: plan.scenario_name.to_string(),
        scenario_params: plan.scenario_params.clone(),
        games: plan.games,
        ticks_per_game: plan.ticks,
        wall_time_ms,
        sim_ticks_per_second,
        summary_metrics: metrics.clone(),
        outcomes,
        metrics_path: "metrics.csv".to_string(),
        error_message: None,
    };
    run_result
        .write_atomic(&seed_dir.join("run_result.json"))
        .context("writing run_result.json")?;

    tracing::info!(
        seed,
        games = plan.games,
        total_score = metrics.total_score,
        generation = metrics.generation,
        wall_time_ms,
        "seed finished"
    );

    Ok(SeedResult {
        seed,
        metrics,
        wall_time_ms,
        run_id,
    })
}
