use anyhow::{Context, Result};
use pilot_control::Population;
use pilot_world::GameOutcome;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// End-of-seed figures, summed over every game the seed played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedMetrics {
    pub games: u32,
    pub total_score: f64,
    pub mean_game_score: f64,
    pub best_team_score: f64,
    pub mined: f64,
    pub stranded: u32,
    pub ships_bought: u32,
    pub depots_bought: u32,
    /// Fleet size summed over teams at the end of the last game.
    pub final_ships: usize,
    pub final_depots: usize,
    pub generation: u32,
    pub best_fitness: Option<f64>,
}

impl SeedMetrics {
    pub fn from_outcomes(outcomes: &[GameOutcome], population: &Population) -> Self {
        let games = outcomes.len() as u32;
        let total_score: f64 = outcomes.iter().map(GameOutcome::total_score).sum();
        let teams = || outcomes.iter().flat_map(|outcome| &outcome.teams);
        let last = outcomes.last().map(|outcome| outcome.teams.as_slice()).unwrap_or(&[]);
        Self {
            games,
            total_score,
            mean_game_score: if games == 0 {
                0.0
            } else {
                total_score / f64::from(games)
            },
            best_team_score: teams().map(|team| team.score).fold(0.0, f64::max),
            mined: outcomes.iter().map(|outcome| outcome.mined).sum(),
            stranded: outcomes.iter().map(|outcome| outcome.stranded).sum(),
            ships_bought: teams().map(|team| team.ships_bought).sum(),
            depots_bought: teams().map(|team| team.depots_bought).sum(),
            final_ships: last.iter().map(|team| team.ships).sum(),
            final_depots: last.iter().map(|team| team.depots).sum(),
            generation: population.generation,
            best_fitness: population.best.as_ref().map(|genome| genome.fitness),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub run_status: String,
    pub run_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub seed: u64,
    pub scenario_name: String,
    pub scenario_params: serde_json::Value,
    pub games: u32,
    pub ticks_per_game: u64,
    pub wall_time_ms: u64,
    pub sim_ticks_per_second: f64,
    pub summary_metrics: SeedMetrics,
    pub outcomes: Vec<GameOutcome>,
    pub metrics_path: String,
    pub error_message: Option<String>,
}

impl RunResult {
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }
}

/// Pretty JSON written beside `path` as `.json.tmp`, synced, then renamed over
/// it. Readers never see a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} into place", tmp_path.display()))?;
    Ok(())
}

pub fn git_sha() -> String {
    env!("GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("GIT_DIRTY") == "true"
}
