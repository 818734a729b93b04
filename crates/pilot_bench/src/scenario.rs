use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Ticks per game.
    pub ticks: u64,
    /// Games played back to back per seed; evolution carries across them.
    #[serde(default = "default_games")]
    pub games: u32,
    #[serde(default = "default_metrics_every")]
    pub metrics_every: u64,
    pub seeds: SeedSpec,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default)]
    pub overrides: HashMap<String, serde_json::Value>,
}

fn default_games() -> u32 {
    1
}

fn default_metrics_every() -> u64 {
    100
}

fn default_content_dir() -> String {
    "./content".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedSpec {
    List(Vec<u64>),
    Range { range: [u64; 2] },
}

impl SeedSpec {
    pub fn expand(&self) -> Vec<u64> {
        match self {
            SeedSpec::List(seeds) => seeds.clone(),
            SeedSpec::Range { range } => (range[0]..=range[1]).collect(),
        }
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if scenario.name.is_empty() {
        bail!("scenario 'name' must not be empty");
    }
    if scenario.ticks == 0 {
        bail!("scenario 'ticks' must be > 0");
    }
    if scenario.games == 0 {
        bail!("scenario 'games' must be > 0");
    }
    if scenario.metrics_every == 0 {
        bail!("scenario 'metrics_every' must be > 0");
    }
    if scenario.seeds.expand().is_empty() {
        bail!("scenario 'seeds' must produce at least one seed");
    }
    Ok(scenario)
}
