//! Tuning file loading and validation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pilot_control::{EvolutionConfig, Gene, TeamConfig};
use serde::{Deserialize, Serialize};

use crate::generate::WorldGenConfig;
use crate::stepper::PhysicsConfig;

pub const TUNING_FILE: &str = "tuning.json";

/// Everything a game needs besides a seed: team behavior, evolution knobs,
/// world layout and physics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub team: TeamConfig,
    pub evolution: EvolutionConfig,
    pub world: WorldGenConfig,
    pub physics: PhysicsConfig,
}

pub fn load_tuning(content_dir: &str) -> Result<Tuning> {
    let path = Path::new(content_dir).join(TUNING_FILE);
    let tuning: Tuning = serde_json::from_str(
        &std::fs::read_to_string(&path).context("reading tuning.json")?,
    )
    .context("parsing tuning.json")?;
    validate_tuning(&tuning).context("validating tuning.json")?;
    Ok(tuning)
}

/// Rejects values that would make planning or evolution degenerate.
pub fn validate_tuning(tuning: &Tuning) -> Result<()> {
    let planner = &tuning.team.planner;
    if planner.field_of_view <= 0.0 {
        bail!("planner.field_of_view must be positive");
    }
    if planner.replan_interval == 0 {
        bail!("planner.replan_interval must be at least 1");
    }
    if planner.bypass_angle_deg <= 0.0 || planner.bypass_angle_deg >= 180.0 {
        bail!("planner.bypass_angle_deg must lie in (0, 180)");
    }
    if planner.arrival_multiplier <= 0.0 {
        bail!("planner.arrival_multiplier must be positive");
    }

    for gene in Gene::ALL {
        let range = tuning.team.ranges.range(gene);
        if range.min >= range.max {
            bail!("ranges.{gene:?}: min {} must be below max {}", range.min, range.max);
        }
    }

    let evolution = &tuning.evolution;
    if evolution.tournament_size == 0 {
        bail!("evolution.tournament_size must be at least 1");
    }
    if !(0.0..=1.0).contains(&evolution.mutation_rate) {
        bail!("evolution.mutation_rate must lie in [0, 1]");
    }
    if evolution.mutation_variance < 0.0 {
        bail!("evolution.mutation_variance must not be negative");
    }
    if evolution.evolve_threshold == 0 {
        bail!("evolution.evolve_threshold must be at least 1");
    }

    let strategy = &tuning.team.strategy;
    if strategy.min_ships > strategy.goal_ships {
        bail!(
            "strategy.min_ships ({}) exceeds strategy.goal_ships ({})",
            strategy.min_ships,
            strategy.goal_ships
        );
    }

    let world = &tuning.world;
    if world.width <= 0.0 || world.height <= 0.0 {
        bail!("world dimensions must be positive");
    }
    if world.teams.is_empty() {
        bail!("world.teams must name at least one team");
    }
    let mut seen = HashSet::new();
    for team in &world.teams {
        if team.0.is_empty() {
            bail!("world.teams contains an empty team name");
        }
        if !seen.insert(team) {
            bail!("world.teams lists '{team}' twice");
        }
    }
    if world.deposit_resources[0] > world.deposit_resources[1] {
        bail!("world.deposit_resources must be [min, max]");
    }

    let physics = &tuning.physics;
    if physics.max_acceleration <= 0.0 {
        bail!("physics.max_acceleration must be positive");
    }
    if physics.ship_cost <= 0.0 || physics.depot_cost <= 0.0 {
        bail!("physics purchase costs must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_tuning(&Tuning::default()).unwrap();
    }

    #[test]
    fn rejects_inverted_gene_range() {
        let mut tuning = Tuning::default();
        tuning.team.ranges.max_speed.min = 200.0;
        let err = validate_tuning(&tuning).unwrap_err().to_string();
        assert!(err.contains("MaxSpeed"), "unexpected error: {err}");
    }

    #[test]
    fn rejects_duplicate_team() {
        let mut tuning = Tuning::default();
        let first = tuning.world.teams[0].clone();
        tuning.world.teams.push(first);
        assert!(validate_tuning(&tuning).is_err());
    }

    #[test]
    fn rejects_zero_replan_interval() {
        let mut tuning = Tuning::default();
        tuning.team.planner.replan_interval = 0;
        assert!(validate_tuning(&tuning).is_err());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let tuning: Tuning =
            serde_json::from_str(r#"{ "evolution": { "tournament_size": 3 } }"#).unwrap();
        assert_eq!(tuning.evolution.tournament_size, 3);
        assert_eq!(tuning.team, TeamConfig::default());
    }

    #[test]
    fn missing_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tuning(dir.path().to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("tuning.json"));
    }
}
