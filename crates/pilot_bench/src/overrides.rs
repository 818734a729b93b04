use anyhow::{bail, Result};
use pilot_world::Tuning;
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "field_of_view",
    "replan_interval",
    "close_escape",
    "bypass_angle_deg",
    "bypass_margin",
    "clearance_factor",
    "arrival_multiplier",
    "alignment_threshold_deg",
    "min_depot_energy",
    "goal_ships",
    "goal_depots",
    "min_ships",
    "tournament_size",
    "elite_clones",
    "mutation_rate",
    "mutation_variance",
    "evolve_threshold",
    "craft_per_team",
    "deposits",
    "unmineable_deposits",
    "waypoints",
    "mining_rate",
    "max_acceleration",
    "ship_cost",
    "depot_cost",
];

/// Patches single tuning values by flat key. Validation is left to the caller
/// so several overrides can be applied before the result is checked.
pub fn apply_overrides(
    tuning: &mut Tuning,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    let planner = &mut tuning.team.planner;
    let strategy = &mut tuning.team.strategy;
    let evolution = &mut tuning.evolution;
    let world = &mut tuning.world;
    let physics = &mut tuning.physics;
    for (key, value) in overrides {
        match key.as_str() {
            "field_of_view" => planner.field_of_view = as_f64(key, value)?,
            "replan_interval" => planner.replan_interval = as_u32(key, value)?,
            "close_escape" => planner.close_escape = as_f64(key, value)?,
            "bypass_angle_deg" => planner.bypass_angle_deg = as_f64(key, value)?,
            "bypass_margin" => planner.bypass_margin = as_f64(key, value)?,
            "clearance_factor" => planner.clearance_factor = as_f64(key, value)?,
            "arrival_multiplier" => planner.arrival_multiplier = as_f64(key, value)?,
            "alignment_threshold_deg" => {
                planner.alignment_threshold_deg = as_f64(key, value)?;
            }
            "min_depot_energy" => planner.min_depot_energy = as_f64(key, value)?,
            "goal_ships" => strategy.goal_ships = as_u32(key, value)?,
            "goal_depots" => strategy.goal_depots = as_u32(key, value)?,
            "min_ships" => strategy.min_ships = as_u32(key, value)?,
            "tournament_size" => evolution.tournament_size = as_usize(key, value)?,
            "elite_clones" => evolution.elite_clones = as_usize(key, value)?,
            "mutation_rate" => evolution.mutation_rate = as_f64(key, value)?,
            "mutation_variance" => evolution.mutation_variance = as_f64(key, value)?,
            "evolve_threshold" => evolution.evolve_threshold = as_usize(key, value)?,
            "craft_per_team" => world.craft_per_team = as_usize(key, value)?,
            "deposits" => world.deposits = as_usize(key, value)?,
            "unmineable_deposits" => world.unmineable_deposits = as_usize(key, value)?,
            "waypoints" => world.waypoints = as_usize(key, value)?,
            "mining_rate" => physics.mining_rate = as_f64(key, value)?,
            "max_acceleration" => physics.max_acceleration = as_f64(key, value)?,
            "ship_cost" => physics.ship_cost = as_f64(key, value)?,
            "depot_cost" => physics.depot_cost = as_f64(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    Ok(())
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_u64(key: &str, value: &serde_json::Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a positive integer, got {value}")
    })
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = as_u64(key, value)?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}

fn as_usize(key: &str, value: &serde_json::Value) -> Result<usize> {
    let val = as_u64(key, value)?;
    usize::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds usize range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_f64_override() {
        let mut tuning = Tuning::default();
        let overrides = HashMap::from([("field_of_view".to_string(), serde_json::json!(320.5))]);
        apply_overrides(&mut tuning, &overrides).unwrap();
        assert!((tuning.team.planner.field_of_view - 320.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_integer_overrides() {
        let mut tuning = Tuning::default();
        let overrides = HashMap::from([
            ("replan_interval".to_string(), serde_json::json!(4)),
            ("unmineable_deposits".to_string(), serde_json::json!(25)),
            ("goal_ships".to_string(), serde_json::json!(12)),
        ]);
        apply_overrides(&mut tuning, &overrides).unwrap();
        assert_eq!(tuning.team.planner.replan_interval, 4);
        assert_eq!(tuning.world.unmineable_deposits, 25);
        assert_eq!(tuning.team.strategy.goal_ships, 12);
    }

    #[test]
    fn test_every_valid_key_is_accepted() {
        for key in VALID_KEYS {
            let mut tuning = Tuning::default();
            let overrides = HashMap::from([((*key).to_string(), serde_json::json!(3))]);
            apply_overrides(&mut tuning, &overrides)
                .unwrap_or_else(|err| panic!("key {key} rejected: {err}"));
        }
    }

    #[test]
    fn test_unknown_key_errors() {
        let mut tuning = Tuning::default();
        let overrides = HashMap::from([("nonexistent_field".to_string(), serde_json::json!(1.0))]);
        let err = apply_overrides(&mut tuning, &overrides)
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown override key"));
        assert!(err.contains("nonexistent_field"));
    }

    #[test]
    fn test_type_mismatch_errors() {
        let mut tuning = Tuning::default();
        let overrides = HashMap::from([(
            "replan_interval".to_string(),
            serde_json::json!("not_a_number"),
        )]);
        assert!(apply_overrides(&mut tuning, &overrides).is_err());
        let fractional = HashMap::from([("deposits".to_string(), serde_json::json!(2.5))]);
        assert!(apply_overrides(&mut tuning, &fractional).is_err());
    }
}
