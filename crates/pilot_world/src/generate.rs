//! Seeded world generation.

use anyhow::{Context, Result};
use pilot_core::{
    generate_object_id, ObjectId, ObjectKind, TeamId, Torus, Vec2, WorldObject, WorldQuery,
    WorldSnapshot,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    pub width: f64,
    pub height: f64,
    pub teams: Vec<TeamId>,
    pub craft_per_team: usize,
    pub depots_per_team: usize,
    pub deposits: usize,
    /// `[min, max]` resources of a fresh mineable deposit.
    pub deposit_resources: [f64; 2],
    /// Large bodies nobody can mine; the main reason bypasses exist.
    pub unmineable_deposits: usize,
    pub waypoints: usize,
    pub craft_radius: f64,
    pub depot_radius: f64,
    pub deposit_radius: f64,
    pub unmineable_radius: f64,
    pub waypoint_radius: f64,
    pub craft_energy: f64,
    pub depot_energy: f64,
    pub waypoint_energy: f64,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1080.0,
            teams: vec![TeamId("blue".to_string()), TeamId("red".to_string())],
            craft_per_team: 2,
            depots_per_team: 1,
            deposits: 40,
            deposit_resources: [200.0, 1200.0],
            unmineable_deposits: 10,
            waypoints: 8,
            craft_radius: 10.0,
            depot_radius: 20.0,
            deposit_radius: 8.0,
            unmineable_radius: 30.0,
            waypoint_radius: 5.0,
            craft_energy: 5000.0,
            depot_energy: 5000.0,
            waypoint_energy: 2500.0,
        }
    }
}

impl WorldGenConfig {
    pub fn torus(&self) -> Torus {
        Torus::new(self.width, self.height)
    }

    pub fn craft(&self, id: ObjectId, team: &TeamId, position: Vec2) -> WorldObject {
        let mut craft = WorldObject::new(id, ObjectKind::MobileCraft, position, self.craft_radius);
        craft.team = Some(team.clone());
        craft.energy = Some(self.craft_energy);
        craft.resources = Some(0.0);
        craft
    }

    pub fn depot(&self, id: ObjectId, team: &TeamId, position: Vec2) -> WorldObject {
        let mut depot = WorldObject::new(id, ObjectKind::Depot, position, self.depot_radius);
        depot.team = Some(team.clone());
        depot.energy = Some(self.depot_energy);
        depot
    }

    pub fn waypoint(&self, id: ObjectId, position: Vec2) -> WorldObject {
        let mut waypoint =
            WorldObject::new(id, ObjectKind::Waypoint, position, self.waypoint_radius);
        waypoint.energy = Some(self.waypoint_energy);
        waypoint
    }
}

/// Lays out depots, craft, deposits and waypoints at random free locations.
/// Each team's craft start next to its first depot.
pub fn build_world(config: &WorldGenConfig, rng: &mut impl Rng) -> Result<WorldSnapshot> {
    let mut world = WorldSnapshot::new(config.torus());

    for team in &config.teams {
        let mut home = None;
        for _ in 0..config.depots_per_team {
            let position = free_spot(&world, rng, config.depot_radius * 4.0)
                .with_context(|| format!("placing a depot for team {team}"))?;
            if home.is_none() {
                home = Some(position);
            }
            let depot = config.depot(generate_object_id(rng), team, position);
            world.objects.push(depot);
        }
        for index in 0..config.craft_per_team {
            let position = match home {
                Some(depot) => {
                    let angle = std::f64::consts::TAU * index as f64 / config.craft_per_team as f64;
                    let offset = Vec2::new(1.0, 0.0).rotated(angle)
                        * (config.depot_radius + config.craft_radius * 3.0);
                    world.torus.wrap(depot + offset)
                }
                None => free_spot(&world, rng, config.craft_radius)
                    .with_context(|| format!("placing a craft for team {team}"))?,
            };
            let craft = config.craft(generate_object_id(rng), team, position);
            world.objects.push(craft);
        }
    }

    for _ in 0..config.unmineable_deposits {
        let position = free_spot(&world, rng, config.unmineable_radius * 2.0)
            .context("placing an unmineable deposit")?;
        let mut rock = WorldObject::new(
            generate_object_id(rng),
            ObjectKind::ResourceDeposit,
            position,
            config.unmineable_radius,
        );
        rock.resources = Some(0.0);
        world.objects.push(rock);
    }

    for _ in 0..config.deposits {
        let position = free_spot(&world, rng, config.deposit_radius * 2.0)
            .context("placing a deposit")?;
        let [low, high] = config.deposit_resources;
        let mut deposit = WorldObject::new(
            generate_object_id(rng),
            ObjectKind::ResourceDeposit,
            position,
            config.deposit_radius,
        );
        deposit.resources = Some(if high > low { rng.gen_range(low..high) } else { low });
        deposit.mineable = true;
        world.objects.push(deposit);
    }

    for _ in 0..config.waypoints {
        let position = free_spot(&world, rng, config.waypoint_radius * 2.0)
            .context("placing a waypoint")?;
        let waypoint = config.waypoint(generate_object_id(rng), position);
        world.objects.push(waypoint);
    }

    tracing::debug!(
        objects = world.objects.len(),
        teams = config.teams.len(),
        "built world"
    );
    Ok(world)
}

fn free_spot(world: &WorldSnapshot, rng: &mut impl Rng, radius: f64) -> Result<Vec2> {
    world
        .random_free_location(rng, radius)
        .with_context(|| format!("no free location of radius {radius} left"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn count(world: &WorldSnapshot, kind: ObjectKind, team: Option<&TeamId>) -> usize {
        world
            .objects
            .iter()
            .filter(|o| o.kind == kind && (team.is_none() || o.is_owned_by(team)))
            .count()
    }

    #[test]
    fn same_seed_same_world() {
        let config = WorldGenConfig::default();
        let a = build_world(&config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b = build_world(&config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_team_gets_its_fleet_and_depots() {
        let config = WorldGenConfig::default();
        let world = build_world(&config, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        for team in &config.teams {
            assert_eq!(
                count(&world, ObjectKind::MobileCraft, Some(team)),
                config.craft_per_team
            );
            assert_eq!(
                count(&world, ObjectKind::Depot, Some(team)),
                config.depots_per_team
            );
        }
        assert_eq!(count(&world, ObjectKind::Waypoint, None), config.waypoints);
        let mineable = world
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::ResourceDeposit && o.mineable)
            .count();
        assert_eq!(mineable, config.deposits);
    }

    #[test]
    fn deposit_resources_stay_in_range() {
        let config = WorldGenConfig::default();
        let world = build_world(&config, &mut ChaCha8Rng::seed_from_u64(2)).unwrap();
        let [low, high] = config.deposit_resources;
        for deposit in world.objects.iter().filter(|o| o.mineable) {
            let resources = deposit.cargo();
            assert!((low..high).contains(&resources), "{resources} out of range");
        }
    }

    #[test]
    fn overcrowded_world_is_an_error() {
        let config = WorldGenConfig {
            width: 50.0,
            height: 50.0,
            unmineable_deposits: 50,
            ..WorldGenConfig::default()
        };
        assert!(build_world(&config, &mut ChaCha8Rng::seed_from_u64(3)).is_err());
    }
}
