//! Shared test fixtures for pilot_core and downstream crates.
//!
//! Builders for each object kind on a 10 × 10 torus. Craft and depots belong to
//! [`home_team`] unless stated otherwise; ids come from small integers so tests
//! can refer to them with `ObjectId::from(n)`.

use crate::{ObjectId, ObjectKind, PlannerConfig, TeamId, Torus, Vec2, WorldObject, WorldSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const CRAFT_RADIUS: f64 = 0.1;
pub const BODY_RADIUS: f64 = 0.5;

pub fn home_team() -> TeamId {
    TeamId("team_home".to_string())
}

pub fn rival_team() -> TeamId {
    TeamId("team_rival".to_string())
}

pub fn craft(id: u128, position: Vec2) -> WorldObject {
    let mut object = WorldObject::new(
        ObjectId::from(id),
        ObjectKind::MobileCraft,
        position,
        CRAFT_RADIUS,
    );
    object.team = Some(home_team());
    object.energy = Some(5000.0);
    object.resources = Some(0.0);
    object
}

pub fn rival_craft(id: u128, position: Vec2) -> WorldObject {
    let mut object = craft(id, position);
    object.team = Some(rival_team());
    object
}

/// Mineable deposit holding `resources`.
pub fn deposit(id: u128, position: Vec2, resources: f64) -> WorldObject {
    let mut object = WorldObject::new(
        ObjectId::from(id),
        ObjectKind::ResourceDeposit,
        position,
        BODY_RADIUS,
    );
    object.resources = Some(resources);
    object.mineable = true;
    object
}

/// Unmineable deposit: an obstacle the planner must route around.
pub fn blocker(id: u128, position: Vec2, radius: f64) -> WorldObject {
    let mut object = WorldObject::new(
        ObjectId::from(id),
        ObjectKind::ResourceDeposit,
        position,
        radius,
    );
    object.resources = Some(0.0);
    object
}

pub fn depot(id: u128, position: Vec2) -> WorldObject {
    let mut object = WorldObject::new(ObjectId::from(id), ObjectKind::Depot, position, BODY_RADIUS);
    object.team = Some(home_team());
    object.energy = Some(5000.0);
    object.resources = Some(0.0);
    object
}

pub fn rival_depot(id: u128, position: Vec2) -> WorldObject {
    let mut object = depot(id, position);
    object.team = Some(rival_team());
    object
}

pub fn waypoint(id: u128, position: Vec2) -> WorldObject {
    let mut object = WorldObject::new(ObjectId::from(id), ObjectKind::Waypoint, position, 0.2);
    object.energy = Some(500.0);
    object
}

pub fn ghost(id: u128, position: Vec2) -> WorldObject {
    WorldObject::new(ObjectId::from(id), ObjectKind::ObstacleGhost, position, 0.2)
}

pub fn small_world(objects: Vec<WorldObject>) -> WorldSnapshot {
    WorldSnapshot::with_objects(Torus::new(10.0, 10.0), objects)
}

/// Planner tuning scaled down to the 10 × 10 world.
pub fn small_planner_config() -> PlannerConfig {
    PlannerConfig {
        field_of_view: 5.0,
        close_escape: 5.0,
        ..PlannerConfig::default()
    }
}

pub fn seeded_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
