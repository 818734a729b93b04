//! Type definitions for `pilot_core`.
//!
//! World object snapshots, ID newtypes, and the commands the core emits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Vec2;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    MobileCraft,
    ResourceDeposit,
    Depot,
    /// Transient energy pickup.
    Waypoint,
    /// Projectiles and other short-lived bodies. Never routed through.
    ObstacleGhost,
}

/// Read-only snapshot of one world body for a single planning tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec2,
    #[serde(default)]
    pub velocity: Vec2,
    pub radius: f64,
    #[serde(default)]
    pub team: Option<TeamId>,
    /// Carried cargo for craft, remaining value for deposits.
    #[serde(default)]
    pub resources: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub mineable: bool,
    #[serde(default = "default_alive")]
    pub alive: bool,
}

fn default_alive() -> bool {
    true
}

impl WorldObject {
    pub fn new(id: ObjectId, kind: ObjectKind, position: Vec2, radius: f64) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            radius,
            team: None,
            resources: None,
            energy: None,
            mineable: false,
            alive: true,
        }
    }

    /// True when the object belongs to `team`. A team-less asker owns nothing.
    pub fn is_owned_by(&self, team: Option<&TeamId>) -> bool {
        matches!((self.team.as_ref(), team), (Some(mine), Some(theirs)) if mine == theirs)
    }

    pub fn cargo(&self) -> f64 {
        self.resources.unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Policy and output
// ---------------------------------------------------------------------------

/// Numeric constants steering a single pilot. Usually decoded from a genome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    /// Energy below which the pilot heads for a refuel source.
    pub fuel_return: f64,
    /// Cargo above which the pilot heads home to unload.
    pub cargo_capacity: f64,
    pub max_speed: f64,
    /// Minimum spacing between friendly depots when siting a new one.
    pub frontier: f64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            fuel_return: 1000.0,
            cargo_capacity: 1500.0,
            max_speed: 100.0,
            frontier: 250.0,
        }
    }
}

impl PolicyParams {
    pub fn needs_fuel(&self, craft: &WorldObject) -> bool {
        craft.energy.is_some_and(|energy| energy < self.fuel_return)
    }

    pub fn cargo_full(&self, craft: &WorldObject) -> bool {
        craft.cargo() > self.cargo_capacity
    }
}

/// Velocity command for the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Move { velocity: Vec2, target: Vec2 },
    Hold,
}

/// Debug overlay segment; purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: Vec2,
    /// Shortest displacement to the segment's end (may cross a wrap edge).
    pub delta: Vec2,
}
