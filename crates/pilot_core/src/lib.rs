//! `pilot_core`: per-tick decision core for a mining pilot on a toroidal plane.
//!
//! No IO, no logging, no clocks. Everything a planning epoch needs arrives through
//! a [`WorldQuery`] and plain configuration values.

mod astar;
mod config;
mod geometry;
mod id;
mod steering;
mod targeting;
mod types;
mod visibility;
mod world;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use astar::{heuristic, plan, Path, Waypoint, WAYPOINT_DISCOUNT};
pub use config::PlannerConfig;
pub use geometry::{Torus, Vec2};
pub use id::generate_object_id;
pub use steering::{instinct_command, next_command, path_overlay, waypoint_reached};
pub use targeting::{
    choose_goal, nearest_friendly_depot, nearest_prospect, nearest_refuel, nearest_waypoint,
    richest_prospect, Errand,
};
pub use types::*;
pub use visibility::{build_graph, GraphNode, NodeIndex, PlanNode, VisibilityGraph};
pub use world::{WorldQuery, WorldSnapshot};
