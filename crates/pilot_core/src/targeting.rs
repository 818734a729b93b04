//! Goal selection: which object a craft should head for right now.
//!
//! Finders skip objects listed in `claimed`, which the caller fills with the
//! goals of the team's other craft.

use crate::config::PlannerConfig;
use crate::geometry::Vec2;
use crate::world::WorldQuery;
use crate::{ObjectId, ObjectKind, PolicyParams, TeamId, WorldObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errand {
    Refuel,
    Unload,
    Prospect,
}

fn nearest_matching<'w, W, F>(world: &'w W, from: Vec2, predicate: F) -> Option<&'w WorldObject>
where
    W: WorldQuery + ?Sized,
    F: Fn(&WorldObject) -> bool,
{
    let torus = world.torus();
    world
        .objects()
        .iter()
        .filter(|object| object.alive && predicate(object))
        .min_by(|a, b| {
            torus
                .distance(from, a.position)
                .total_cmp(&torus.distance(from, b.position))
        })
}

pub fn nearest_friendly_depot<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    from: Vec2,
    team: Option<&TeamId>,
) -> Option<&'w WorldObject> {
    nearest_matching(world, from, |object| {
        object.kind == ObjectKind::Depot && object.is_owned_by(team)
    })
}

pub fn nearest_waypoint<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    from: Vec2,
    claimed: &[ObjectId],
) -> Option<&'w WorldObject> {
    nearest_matching(world, from, |object| {
        object.kind == ObjectKind::Waypoint && !claimed.contains(&object.id)
    })
}

/// Closer of the nearest unclaimed waypoint and the nearest friendly depot
/// holding at least `min_depot_energy`. With neither available, any friendly
/// depot will do.
pub fn nearest_refuel<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    craft: &WorldObject,
    min_depot_energy: f64,
    claimed: &[ObjectId],
) -> Option<&'w WorldObject> {
    let torus = world.torus();
    let team = craft.team.as_ref();
    let stocked = nearest_matching(world, craft.position, |object| {
        object.kind == ObjectKind::Depot
            && object.is_owned_by(team)
            && object.energy.unwrap_or(0.0) >= min_depot_energy
    });
    let pickup = nearest_waypoint(world, craft.position, claimed);

    match (stocked, pickup) {
        (Some(depot), Some(waypoint)) => {
            let to_depot = torus.distance(craft.position, depot.position);
            let to_waypoint = torus.distance(craft.position, waypoint.position);
            Some(if to_waypoint < to_depot { waypoint } else { depot })
        }
        (Some(depot), None) => Some(depot),
        (None, Some(waypoint)) => Some(waypoint),
        (None, None) => nearest_friendly_depot(world, craft.position, team),
    }
}

fn is_prospect(object: &WorldObject, claimed: &[ObjectId]) -> bool {
    object.kind == ObjectKind::ResourceDeposit
        && object.mineable
        && object.cargo() > 0.0
        && !claimed.contains(&object.id)
}

/// Nearest unclaimed mineable deposit reachable in a straight line past the
/// unmineable ones.
pub fn nearest_prospect<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    craft: &WorldObject,
    config: &PlannerConfig,
    claimed: &[ObjectId],
) -> Option<&'w WorldObject> {
    let obstacles: Vec<&WorldObject> = world
        .objects()
        .iter()
        .filter(|object| {
            object.alive && object.kind == ObjectKind::ResourceDeposit && !object.mineable
        })
        .collect();
    let clearance = craft.radius * config.clearance_factor;
    nearest_matching(world, craft.position, |object| {
        is_prospect(object, claimed)
            && world.is_path_clear(craft.position, object.position, &obstacles, clearance)
    })
}

/// The unclaimed mineable deposit holding the most resources.
pub fn richest_prospect<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    claimed: &[ObjectId],
) -> Option<&'w WorldObject> {
    world
        .objects()
        .iter()
        .filter(|object| object.alive && is_prospect(object, claimed))
        .max_by(|a, b| a.cargo().total_cmp(&b.cargo()))
}

/// Instinct goal: refuel when low, unload when full, otherwise prospect.
pub fn choose_goal<'w, W: WorldQuery + ?Sized>(
    world: &'w W,
    craft: &WorldObject,
    policy: &PolicyParams,
    config: &PlannerConfig,
    claimed: &[ObjectId],
) -> Option<(&'w WorldObject, Errand)> {
    if policy.needs_fuel(craft) {
        return nearest_refuel(world, craft, config.min_depot_energy, claimed)
            .map(|goal| (goal, Errand::Refuel));
    }
    if policy.cargo_full(craft) {
        return nearest_friendly_depot(world, craft.position, craft.team.as_ref())
            .map(|goal| (goal, Errand::Unload));
    }
    nearest_prospect(world, craft, config, claimed).map(|goal| (goal, Errand::Prospect))
}
