//! Turning a waypoint into a velocity command.

use crate::astar::{Path, Waypoint};
use crate::config::PlannerConfig;
use crate::geometry::Vec2;
use crate::targeting::choose_goal;
use crate::visibility::PlanNode;
use crate::world::WorldQuery;
use crate::{Command, LineSegment, ObjectId, PolicyParams, WorldObject};

/// Head for `target` at `max_speed`, or at half of it while the current
/// heading is off by more than `alignment_threshold` radians.
pub fn next_command<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    target: Vec2,
    max_speed: f64,
    alignment_threshold: f64,
) -> Command {
    let displacement = world.shortest_distance_vector(craft.position, target);
    let Some(direction) = displacement.normalized() else {
        return Command::Hold;
    };
    // A stationary craft has no heading to be off from.
    let aligned = craft
        .velocity
        .normalized()
        .map_or(true, |heading| heading.angle_between(direction) <= alignment_threshold);
    let speed = if aligned { max_speed } else { max_speed * 0.5 };
    Command::Move {
        velocity: direction * speed,
        target,
    }
}

/// Graph-free fallback: steer straight at whatever [`choose_goal`] picks.
pub fn instinct_command<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    policy: &PolicyParams,
    config: &PlannerConfig,
    claimed: &[ObjectId],
) -> Command {
    match choose_goal(world, craft, policy, config, claimed) {
        Some((goal, _)) => next_command(
            world,
            craft,
            goal.position,
            policy.max_speed,
            config.alignment_threshold(),
        ),
        None => Command::Hold,
    }
}

/// True once the craft is within arrival range of `waypoint`, or when the
/// waypoint's object no longer exists.
pub fn waypoint_reached<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    waypoint: &Waypoint,
    config: &PlannerConfig,
) -> bool {
    match waypoint.live_position(world) {
        Some(position) => {
            world.shortest_distance(craft.position, position)
                <= craft.radius * config.arrival_multiplier
        }
        None => matches!(waypoint.plan, PlanNode::Object(_)),
    }
}

/// One segment per remaining hop, from the craft to the goal.
pub fn path_overlay<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    path: &Path,
) -> Vec<LineSegment> {
    let mut from = craft.position;
    path.iter()
        .map(|waypoint| {
            let to = waypoint.live_position(world).unwrap_or(waypoint.position);
            let segment = LineSegment {
                from,
                delta: world.shortest_distance_vector(from, to),
            };
            from = to;
            segment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{craft, deposit, small_planner_config, small_world};
    use std::f64::consts::FRAC_PI_4;

    fn speed_of(command: Command) -> f64 {
        match command {
            Command::Move { velocity, .. } => velocity.length(),
            Command::Hold => 0.0,
        }
    }

    #[test]
    fn aligned_craft_gets_full_speed() {
        let mut me = craft(1, Vec2::ZERO);
        me.velocity = Vec2::new(1.0, 0.1);
        let world = small_world(vec![me.clone()]);
        let command = next_command(&world, &me, Vec2::new(3.0, 0.0), 10.0, FRAC_PI_4);
        assert!((speed_of(command) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn misaligned_craft_slows_to_half() {
        let mut me = craft(1, Vec2::ZERO);
        me.velocity = Vec2::new(0.0, 1.0);
        let world = small_world(vec![me.clone()]);
        let command = next_command(&world, &me, Vec2::new(3.0, 0.0), 10.0, FRAC_PI_4);
        assert!((speed_of(command) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn stationary_craft_counts_as_aligned() {
        let me = craft(1, Vec2::ZERO);
        let world = small_world(vec![me.clone()]);
        let command = next_command(&world, &me, Vec2::new(0.0, 2.0), 10.0, FRAC_PI_4);
        assert!((speed_of(command) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn steering_follows_the_wrapped_direction() {
        let me = craft(1, Vec2::new(0.5, 5.0));
        let world = small_world(vec![me.clone()]);
        match next_command(&world, &me, Vec2::new(9.5, 5.0), 10.0, FRAC_PI_4) {
            Command::Move { velocity, .. } => assert!(velocity.x < 0.0, "short way is leftward"),
            Command::Hold => panic!("expected a move"),
        }
    }

    #[test]
    fn zero_displacement_holds() {
        let me = craft(1, Vec2::new(2.0, 2.0));
        let world = small_world(vec![me.clone()]);
        assert_eq!(next_command(&world, &me, me.position, 10.0, FRAC_PI_4), Command::Hold);
    }

    #[test]
    fn instinct_without_candidates_holds() {
        let me = craft(1, Vec2::ZERO);
        let world = small_world(vec![me.clone()]);
        let command = instinct_command(
            &world,
            &me,
            &PolicyParams::default(),
            &small_planner_config(),
            &[],
        );
        assert_eq!(command, Command::Hold);
    }

    #[test]
    fn instinct_heads_for_nearest_prospect() {
        let me = craft(1, Vec2::ZERO);
        let target = deposit(2, Vec2::new(2.0, 0.0), 10.0);
        let world = small_world(vec![me.clone(), target.clone()]);
        let command = instinct_command(
            &world,
            &me,
            &PolicyParams::default(),
            &small_planner_config(),
            &[],
        );
        assert!(matches!(command, Command::Move { target: t, .. } if t == target.position));
    }

    #[test]
    fn vanished_object_waypoint_counts_as_reached() {
        let me = craft(1, Vec2::ZERO);
        let world = small_world(vec![me.clone()]);
        let gone = Waypoint {
            plan: PlanNode::Object(ObjectId::from(99)),
            position: Vec2::new(4.0, 4.0),
        };
        assert!(waypoint_reached(&world, &me, &gone, &small_planner_config()));

        let bypass = Waypoint {
            plan: PlanNode::Bypass(Vec2::new(4.0, 4.0)),
            position: Vec2::new(4.0, 4.0),
        };
        assert!(!waypoint_reached(&world, &me, &bypass, &small_planner_config()));
    }
}
