//! Per-craft planning state.
//!
//! A [`Pilot`] owns the current path of one craft, replans on a fixed cadence
//! and falls back to instinct steering when no path exists.

use pilot_core::{
    build_graph, choose_goal, instinct_command, nearest_friendly_depot, next_command,
    path_overlay, plan, waypoint_reached, Command, LineSegment, ObjectId, Path, PlannerConfig,
    PolicyParams, Vec2, WorldObject, WorldQuery,
};
use serde::{Deserialize, Serialize};

use crate::evolution::CandidateTicket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Chases the richest deposit on the map.
    Prospector,
    /// Flies to the planned depot site while the team expands.
    Surveyor,
    Miner,
}

/// What the commander wants from a pilot this tick.
#[derive(Debug, Clone, Copy)]
pub enum Directive<'w> {
    /// Refuel, unload or prospect as the policy dictates.
    Errands,
    /// Head for this object unless fuel or cargo demand otherwise.
    Pursue(&'w WorldObject),
    /// Fly straight to a point.
    Site(Vec2),
}

#[derive(Debug, Clone)]
pub struct Pilot {
    craft_id: ObjectId,
    ticket: CandidateTicket,
    policy: PolicyParams,
    role: Role,
    path: Path,
    ticks_since_plan: u32,
    goal: Option<ObjectId>,
    enrolled_score: f64,
}

impl Pilot {
    pub fn new(
        craft_id: ObjectId,
        ticket: CandidateTicket,
        policy: PolicyParams,
        role: Role,
        enrolled_score: f64,
    ) -> Self {
        Self {
            craft_id,
            ticket,
            policy,
            role,
            path: Path::new(),
            ticks_since_plan: 0,
            goal: None,
            enrolled_score,
        }
    }

    pub fn craft_id(&self) -> ObjectId {
        self.craft_id
    }

    pub fn ticket(&self) -> CandidateTicket {
        self.ticket
    }

    pub fn policy(&self) -> &PolicyParams {
        &self.policy
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object this pilot is currently heading for, if any.
    pub fn goal(&self) -> Option<ObjectId> {
        self.goal
    }

    pub fn enrolled_score(&self) -> f64 {
        self.enrolled_score
    }

    /// Produces this tick's command for `craft`.
    pub fn execute<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        craft: &WorldObject,
        config: &PlannerConfig,
        claimed: &[ObjectId],
        directive: Directive<'_>,
    ) -> Command {
        let goal = match directive {
            Directive::Site(point) => {
                self.path.clear();
                self.goal = None;
                return next_command(
                    world,
                    craft,
                    point,
                    self.policy.max_speed,
                    config.alignment_threshold(),
                );
            }
            Directive::Pursue(target)
                if !self.policy.needs_fuel(craft) && !self.policy.cargo_full(craft) =>
            {
                Some(target)
            }
            Directive::Pursue(_) | Directive::Errands => {
                choose_goal(world, craft, &self.policy, config, claimed).map(|(goal, _)| goal)
            }
        };
        let Some(goal) = goal else {
            self.path.clear();
            self.goal = None;
            return Command::Hold;
        };

        let stale = self.goal != Some(goal.id)
            || self.path.is_empty()
            || self.ticks_since_plan >= config.replan_interval;
        self.goal = Some(goal.id);
        if stale {
            let mut graph = build_graph(world, craft, goal, config);
            let (start, end) = (graph.start(), graph.goal());
            self.path = plan(&mut graph, start, end, craft);
            self.ticks_since_plan = 0;
            tracing::debug!(
                craft = %self.craft_id,
                goal = %goal.id,
                nodes = graph.len(),
                hops = self.path.len(),
                "replanned"
            );
        }
        self.ticks_since_plan += 1;

        let Some(next) = self.path.peek() else {
            tracing::debug!(craft = %self.craft_id, "no path, steering on instinct");
            return instinct_command(world, craft, &self.policy, config, claimed);
        };
        let target = next.live_position(world).unwrap_or(next.position);
        next_command(
            world,
            craft,
            target,
            self.policy.max_speed,
            config.alignment_threshold(),
        )
    }

    /// Drops the top waypoint once it has been reached or has vanished.
    pub fn assess<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        craft: &WorldObject,
        config: &PlannerConfig,
    ) {
        let reached = self
            .path
            .peek()
            .is_some_and(|waypoint| waypoint_reached(world, craft, waypoint, config));
        if reached {
            self.path.pop();
        }
    }

    pub fn overlay<W: WorldQuery + ?Sized>(&self, world: &W, craft: &WorldObject) -> Vec<LineSegment> {
        path_overlay(world, craft, &self.path)
    }

    /// True when the craft is at least `frontier` away from every friendly
    /// depot, making it a candidate site for a new one.
    pub fn wants_depot<W: WorldQuery + ?Sized>(&self, world: &W, craft: &WorldObject) -> bool {
        nearest_friendly_depot(world, craft.position, craft.team.as_ref()).map_or(true, |depot| {
            world.shortest_distance(craft.position, depot.position) >= self.policy.frontier
        })
    }
}
