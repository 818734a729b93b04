//! Best-first search over a [`VisibilityGraph`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::geometry::Vec2;
use crate::visibility::{NodeIndex, PlanNode, VisibilityGraph};
use crate::world::WorldQuery;
use crate::{ObjectKind, WorldObject};

/// Heuristic multiplier making energy waypoints attractive stepping stones.
pub const WAYPOINT_DISCOUNT: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub plan: PlanNode,
    /// Position at plan time. Objects may have moved since.
    pub position: Vec2,
}

impl Waypoint {
    /// Current position: the live object for object waypoints, the fixed point
    /// for bypasses. `None` once the object is gone.
    pub fn live_position<W: WorldQuery + ?Sized>(&self, world: &W) -> Option<Vec2> {
        match self.plan {
            PlanNode::Bypass(point) => Some(point),
            PlanNode::Object(id) => world
                .object(id)
                .filter(|object| object.alive)
                .map(|object| object.position),
        }
    }
}

/// Waypoint stack. The top is the next waypoint, the bottom is the goal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    stack: Vec<Waypoint>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> Option<&Waypoint> {
        self.stack.last()
    }

    pub fn pop(&mut self) -> Option<Waypoint> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn goal(&self) -> Option<&Waypoint> {
        self.stack.first()
    }

    /// Waypoints in travel order, next first.
    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.stack.iter().rev()
    }
}

/// Estimated remaining cost from `node` to `goal` for `craft`.
///
/// Impassable nodes get `+∞`: unmineable deposits, depots not owned by the
/// craft's team (unless the depot is the goal), other craft and ghosts.
pub fn heuristic(
    graph: &VisibilityGraph,
    node: NodeIndex,
    goal: NodeIndex,
    craft: &WorldObject,
) -> f64 {
    let torus = graph.torus();
    let from = graph.node(node);
    let target = graph.node(goal);
    let distance = torus.distance(from.position, target.position);

    let PlanNode::Object(id) = from.plan else {
        return distance;
    };
    let Some(object) = graph.object(id) else {
        return distance;
    };
    let goal_is_waypoint = matches!(
        target.plan,
        PlanNode::Object(goal_id)
            if graph.object(goal_id).is_some_and(|g| g.kind == ObjectKind::Waypoint)
    );

    match object.kind {
        ObjectKind::ResourceDeposit if !object.mineable => f64::INFINITY,
        ObjectKind::Depot if node != goal && !object.is_owned_by(craft.team.as_ref()) => {
            f64::INFINITY
        }
        ObjectKind::MobileCraft if object.id != craft.id => f64::INFINITY,
        ObjectKind::ObstacleGhost => f64::INFINITY,
        ObjectKind::Waypoint if !goal_is_waypoint => distance * WAYPOINT_DISCOUNT,
        _ => distance,
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    node: NodeIndex,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// A* from `start` to `goal`. Returns an empty path when the goal is
/// unreachable. Leaves each node's final `g` and `h` in the graph.
pub fn plan(
    graph: &mut VisibilityGraph,
    start: NodeIndex,
    goal: NodeIndex,
    craft: &WorldObject,
) -> Path {
    if start.0 >= graph.len() || goal.0 >= graph.len() {
        return Path::new();
    }
    graph.reset_search();
    let torus = graph.torus();
    let goal_plan = graph.node(goal).plan;

    let mut closed = vec![false; graph.len()];
    let mut predecessor: Vec<Option<NodeIndex>> = vec![None; graph.len()];
    let mut open = BinaryHeap::new();

    let start_h = heuristic(graph, start, goal, craft);
    {
        let node = graph.node_mut(start);
        node.g = 0.0;
        node.h = start_h;
    }
    open.push(Reverse(OpenEntry {
        f: start_h,
        node: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        let current = entry.node;
        if closed[current.0] || entry.f > graph.node(current).f() {
            continue;
        }
        if graph.node(current).plan == goal_plan {
            return reconstruct(graph, &predecessor, start, current);
        }
        closed[current.0] = true;

        let current_position = graph.node(current).position;
        let current_g = graph.node(current).g;
        let neighbors: Vec<NodeIndex> = graph.neighbors(current).to_vec();
        for next in neighbors {
            if closed[next.0] {
                continue;
            }
            let h = heuristic(graph, next, goal, craft);
            if h.is_infinite() {
                closed[next.0] = true;
                continue;
            }
            let tentative_g =
                current_g + torus.distance(current_position, graph.node(next).position);

            let node = graph.node_mut(next);
            let previous_f = node.f();
            if h < node.h {
                node.h = h;
            }
            if tentative_g < node.g {
                node.g = tentative_g;
            }
            let f = node.f();
            if f < previous_f || predecessor[next.0].is_none() {
                predecessor[next.0] = Some(current);
                open.push(Reverse(OpenEntry { f, node: next }));
            }
        }
    }
    Path::new()
}

fn reconstruct(
    graph: &VisibilityGraph,
    predecessor: &[Option<NodeIndex>],
    start: NodeIndex,
    reached: NodeIndex,
) -> Path {
    let mut stack = Vec::new();
    let mut cursor = reached;
    while cursor != start {
        let node = graph.node(cursor);
        stack.push(Waypoint {
            plan: node.plan,
            position: node.position,
        });
        match predecessor[cursor.0] {
            Some(previous) => cursor = previous,
            None => return Path::new(),
        }
    }
    Path { stack }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{craft, deposit, small_planner_config, small_world, waypoint};
    use crate::visibility::build_graph;

    #[test]
    fn waypoint_discount_applies_unless_goal_is_a_waypoint() {
        let me = craft(1, Vec2::ZERO);
        let pickup = waypoint(2, Vec2::new(2.0, 0.0));
        let target = deposit(3, Vec2::new(6.0, 0.0), 50.0);
        let world = small_world(vec![me.clone(), pickup.clone(), target.clone()]);
        let config = small_planner_config();

        let graph = build_graph(&world, &me, &target, &config);
        let pickup_index = graph.index_of(pickup.id).expect("pickup in graph");
        let h = heuristic(&graph, pickup_index, graph.goal(), &me);
        assert!((h - 4.0 * WAYPOINT_DISCOUNT).abs() < 1e-9);

        let other_pickup = waypoint(4, Vec2::new(2.0, 2.0));
        let world = small_world(vec![me.clone(), pickup.clone(), other_pickup.clone()]);
        let graph = build_graph(&world, &me, &pickup, &config);
        let other_index = graph.index_of(other_pickup.id).expect("other pickup in graph");
        let h = heuristic(&graph, other_index, graph.goal(), &me);
        assert!(
            (h - 2.0).abs() < 1e-9,
            "heading for a waypoint, other waypoints get no discount"
        );
    }

    #[test]
    fn out_of_range_goal_yields_empty_path() {
        let me = craft(1, Vec2::ZERO);
        let target = deposit(2, Vec2::new(3.0, 0.0), 50.0);
        let world = small_world(vec![me.clone(), target.clone()]);
        let mut graph = build_graph(&world, &me, &target, &small_planner_config());
        let (start, goal) = (graph.start(), graph.goal());

        // Out-of-range indices are a failed search, not a panic.
        assert!(plan(&mut graph, start, NodeIndex(42), &me).is_empty());
        assert!(!plan(&mut graph, start, goal, &me).is_empty());
    }

    #[test]
    fn path_stack_pops_next_waypoint_first() {
        let mut path = Path {
            stack: vec![
                Waypoint {
                    plan: PlanNode::Bypass(Vec2::new(9.0, 0.0)),
                    position: Vec2::new(9.0, 0.0),
                },
                Waypoint {
                    plan: PlanNode::Bypass(Vec2::new(1.0, 0.0)),
                    position: Vec2::new(1.0, 0.0),
                },
            ],
        };
        assert_eq!(path.goal().map(|w| w.position), Some(Vec2::new(9.0, 0.0)));
        assert_eq!(path.pop().map(|w| w.position), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(path.len(), 1);
        path.clear();
        assert!(path.is_empty());
    }
}
