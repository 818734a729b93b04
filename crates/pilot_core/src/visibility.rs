//! Visibility graph over a craft's neighborhood.
//!
//! Built fresh for every planning call. Nodes live in an arena indexed by
//! [`NodeIndex`]; a node is either a real world object or a synthesized bypass
//! point next to an obstruction.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::config::PlannerConfig;
use crate::geometry::{Torus, Vec2};
use crate::targeting::{nearest_friendly_depot, nearest_waypoint};
use crate::world::WorldQuery;
use crate::{ObjectId, ObjectKind, WorldObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanNode {
    Object(ObjectId),
    Bypass(Vec2),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub plan: PlanNode,
    pub position: Vec2,
    /// Accumulated path cost; `+∞` until reached.
    pub g: f64,
    /// Heuristic estimate to the goal; `+∞` until evaluated.
    pub h: f64,
}

impl GraphNode {
    fn new(plan: PlanNode, position: Vec2) -> Self {
        Self {
            plan,
            position,
            g: f64::INFINITY,
            h: f64::INFINITY,
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self.plan, PlanNode::Bypass(_))
    }

    pub fn f(&self) -> f64 {
        self.g + self.h
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityGraph {
    torus: Torus,
    nodes: Vec<GraphNode>,
    edges: Vec<SmallVec<[NodeIndex; 8]>>,
    by_object: AHashMap<ObjectId, NodeIndex>,
    objects: AHashMap<ObjectId, WorldObject>,
    goal: NodeIndex,
}

impl VisibilityGraph {
    fn new(torus: Torus) -> Self {
        Self {
            torus,
            nodes: Vec::new(),
            edges: Vec::new(),
            by_object: AHashMap::new(),
            objects: AHashMap::new(),
            goal: NodeIndex(0),
        }
    }

    fn add_object(&mut self, object: &WorldObject) -> NodeIndex {
        if let Some(&index) = self.by_object.get(&object.id) {
            return index;
        }
        let index = self.add_node(PlanNode::Object(object.id), object.position);
        self.by_object.insert(object.id, index);
        self.objects.insert(object.id, object.clone());
        index
    }

    fn add_node(&mut self, plan: PlanNode, position: Vec2) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(GraphNode::new(plan, position));
        self.edges.push(SmallVec::new());
        index
    }

    /// Adds `from → to`. Self-edges, duplicates and dangling indices are refused.
    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to || to.0 >= self.nodes.len() {
            return false;
        }
        let Some(adjacent) = self.edges.get_mut(from.0) else {
            return false;
        };
        if adjacent.contains(&to) {
            return false;
        }
        adjacent.push(to);
        true
    }

    pub fn torus(&self) -> Torus {
        self.torus
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The planning craft is always the first node.
    pub fn start(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn goal(&self) -> NodeIndex {
        self.goal
    }

    pub fn node(&self, index: NodeIndex) -> &GraphNode {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut GraphNode {
        &mut self.nodes[index.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    pub fn neighbors(&self, index: NodeIndex) -> &[NodeIndex] {
        self.edges.get(index.0).map_or(&[], |adjacent| adjacent.as_slice())
    }

    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.neighbors(from).contains(&to)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(SmallVec::len).sum()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<NodeIndex> {
        self.by_object.get(&id).copied()
    }

    /// Snapshot of the real object behind a node, taken at build time.
    pub fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub(crate) fn reset_search(&mut self) {
        for node in &mut self.nodes {
            node.g = f64::INFINITY;
            node.h = f64::INFINITY;
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Builds the visibility graph for one planning call of `craft` heading to
/// `goal`.
///
/// Members are the craft, every alive object within the field of view, the
/// nearest friendly depot, the nearest waypoint and the goal. For each ordered
/// member pair a direct edge is added when the segment clears every other
/// member; otherwise a single bypass node may be synthesized next to the
/// nearest blocker. Pairs ending at the craft never get a bypass: no plan
/// routes back into its own start node.
pub fn build_graph<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    goal: &WorldObject,
    config: &PlannerConfig,
) -> VisibilityGraph {
    let torus = world.torus();
    let mut members: Vec<&WorldObject> = vec![craft];

    let mut near = world.all_objects_near(craft.position, config.field_of_view);
    near.sort_by(|a, b| {
        torus
            .distance(craft.position, a.position)
            .total_cmp(&torus.distance(craft.position, b.position))
    });
    for object in near {
        push_member(&mut members, object);
    }
    if let Some(depot) = nearest_friendly_depot(world, craft.position, craft.team.as_ref()) {
        push_member(&mut members, depot);
    }
    if let Some(waypoint) = nearest_waypoint(world, craft.position, &[]) {
        push_member(&mut members, waypoint);
    }
    push_member(&mut members, goal);

    let mut graph = VisibilityGraph::new(torus);
    let indices: Vec<NodeIndex> = members.iter().map(|m| graph.add_object(m)).collect();
    graph.goal = graph.add_object(goal);

    let clearance = craft.radius * config.clearance_factor;
    for (a, from) in members.iter().enumerate() {
        for (b, to) in members.iter().enumerate() {
            if a == b {
                continue;
            }
            let others: Vec<&WorldObject> = members
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != a && *i != b)
                .map(|(_, object)| *object)
                .collect();
            if world.is_path_clear(from.position, to.position, &others, clearance) {
                graph.add_edge(indices[a], indices[b]);
                continue;
            }
            if indices[b] == graph.start() {
                continue;
            }
            if let Some(point) = synthesize_bypass(world, craft, from, to, &others, config) {
                let bypass = graph.add_node(PlanNode::Bypass(point), point);
                graph.add_edge(bypass, indices[b]);
                graph.add_edge(indices[a], bypass);
            }
        }
    }
    graph
}

fn push_member<'a>(members: &mut Vec<&'a WorldObject>, object: &'a WorldObject) {
    if !members.iter().any(|member| member.id == object.id) {
        members.push(object);
    }
}

/// Picks a free point beside the obstruction nearest to `from`, or `None` when
/// the pair should stay disconnected this tick.
fn synthesize_bypass<W: WorldQuery + ?Sized>(
    world: &W,
    craft: &WorldObject,
    from: &WorldObject,
    to: &WorldObject,
    others: &[&WorldObject],
    config: &PlannerConfig,
) -> Option<Vec2> {
    let torus = world.torus();
    let clearance = craft.radius * config.clearance_factor;
    let blocker = others
        .iter()
        .filter(|obstacle| !world.is_path_clear(from.position, to.position, &[**obstacle], clearance))
        .min_by(|a, b| {
            torus
                .distance(from.position, a.position)
                .total_cmp(&torus.distance(from.position, b.position))
        })?;

    if blocker.kind == ObjectKind::Waypoint {
        return None;
    }
    if torus.distance(from.position, blocker.position) > config.close_escape {
        return None;
    }

    let heading = torus.shortest_delta(from.position, blocker.position).normalized()?;
    let offset = blocker.radius + config.bypass_margin * craft.radius;
    let angle = config.bypass_angle_deg.to_radians();
    [angle, -angle]
        .into_iter()
        .map(|turn| torus.wrap(blocker.position + heading.rotated(turn) * offset))
        .find(|candidate| world.is_location_free(*candidate, clearance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{craft, deposit, depot, small_planner_config, small_world, waypoint};

    #[test]
    fn craft_is_first_node_and_goal_is_present() {
        let me = craft(1, Vec2::ZERO);
        let far_goal = deposit(2, Vec2::new(5.0, 5.0), 50.0);
        let world = small_world(vec![me.clone(), far_goal.clone()]);
        let mut config = small_planner_config();
        config.field_of_view = 1.0;

        let graph = build_graph(&world, &me, &far_goal, &config);
        assert_eq!(graph.node(graph.start()).plan, PlanNode::Object(me.id));
        assert_eq!(graph.node(graph.goal()).plan, PlanNode::Object(far_goal.id));
        assert_eq!(graph.len(), 2, "goal joins even outside the field of view");
    }

    #[test]
    fn duplicate_members_collapse_to_one_node() {
        let me = craft(1, Vec2::ZERO);
        let home = depot(2, Vec2::new(2.0, 0.0));
        let world = small_world(vec![me.clone(), home.clone()]);

        // The depot is near, the nearest friendly depot and the goal all at once.
        let graph = build_graph(&world, &me, &home, &small_planner_config());
        assert_eq!(graph.len(), 2);
        assert!(graph.has_edge(graph.start(), graph.goal()));
    }

    #[test]
    fn waypoint_blocker_is_never_bypassed() {
        let me = craft(1, Vec2::ZERO);
        let pickup = waypoint(2, Vec2::new(1.5, 0.0));
        let target = deposit(3, Vec2::new(3.0, 0.0), 50.0);
        let world = small_world(vec![me.clone(), pickup, target.clone()]);

        let graph = build_graph(&world, &me, &target, &small_planner_config());
        let target_index = graph.index_of(target.id).expect("goal is a member");
        assert!(!graph.has_edge(graph.start(), target_index));
        assert!(
            graph.nodes().all(|(_, node)| !node.is_bypass()),
            "a waypoint in the way is flown through, not around"
        );
    }

    #[test]
    fn distant_blocker_is_not_bypassed() {
        let me = craft(1, Vec2::ZERO);
        let rock = crate::test_fixtures::blocker(2, Vec2::new(1.5, 0.0), 0.5);
        let target = deposit(3, Vec2::new(3.0, 0.0), 50.0);
        let world = small_world(vec![me.clone(), rock, target.clone()]);
        let mut config = small_planner_config();
        config.close_escape = 1.0;

        let graph = build_graph(&world, &me, &target, &config);
        let target_index = graph.index_of(target.id).expect("goal is a member");
        assert!(!graph.has_edge(graph.start(), target_index));
        assert!(!graph
            .neighbors(graph.start())
            .iter()
            .any(|n| graph.node(*n).is_bypass()));
    }

    #[test]
    fn no_bypass_leads_back_to_the_craft() {
        let me = craft(1, Vec2::ZERO);
        let rock = crate::test_fixtures::blocker(2, Vec2::new(1.5, 0.0), 0.5);
        let target = deposit(3, Vec2::new(3.0, 0.0), 50.0);
        let world = small_world(vec![me.clone(), rock, target.clone()]);

        let graph = build_graph(&world, &me, &target, &small_planner_config());
        let bypasses: Vec<NodeIndex> = graph
            .nodes()
            .filter(|(_, node)| node.is_bypass())
            .map(|(index, _)| index)
            .collect();
        assert_eq!(bypasses.len(), 1);
        assert_eq!(graph.neighbors(bypasses[0]), [graph.goal()]);
        assert!(graph.has_edge(graph.start(), bypasses[0]));
    }

    #[test]
    fn bypass_point_keeps_corridor_clearance() {
        let me = craft(1, Vec2::ZERO);
        let rock = crate::test_fixtures::blocker(2, Vec2::new(1.5, 0.0), 0.5);
        let target = deposit(3, Vec2::new(3.0, 0.0), 50.0);
        // The +120° candidate sits at (1.1, 0.693). This body is 0.65 above it:
        // free for the bare hull (0.6) but inside the corridor clearance (0.7).
        let crowding = crate::test_fixtures::blocker(4, Vec2::new(1.1, 1.3428), 0.5);
        let world = small_world(vec![me.clone(), rock, target.clone(), crowding]);

        let graph = build_graph(&world, &me, &target, &small_planner_config());
        let bypass = graph
            .neighbors(graph.start())
            .iter()
            .copied()
            .find(|index| {
                graph.node(*index).is_bypass() && graph.neighbors(*index) == [graph.goal()]
            })
            .expect("rock still gets a bypass");
        assert!(
            graph.node(bypass).position.y < 0.0,
            "crowded side is skipped for the mirrored candidate"
        );
    }

    #[test]
    fn add_edge_refuses_self_and_duplicate_edges() {
        let mut graph = VisibilityGraph::new(Torus::new(10.0, 10.0));
        let a = graph.add_node(PlanNode::Bypass(Vec2::ZERO), Vec2::ZERO);
        let b = graph.add_node(PlanNode::Bypass(Vec2::new(1.0, 0.0)), Vec2::new(1.0, 0.0));
        assert!(!graph.add_edge(a, a));
        assert!(graph.add_edge(a, b));
        assert!(!graph.add_edge(a, b));
        assert!(!graph.add_edge(a, NodeIndex(9)));
        assert_eq!(graph.edge_count(), 1);
    }
}
