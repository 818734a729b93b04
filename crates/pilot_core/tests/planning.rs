use pilot_core::test_fixtures::{
    blocker, craft, deposit, depot, ghost, rival_craft, rival_depot, small_planner_config,
    small_world, waypoint,
};
use pilot_core::{
    build_graph, heuristic, plan, NodeIndex, PlanNode, Vec2, VisibilityGraph, Waypoint,
};

fn index_for(graph: &VisibilityGraph, waypoint: &Waypoint) -> NodeIndex {
    graph
        .nodes()
        .find(|(_, node)| node.plan == waypoint.plan)
        .map(|(index, _)| index)
        .expect("every path waypoint is a graph node")
}

#[test]
fn test_open_field_plans_one_hop_to_deposit() {
    let me = craft(1, Vec2::new(0.0, 0.0));
    let target = deposit(2, Vec2::new(3.0, 0.0), 100.0);
    let home = depot(3, Vec2::new(9.0, 9.0));
    let world = small_world(vec![me.clone(), target.clone(), home.clone()]);

    let mut graph = build_graph(&world, &me, &target, &small_planner_config());
    let start = graph.start();
    let goal = graph.goal();
    let home_index = graph.index_of(home.id).expect("depot in view");

    assert!(graph.has_edge(start, goal));
    assert!(graph.has_edge(goal, start));
    assert!(graph.has_edge(start, home_index), "depot across the corner is visible");
    assert!(graph.has_edge(home_index, start));

    let path = plan(&mut graph, start, goal, &me);
    assert_eq!(path.len(), 1, "straight shot needs a single waypoint");
    assert_eq!(path.peek().map(|w| w.plan), Some(PlanNode::Object(target.id)));
    assert!((graph.node(goal).g - 3.0).abs() < 1e-9);
}

#[test]
fn test_blocking_rock_gets_a_bypass_node() {
    let me = craft(1, Vec2::new(0.0, 0.0));
    let rock = blocker(2, Vec2::new(1.5, 0.0), 0.5);
    let target = deposit(3, Vec2::new(3.0, 0.0), 100.0);
    let world = small_world(vec![me.clone(), rock, target.clone()]);

    let mut graph = build_graph(&world, &me, &target, &small_planner_config());
    let start = graph.start();
    let goal = graph.goal();
    assert!(!graph.has_edge(start, goal), "rock hides the deposit");

    let bypasses: Vec<NodeIndex> = graph
        .nodes()
        .filter(|(_, node)| node.is_bypass())
        .map(|(index, _)| index)
        .collect();
    assert_eq!(bypasses.len(), 1, "exactly one bypass, and none back to the craft");
    let bypass = bypasses[0];
    assert_eq!(graph.neighbors(bypass), [goal]);
    assert!(graph.has_edge(start, bypass));

    let path = plan(&mut graph, start, goal, &me);
    assert_eq!(path.len(), 2);
    assert_eq!(path.peek().map(|w| w.plan), Some(graph.node(bypass).plan));
    assert_eq!(path.goal().map(|w| w.plan), Some(PlanNode::Object(target.id)));
}

#[test]
fn test_object_edges_are_symmetric_and_never_self_loops() {
    let me = craft(1, Vec2::new(1.0, 1.0));
    let target = deposit(2, Vec2::new(4.2, 1.3), 100.0);
    let world = small_world(vec![
        me.clone(),
        target.clone(),
        blocker(3, Vec2::new(2.6, 1.15), 0.4),
        deposit(4, Vec2::new(1.3, 3.7), 40.0),
        waypoint(5, Vec2::new(8.9, 0.7)),
        depot(6, Vec2::new(3.1, 8.4)),
        rival_craft(7, Vec2::new(2.2, 2.9)),
    ]);
    let graph = build_graph(&world, &me, &target, &small_planner_config());

    for (a, node_a) in graph.nodes() {
        assert!(!graph.has_edge(a, a), "self-loop on {a:?}");
        for b in graph.neighbors(a) {
            assert!(b.0 < graph.len(), "dangling edge {a:?} -> {b:?}");
        }
        if node_a.is_bypass() {
            assert_eq!(graph.neighbors(a).len(), 1, "bypass has one neighbor");
            continue;
        }
        for (b, node_b) in graph.nodes() {
            if node_b.is_bypass() || a == b {
                continue;
            }
            assert_eq!(
                graph.has_edge(a, b),
                graph.has_edge(b, a),
                "object edge {a:?} <-> {b:?} is one-way"
            );
        }
    }
}

#[test]
fn test_impassable_nodes_have_infinite_heuristic() {
    let me = craft(1, Vec2::new(0.0, 0.0));
    let target = deposit(2, Vec2::new(4.0, 0.0), 100.0);
    let rock = blocker(3, Vec2::new(0.0, 2.0), 0.3);
    let foreign = rival_depot(4, Vec2::new(2.0, 2.0));
    let other = rival_craft(5, Vec2::new(0.0, 4.0));
    let shot = ghost(6, Vec2::new(2.0, 4.0));
    let world = small_world(vec![
        me.clone(),
        target.clone(),
        rock.clone(),
        foreign.clone(),
        other.clone(),
        shot.clone(),
    ]);
    let graph = build_graph(&world, &me, &target, &small_planner_config());

    for impassable in [&rock, &foreign, &other, &shot] {
        let index = graph.index_of(impassable.id).expect("in view");
        assert!(
            heuristic(&graph, index, graph.goal(), &me).is_infinite(),
            "{:?} should be impassable",
            impassable.kind
        );
    }
    assert!(heuristic(&graph, graph.start(), graph.goal(), &me).is_finite());

    // A rival depot stays reachable when it is itself the goal.
    let graph = build_graph(&world, &me, &foreign, &small_planner_config());
    assert!(heuristic(&graph, graph.goal(), graph.goal(), &me).is_finite());
}

#[test]
fn test_path_hops_follow_graph_edges() {
    let me = craft(1, Vec2::new(0.0, 0.0));
    let rock = blocker(2, Vec2::new(1.5, 0.0), 0.5);
    let target = deposit(3, Vec2::new(3.0, 0.0), 100.0);
    let pickup = waypoint(4, Vec2::new(1.2, 2.4));
    let world = small_world(vec![me.clone(), rock, target.clone(), pickup]);

    let mut graph = build_graph(&world, &me, &target, &small_planner_config());
    let (start, goal) = (graph.start(), graph.goal());
    let path = plan(&mut graph, start, goal, &me);
    assert!(!path.is_empty());

    let mut previous = start;
    for waypoint in path.iter() {
        let next = index_for(&graph, waypoint);
        assert!(graph.has_edge(previous, next), "hop {previous:?} -> {next:?} has no edge");
        assert!(
            graph.node(next).g > graph.node(previous).g,
            "cost must grow along the path: {previous:?} -> {next:?}"
        );
        previous = next;
    }
    assert_eq!(previous, goal);
    assert_eq!(path.goal().map(|w| w.plan), Some(PlanNode::Object(target.id)));
}

#[test]
fn test_unreachable_goal_yields_empty_path() {
    let me = craft(1, Vec2::new(0.0, 0.0));
    let wall = blocker(2, Vec2::new(1.5, 0.0), 0.5);
    let target = deposit(3, Vec2::new(3.0, 0.0), 100.0);
    let world = small_world(vec![me.clone(), wall, target.clone()]);
    let mut config = small_planner_config();
    config.close_escape = 0.5;

    let mut graph = build_graph(&world, &me, &target, &config);
    let (start, goal) = (graph.start(), graph.goal());
    assert!(plan(&mut graph, start, goal, &me).is_empty());
}
