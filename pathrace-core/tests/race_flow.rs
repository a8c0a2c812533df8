use std::sync::Arc;

use geo::Point;
use pathrace_core::prelude::*;

const ROAD_DATA: &str = r#"{
    "nodes": [
        {"id": 10, "lat": 51.5000, "lon": -0.1200},
        {"id": 11, "lat": 51.5000, "lon": -0.1190},
        {"id": 12, "lat": 51.5000, "lon": -0.1180},
        {"id": 13, "lat": 51.5000, "lon": -0.1170},
        {"id": 20, "lat": 51.5010, "lon": -0.1200},
        {"id": 21, "lat": 51.5010, "lon": -0.1190},
        {"id": 22, "lat": 51.5010, "lon": -0.1180},
        {"id": 23, "lat": 51.5010, "lon": -0.1170},
        {"id": 99, "lat": 51.6000, "lon": -0.2000}
    ],
    "ways": [
        {"nodes": [10, 11, 12, 13], "roadType": "primary"},
        {"nodes": [20, 21, 22, 23], "roadType": "residential"},
        {"nodes": [10, 20], "roadType": "tertiary"},
        {"nodes": [13, 23], "roadType": "tertiary"},
        {"nodes": [21, 11], "roadType": "service", "oneway": true}
    ]
}"#;

fn graph() -> Arc<RoadGraph> {
    let data = RawRoadData::from_json(ROAD_DATA).unwrap();
    Arc::new(build_road_graph(&data).unwrap())
}

#[test]
fn every_algorithm_connects_the_corners() {
    let graph = graph();
    let start = graph.node_index(20).unwrap();
    let end = graph.node_index(13).unwrap();

    for kind in AlgorithmKind::ALL {
        let (search, outcome) = shortest_path(Arc::clone(&graph), kind, start, end).unwrap();
        let path = outcome.path().unwrap_or_else(|| panic!("{kind} found no path"));
        assert_eq!(path.first(), Some(&start), "{kind}");
        assert_eq!(path.last(), Some(&end), "{kind}");

        let stats = SearchStats::from_outcome(&search, &outcome);
        assert!(stats.found);
        assert_eq!(stats.path_nodes, path.len());
        assert!(stats.explored > 0, "{kind}");
    }
}

#[test]
fn dijkstra_and_astar_agree_on_cost() {
    let graph = graph();
    let start = graph.node_index(10).unwrap();
    let end = graph.node_index(23).unwrap();

    let cost = |kind| match shortest_path(Arc::clone(&graph), kind, start, end).unwrap().1 {
        SearchOutcome::Found { cost, .. } => cost,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert!((cost(AlgorithmKind::Dijkstra) - cost(AlgorithmKind::AStar)).abs() < 1e-6);
}

#[test]
fn isolated_node_is_unreachable() {
    let graph = graph();
    let start = graph.node_index(10).unwrap();
    let end = graph.node_index(99).unwrap();

    for kind in AlgorithmKind::ALL {
        let (_, outcome) = shortest_path(Arc::clone(&graph), kind, start, end).unwrap();
        assert!(
            matches!(outcome, SearchOutcome::Unreachable { .. }),
            "{kind}: {outcome:?}"
        );
    }
}

#[test]
fn radius_filter_drops_distant_nodes() {
    let data = RawRoadData::from_json(ROAD_DATA).unwrap();
    let center = Point::new(-0.1185, 51.5005);
    let graph = build_road_graph_within(&data, center, 1.0).unwrap();

    assert_eq!(graph.node_count(), 8);
    assert!(graph.node_index(99).is_none());
}

#[test]
fn animated_run_player_sync_and_scoring() {
    let graph = graph();
    let start = graph.node_index(10).unwrap();
    let end = graph.node_index(13).unwrap();
    let config: RaceConfig =
        serde_json::from_str(r#"{"algorithm": "dijkstra", "animationSpeed": 2}"#).unwrap();

    let mut run = RunState::new(Arc::clone(&graph), &config, start, end).unwrap();
    let mut frames = 0;
    while !run.tick(16.0) {
        frames += 1;
        assert!(frames < 100_000, "run never finished");
    }
    assert!(run.path_found());
    assert!(run.timer() > 0.0);

    // the player follows the primary road exactly
    let route: Vec<&RoadNode> = [10, 11, 12, 13]
        .iter()
        .map(|&id| graph.node(id).unwrap())
        .collect();
    let mut player = TimelineScheduler::from_route(route.iter().copied(), SegmentKind::Player);
    player.synchronize(run.timer());
    let last = player.waypoints().last().unwrap();
    assert_eq!(last.end_time, run.timer());

    let points: Vec<Point<f64>> = route.iter().map(|n| n.geometry).collect();
    let score = ScoringEngine::default().score_search(
        run.algorithm(),
        &points,
        Some(graph.path_length_m(&run.optimal_path())),
    );
    assert_eq!(score.efficiency, 100);
    assert_eq!(score.grade, Grade::S);
    assert_eq!(score.distance_efficiency, Some(100.0));

    let algorithm = run.timeline().to_geojson("algorithm").unwrap();
    let player = player.to_geojson("player").unwrap();
    let merged = merge_collections([algorithm, player]);
    assert_eq!(merged.features.len(), run.timeline().len() + 3);
}
