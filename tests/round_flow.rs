use geo::Point;
use pathrace::{DrawingProgress, Round, RoundError, RoundPhase, compare_algorithms, race_geojson};
use pathrace_core::prelude::*;

/// Three east-west streets, 0.002 deg apart, joined by two north-south avenues
fn town() -> RawRoadData {
    let mut nodes = Vec::new();
    let mut ways = Vec::new();
    for row in 0..3 {
        let ids: Vec<i64> = (0..6).map(|col| row * 10 + col).collect();
        for (col, &id) in ids.iter().enumerate() {
            nodes.push(RawNode {
                id,
                lat: 48.85 + row as f64 * 0.002,
                lon: 2.35 + col as f64 * 0.001,
            });
        }
        ways.push(RawWay {
            nodes: ids,
            road_type: Some(if row == 1 { "primary" } else { "residential" }.to_string()),
            oneway: false,
        });
    }
    for col in [0, 5] {
        ways.push(RawWay {
            nodes: vec![col, 10 + col, 20 + col],
            road_type: Some("secondary".to_string()),
            oneway: false,
        });
    }
    RawRoadData { nodes, ways }
}

fn at(graph: &RoadGraph, id: OsmNodeId) -> Point<f64> {
    graph.node(id).unwrap().geometry
}

#[test]
fn free_mode_race_for_every_algorithm() {
    for kind in AlgorithmKind::ALL {
        let config = RaceConfig {
            algorithm: kind,
            ..RaceConfig::default()
        };
        let mut round = Round::from_road_data(&town(), Point::new(2.3525, 48.852), config).unwrap();
        let graph = round.graph().clone();
        round.select_start(at(&graph, 0)).unwrap();
        round.select_end(at(&graph, 25)).unwrap();

        let report = round.run_headless(16.0, 1_000_000).unwrap();
        assert_eq!(round.phase(), RoundPhase::Complete, "{kind}");
        assert!(report.path_found, "{kind}");
        assert_eq!(report.optimal_path.first(), Some(&0), "{kind}");
        assert_eq!(report.optimal_path.last(), Some(&25), "{kind}");
        assert!(report.score.is_none());
        assert!(report.algorithm_timeline.iter().all(|w| w.end_time <= report.duration_ms));
    }
}

#[test]
fn game_round_from_drawing_to_score() {
    let config: RaceConfig = serde_json::from_str(r#"{"algorithm": "dijkstra", "speed": 3}"#).unwrap();
    let mut round = Round::from_road_data(&town(), Point::new(2.3525, 48.852), config).unwrap();
    let graph = round.graph().clone();
    round.select_start(at(&graph, 10)).unwrap();
    round.select_end(at(&graph, 15)).unwrap();
    round.begin_drawing().unwrap();

    // straight along the primary street, skipping every other node
    assert_eq!(round.add_player_waypoint(at(&graph, 12)).unwrap(), DrawingProgress::Added);
    let last = round.add_player_waypoint(at(&graph, 15)).unwrap();
    assert_eq!(last, DrawingProgress::Finished);

    let report = round.run_headless(16.0, 1_000_000).unwrap();
    let score = report.score.clone().unwrap();
    assert_eq!(report.optimal_path, vec![10, 11, 12, 13, 14, 15]);
    assert_eq!(score.optimal_nodes, 6);
    // the clicked nodes hit, their neighbours sit right at the tolerance
    assert!(score.nodes_hit >= 3);
    assert_eq!(score.granularity_bonus, 2);
    assert_eq!(score.distance_efficiency, Some(100.0));
    assert_eq!(report.player_timeline.last().unwrap().end_time, report.duration_ms);

    let geojson = race_geojson(&round).unwrap();
    assert_eq!(
        geojson.features.len(),
        report.algorithm_timeline.len() + report.player_timeline.len() + 1
    );

    // a completed round can be replayed but not redrawn without a reset
    assert!(matches!(
        round.add_player_waypoint(at(&graph, 12)),
        Err(RoundError::WrongPhase { .. })
    ));
    round.run_mut().unwrap().playback_mut().restart();
    assert_eq!(round.tick(16.0).unwrap(), RoundPhase::Complete);
    assert!(round.run().unwrap().time() > 0.0);
}

#[test]
fn compare_shares_one_graph() {
    let graph = std::sync::Arc::new(build_road_graph(&town()).unwrap());
    let start = graph.node_index(0).unwrap();
    let end = graph.node_index(25).unwrap();
    let stats = compare_algorithms(&graph, start, end, MAX_SEARCH_STEPS).unwrap();

    assert_eq!(stats.len(), 4);
    assert!(stats.iter().all(|s| s.found && s.path_length_meters.unwrap() > 0.0));
}
