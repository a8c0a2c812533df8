//! HTTP routes running headless races over road data sent with the request

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use axum::{
    Json, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    routing::{get, post},
};
use geojson::FeatureCollection;
use pathrace::{DrawingProgress, RaceReport, Round, compare_algorithms, race_geojson};
use pathrace_core::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use tower::{BoxError, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::{ServerConfig, error::ApiError};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaceRequest {
    pub road: RawRoadData,
    pub start: OsmNodeId,
    pub end: OsmNodeId,
    #[serde(default)]
    pub config: Option<RaceConfig>,
    /// Player waypoints; without them the race runs in free mode
    #[serde(default, alias = "playerRoute")]
    pub player_route: Option<Vec<OsmNodeId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub road: RawRoadData,
    pub start: OsmNodeId,
    pub end: OsmNodeId,
    #[serde(default)]
    pub budget: Option<usize>,
}

pub fn router(config: ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .timeout(config.request_timeout())
        .concurrency_limit(config.max_concurrent_requests);

    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/health", get(health))
        .route("/race", post(race))
        .route("/race/geojson", post(race_geojson_handler))
        .route("/compare", post(compare))
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_middleware_error(error: BoxError) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("Unhandled middleware error: {error}"))
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn race(
    State(state): State<AppState>,
    Json(request): Json<RaceRequest>,
) -> Result<Json<RaceReport>, ApiError> {
    let report = blocking(move |abort| {
        let round = run_race(&state.config, &request, abort)?;
        Ok(RaceReport::from_round(&round)?)
    })
    .await?;
    Ok(Json(report))
}

async fn race_geojson_handler(
    State(state): State<AppState>,
    Json(request): Json<RaceRequest>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let collection = blocking(move |abort| {
        let round = run_race(&state.config, &request, abort)?;
        Ok(race_geojson(&round)?)
    })
    .await?;
    Ok(Json(collection))
}

async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<Vec<SearchStats>>, ApiError> {
    let stats = blocking(move |_| {
        let graph = Arc::new(load_graph(&state.config, &request.road)?);
        let start = node_index(&graph, request.start)?;
        let end = node_index(&graph, request.end)?;
        let budget = request.budget.unwrap_or(MAX_SEARCH_STEPS);
        Ok(compare_algorithms(&graph, start, end, budget)?)
    })
    .await?;
    Ok(Json(stats))
}

/// Raises the abort flag when the request future is dropped
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Runs CPU-bound work off the async executor.
///
/// `work` gets a flag that is set once the caller stops waiting, e.g. when the
/// timeout layer drops the request.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AtomicBool) -> Result<T, ApiError> + Send + 'static,
{
    let abort = Arc::new(AtomicBool::new(false));
    let _guard = AbortOnDrop(Arc::clone(&abort));
    tokio::task::spawn_blocking(move || work(&abort))
        .await
        .map_err(|e| ApiError::Internal(format!("Race worker failed: {e}")))?
}

fn load_graph(config: &ServerConfig, road: &RawRoadData) -> Result<RoadGraph, ApiError> {
    if road.nodes.len() > config.max_nodes {
        return Err(ApiError::BadRequest(format!(
            "Road data has {} nodes, the limit is {}",
            road.nodes.len(),
            config.max_nodes
        )));
    }
    Ok(build_road_graph(road)?)
}

fn node_index(graph: &RoadGraph, id: OsmNodeId) -> Result<NodeIndex, ApiError> {
    graph
        .node_index(id)
        .ok_or_else(|| Error::UnknownNode(id).into())
}

/// Plays a full round: endpoints, the optional player route, then the race
fn run_race(
    config: &ServerConfig,
    request: &RaceRequest,
    abort: &AtomicBool,
) -> Result<Round, ApiError> {
    let graph = Arc::new(load_graph(config, &request.road)?);
    let race_config = request.config.clone().unwrap_or_else(|| config.race.clone());
    info!(
        "Racing {} from {} to {} over {} nodes",
        race_config.algorithm,
        request.start,
        request.end,
        graph.node_count()
    );

    let mut round = Round::new(Arc::clone(&graph), race_config)?;
    round.select_start_node(node_index(&graph, request.start)?)?;
    round.select_end_node(node_index(&graph, request.end)?)?;

    if let Some(route) = &request.player_route {
        round.begin_drawing()?;
        for &id in route {
            let progress = round.add_player_node(node_index(&graph, id)?)?;
            if progress == DrawingProgress::Finished {
                break;
            }
        }
        debug!("Player drew {} waypoints", round.player_route().len());
    }

    round.run_headless_until(config.frame_ms, config.max_frames, abort)?;
    Ok(round)
}
