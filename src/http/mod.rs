//! The peripheral HTTP JSON surface: a thin REST wrapper around
//! [`Graph`], grounded on the source system's own dashboard-style axum
//! server. See `SPEC_FULL.md` §7.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::model::Body;
use crate::traversal::plan::TraversalPlan;
use crate::traversal::Traversal;

type AppState = Arc<Graph>;

/// Builds the router. Callers own binding the listener and running the
/// server (see `src/bin/rangegraphd.rs`).
pub fn router(graph: Graph) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/v1/query/nodes/:type", get(query_nodes_handler))
        .route("/v1/query/nodes/:type/:id", get(query_nodes_handler))
        .route("/v1/query/nodes/:type/:id/:out", get(query_nodes_handler))
        .route("/v1/traverse", post(traverse_handler))
        .route("/v1/resources/:id", get(get_resource_handler).put(put_resource_handler).delete(delete_resource_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(graph))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// `GET /v1/query/nodes/:type[/:id[/:out]]` — a convenience shorthand
/// for the common "nodes of a type, optionally pinned to an id,
/// optionally expanded one hop out" shape, without requiring callers to
/// build a full [`TraversalPlan`].
async fn query_nodes_handler(State(graph): State<AppState>, AxumPath(params): AxumPath<HashMap<String, String>>) -> Result<Json<Vec<Value>>, AppError> {
    let node_type = params.get("type").cloned().ok_or_else(|| GraphError::validation("missing node type"))?;
    let mut traversal = Traversal::new().is(node_type);
    if let Some(id) = params.get("id") {
        traversal = traversal.has("id", id.clone());
    }
    if let Some(edge_type) = params.get("out") {
        traversal = traversal.out([edge_type.clone()]).with_body();
    } else {
        traversal = traversal.with_body();
    }
    let objects = traversal.all(&graph).await?;
    Ok(Json(objects.into_iter().map(|obj| serde_json::Value::from(obj.val.unwrap_or_default())).collect()))
}

/// `POST /v1/traverse` — executes an arbitrary [`TraversalPlan`] posted
/// as JSON and returns the matched node bodies.
async fn traverse_handler(State(graph): State<AppState>, Json(plan): Json<TraversalPlan>) -> Result<Json<Vec<Value>>, AppError> {
    let traversal: Traversal = plan.into();
    let objects = traversal.with_body().all(&graph).await?;
    Ok(Json(objects.into_iter().map(|obj| serde_json::Value::from(obj.val.unwrap_or_default())).collect()))
}

async fn get_resource_handler(State(graph): State<AppState>, AxumPath(id): AxumPath<String>) -> Result<Json<Option<Value>>, AppError> {
    let body = graph.get_by_resource_id(&id).await?;
    Ok(Json(body.map(Value::from)))
}

async fn put_resource_handler(State(graph): State<AppState>, AxumPath(id): AxumPath<String>, Json(body): Json<Body>) -> Result<Json<()>, AppError> {
    graph.put_by_resource_id(&id, body).await?;
    Ok(Json(()))
}

async fn delete_resource_handler(State(graph): State<AppState>, AxumPath(id): AxumPath<String>) -> Result<Json<()>, AppError> {
    graph.del_by_resource_id(&id).await?;
    Ok(Json(()))
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: &'static str,
    message: String,
}

struct AppError(GraphError);

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = axum::http::StatusCode::from_u16(self.0.status_code()).unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorPayload {
            error: self.0.kind(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

