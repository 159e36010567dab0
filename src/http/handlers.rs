//! API handlers.
//!
//! Each handler builds one traversal and runs it through the shared
//! [`ResilientSubmitter`](crate::resilience::ResilientSubmitter).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::graph::{queries, NewEdge, NewVertex};
use crate::gremlin::{GremlinRequest, GremlinResult};
use crate::http::error::ApiError;
use crate::http::server::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub upstream: &'static str,
    pub reconnects: u64,
}

/// Run one request with the current retry policy.
async fn execute(state: &AppState, request: GremlinRequest) -> GremlinResult<Vec<Value>> {
    let policy = **state.retry_policy.load();
    state
        .submitter
        .submit(&policy, |conn| {
            let request = request.clone();
            async move { conn.submit(request).await }
        })
        .await
}

fn success(data: Vec<Value>) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream: state.submitter.state().as_str(),
        reconnects: state.submitter.reconnect_count(),
    })
}

/// Probe the upstream. Always answers 200; the outcome is in the body.
pub async fn test_connection(State(state): State<AppState>) -> Json<Value> {
    match execute(&state, queries::probe()).await {
        Ok(_) => Json(json!({
            "status": "success",
            "message": "Connection to Cosmos DB Gremlin API successful!",
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Connection test failed");
            Json(json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

pub async fn create_vertex(
    State(state): State<AppState>,
    payload: Result<Json<NewVertex>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(vertex) = payload?;
    let request = queries::add_vertex(&vertex, state.partition_key.as_deref())?;
    let data = execute(&state, request).await?;
    tracing::info!(label = %vertex.label, "Vertex created");
    Ok((StatusCode::CREATED, success(data)))
}

pub async fn list_vertices(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = execute(&state, queries::all_vertices()).await?;
    Ok(success(data))
}

pub async fn create_edge(
    State(state): State<AppState>,
    payload: Result<Json<NewEdge>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(edge) = payload?;
    let request = queries::add_edge(&edge)?;
    let data = execute(&state, request).await?;
    tracing::info!(label = %edge.label, from = %edge.from, to = %edge.to, "Edge created");
    Ok((StatusCode::CREATED, success(data)))
}

pub async fn list_edges(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = execute(&state, queries::all_edges()).await?;
    Ok(success(data))
}
