// SPDX-License-Identifier: MIT

//! HTTP API
//!
//! Thin axum layer over `WorkflowService`:
//! - `POST /api/graphs`      create a graph definition
//! - `GET  /api/graphs/{id}` describe a graph
//! - `POST /api/runs`        start a run (executes asynchronously)
//! - `GET  /api/runs/{id}`   fetch a run's status, state, and log
//!
//! Every failure maps to a structured `{"error": {kind, message}}` payload;
//! handler errors never take the process down.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::EngineError;
use crate::workflow::graph::GraphDef;
use crate::workflow::run::RunRecord;
use crate::workflow::state::WorkflowState;
use crate::workflow::store::{GraphSummary, WorkflowService};

pub async fn serve(port: u16, service: WorkflowService) -> anyhow::Result<()> {
    let app = router(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(service: WorkflowService) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/graphs", post(create_graph))
        .route("/api/graphs/{id}", get(get_graph))
        .route("/api/runs", post(create_run))
        .route("/api/runs/{id}", get(get_run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Engine error carried across the handler boundary
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_graph(
    State(service): State<WorkflowService>,
    Json(def): Json<GraphDef>,
) -> Result<Json<Value>, ApiError> {
    let graph_id = service.create_graph(def).await?;
    Ok(Json(json!({ "graph_id": graph_id })))
}

async fn get_graph(
    State(service): State<WorkflowService>,
    Path(id): Path<Uuid>,
) -> Result<Json<GraphSummary>, ApiError> {
    let summary = service.get_graph(id).await?;
    Ok(Json(summary))
}

#[derive(Deserialize)]
struct CreateRunRequest {
    graph_id: Uuid,
    #[serde(default)]
    initial_state: WorkflowState,
}

async fn create_run(
    State(service): State<WorkflowService>,
    Json(payload): Json<CreateRunRequest>,
) -> Result<Json<Value>, ApiError> {
    let (run_id, _handle) = service
        .start_run(payload.graph_id, payload.initial_state)
        .await?;
    Ok(Json(json!({ "run_id": run_id })))
}

async fn get_run(
    State(service): State<WorkflowService>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunRecord>, ApiError> {
    let run = service.get_run(id).await?;
    Ok(Json(run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::register_tools;
    use crate::workflow::executor::ExecutorConfig;
    use crate::workflow::graph::{EdgeDef, NodeDef};
    use crate::workflow::registry::ToolRegistry;

    async fn test_service() -> WorkflowService {
        let registry = ToolRegistry::new();
        register_tools(&registry).await;
        WorkflowService::new(registry, ExecutorConfig::default())
    }

    fn summarize_def() -> GraphDef {
        GraphDef {
            name: "summarize".to_string(),
            nodes: vec![
                NodeDef {
                    id: "split".to_string(),
                    tool: "split_text".to_string(),
                },
                NodeDef {
                    id: "merge".to_string(),
                    tool: "merge_summaries".to_string(),
                },
            ],
            edges: vec![EdgeDef {
                from: "split".to_string(),
                to: "merge".to_string(),
                when: None,
            }],
            entry: "split".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_graph_handler() {
        let service = test_service().await;
        let response = create_graph(State(service), Json(summarize_def()))
            .await
            .unwrap();
        assert!(response.0.get("graph_id").is_some());
    }

    #[tokio::test]
    async fn test_create_graph_handler_rejects_bad_def() {
        let service = test_service().await;
        let mut def = summarize_def();
        def.entry = "missing".to_string();

        let err = create_graph(State(service), Json(def)).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_unknown_graph_is_404() {
        let service = test_service().await;
        let err = get_graph(State(service), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_unknown_run_is_404() {
        let service = test_service().await;
        let err = get_run(State(service), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_run_for_unknown_graph_is_404() {
        let service = test_service().await;
        let err = create_run(
            State(service),
            Json(CreateRunRequest {
                graph_id: Uuid::new_v4(),
                initial_state: WorkflowState::empty(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
