// SPDX-License-Identifier: MIT

//! In-memory graph and run registries
//!
//! `WorkflowService` owns the two process-wide shared structures: the graph
//! registry and the run registry. Both live behind `RwLock`ed maps so
//! concurrent HTTP requests can create and look up without corruption. A
//! graph is immutable once registered; a run record is only ever written by
//! the single task driving that run.

use crate::error::EngineError;
use crate::workflow::executor::{Executor, ExecutorConfig, RunOutcome};
use crate::workflow::graph::{EdgeDef, Graph, GraphDef};
use crate::workflow::registry::ToolRegistry;
use crate::workflow::run::{RunRecord, RunStatus};
use crate::workflow::state::WorkflowState;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Read-only description of a registered graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub graph_id: Uuid,
    pub name: String,
    pub entry: String,
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeDef>,
}

/// Service tying together the tool registry, the executor, and the
/// graph/run stores
#[derive(Clone)]
pub struct WorkflowService {
    registry: ToolRegistry,
    executor: Arc<Executor>,
    graphs: Arc<RwLock<HashMap<Uuid, Arc<Graph>>>>,
    runs: Arc<RwLock<HashMap<Uuid, RunRecord>>>,
}

impl WorkflowService {
    pub fn new(registry: ToolRegistry, config: ExecutorConfig) -> Self {
        Self {
            registry,
            executor: Arc::new(Executor::new(config)),
            graphs: Arc::new(RwLock::new(HashMap::new())),
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate, compile, and register a graph definition
    pub async fn create_graph(&self, def: GraphDef) -> Result<Uuid, EngineError> {
        let graph = Graph::compile(def, &self.registry).await?;
        let graph_id = graph.id;
        log::info!(
            "created graph {} ('{}', {} nodes)",
            graph_id,
            graph.def().name,
            graph.node_count()
        );
        let mut graphs = self.graphs.write().await;
        graphs.insert(graph_id, Arc::new(graph));
        Ok(graph_id)
    }

    /// Describe a registered graph
    pub async fn get_graph(&self, graph_id: Uuid) -> Result<GraphSummary, EngineError> {
        let graphs = self.graphs.read().await;
        let graph = graphs
            .get(&graph_id)
            .ok_or_else(|| EngineError::not_found("graph", graph_id.to_string()))?;
        let def = graph.def();
        Ok(GraphSummary {
            graph_id,
            name: def.name.clone(),
            entry: def.entry.clone(),
            nodes: def.nodes.iter().map(|n| n.id.clone()).collect(),
            edges: def.edges.clone(),
        })
    }

    /// Register a pending run and spawn its driver task
    ///
    /// Returns as soon as the record is visible; `get_run` reflects the
    /// eventual terminal status. The join handle is returned so callers
    /// that need completion (tests, the CLI) can await it.
    pub async fn start_run(
        &self,
        graph_id: Uuid,
        initial_state: WorkflowState,
    ) -> Result<(Uuid, JoinHandle<()>), EngineError> {
        let graph = {
            let graphs = self.graphs.read().await;
            graphs
                .get(&graph_id)
                .cloned()
                .ok_or_else(|| EngineError::not_found("graph", graph_id.to_string()))?
        };

        let run_id = Uuid::new_v4();
        {
            let mut runs = self.runs.write().await;
            runs.insert(
                run_id,
                RunRecord::pending(run_id, graph_id, initial_state.clone()),
            );
        }
        log::info!("run {} started on graph {}", run_id, graph_id);

        let service = self.clone();
        let handle = tokio::spawn(async move {
            service.drive(run_id, graph, initial_state).await;
        });
        Ok((run_id, handle))
    }

    /// Execute a graph and wait for the terminal record
    pub async fn run_graph(
        &self,
        graph_id: Uuid,
        initial_state: WorkflowState,
    ) -> Result<RunRecord, EngineError> {
        let (run_id, handle) = self.start_run(graph_id, initial_state).await?;
        // The driver task neither panics nor is cancelled; a join error
        // would mean the runtime is shutting down.
        if let Err(e) = handle.await {
            log::error!("run {} driver task failed to join: {}", run_id, e);
        }
        self.get_run(run_id).await
    }

    /// Snapshot a run record by id
    pub async fn get_run(&self, run_id: Uuid) -> Result<RunRecord, EngineError> {
        let runs = self.runs.read().await;
        runs.get(&run_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("run", run_id.to_string()))
    }

    /// Drive one run to its terminal state. Only this task writes the record.
    async fn drive(&self, run_id: Uuid, graph: Arc<Graph>, initial_state: WorkflowState) {
        self.update_run(run_id, |run| run.status = RunStatus::Running)
            .await;

        let RunOutcome {
            status,
            state,
            log,
            error,
        } = self.executor.execute(&graph, initial_state).await;

        match status {
            RunStatus::Completed => log::info!("run {} completed ({} steps)", run_id, log.len()),
            _ => log::warn!("run {} failed after {} log entries", run_id, log.len()),
        }

        self.update_run(run_id, move |run| {
            run.status = status;
            run.state = state;
            run.log = log;
            run.error = error;
        })
        .await;
    }

    async fn update_run(&self, run_id: Uuid, mutate: impl FnOnce(&mut RunRecord)) {
        let mut runs = self.runs.write().await;
        if let Some(run) = runs.get_mut(&run_id) {
            mutate(run);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::graph::NodeDef;
    use crate::workflow::registry::NodeTool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::error::Error;

    struct EchoTool;

    #[async_trait]
    impl NodeTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn apply(
            &self,
            mut state: WorkflowState,
        ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
            let input = state.get_str("input").unwrap_or_default().to_string();
            state.set("output", json!(input));
            Ok(state)
        }
    }

    async fn service() -> WorkflowService {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await;
        WorkflowService::new(registry, ExecutorConfig::default())
    }

    fn echo_def() -> GraphDef {
        GraphDef {
            name: "echo".to_string(),
            nodes: vec![NodeDef {
                id: "echo".to_string(),
                tool: "echo".to_string(),
            }],
            edges: vec![],
            entry: "echo".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_graph() {
        let service = service().await;
        let graph_id = service.create_graph(echo_def()).await.unwrap();

        let summary = service.get_graph(graph_id).await.unwrap();
        assert_eq!(summary.graph_id, graph_id);
        assert_eq!(summary.entry, "echo");
        assert_eq!(summary.nodes, vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn test_get_unknown_graph_is_not_found() {
        let service = service().await;
        let err = service.get_graph(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_run_unknown_graph_is_not_found() {
        let service = service().await;
        let err = service
            .start_run(Uuid::new_v4(), WorkflowState::empty())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_get_unknown_run_is_not_found() {
        let service = service().await;
        let err = service.get_run(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_run_graph_to_completion() {
        let service = service().await;
        let graph_id = service.create_graph(echo_def()).await.unwrap();

        let mut initial = WorkflowState::empty();
        initial.set("input", json!("hello"));

        let record = service.run_graph(graph_id, initial).await.unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.state.get("output"), Some(&json!("hello")));
        assert_eq!(record.log.len(), 1);
    }

    #[tokio::test]
    async fn test_start_run_is_visible_before_completion() {
        let service = service().await;
        let graph_id = service.create_graph(echo_def()).await.unwrap();

        let (run_id, handle) = service
            .start_run(graph_id, WorkflowState::empty())
            .await
            .unwrap();

        // The record exists immediately, whatever its current status.
        let record = service.get_run(run_id).await.unwrap();
        assert_eq!(record.run_id, run_id);
        assert_eq!(record.graph_id, graph_id);

        handle.await.unwrap();
        let record = service.get_run(run_id).await.unwrap();
        assert!(record.status.is_terminal());
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_isolated() {
        let service = service().await;
        let graph_id = service.create_graph(echo_def()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let mut initial = WorkflowState::empty();
                initial.set("input", json!(format!("payload-{i}")));
                let record = service.run_graph(graph_id, initial).await.unwrap();
                (i, record)
            }));
        }

        for handle in handles {
            let (i, record) = handle.await.unwrap();
            assert_eq!(record.status, RunStatus::Completed);
            assert_eq!(
                record.state.get("output"),
                Some(&json!(format!("payload-{i}")))
            );
        }
    }
}
