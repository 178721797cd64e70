// SPDX-License-Identifier: MIT

//! Graph workflow execution
//!
//! This module holds the core engine: graph definitions and compilation,
//! the shared state container, edge conditions, the sequential executor,
//! and the in-memory graph/run registries.

pub mod condition;
pub mod executor;
pub mod graph;
pub mod registry;
pub mod run;
pub mod state;
pub mod store;

pub use condition::Condition;
pub use executor::{Executor, ExecutorConfig, RunOutcome, DEFAULT_LOOP_CAP};
pub use graph::{EdgeDef, Graph, GraphDef, NodeDef};
pub use registry::{NodeTool, ToolRegistry};
pub use run::{LogEntry, RunRecord, RunStatus};
pub use state::WorkflowState;
pub use store::{GraphSummary, WorkflowService};
