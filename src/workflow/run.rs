// SPDX-License-Identifier: MIT

//! Run records and execution logs

use crate::error::EngineError;
use crate::workflow::state::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// One entry of the execution trace: the state after a node ran
///
/// Sequence numbers are strictly increasing from zero with no gaps.
/// The final entry of a failed run carries the error marker message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub node: String,
    pub state: WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(seq: u64, node: impl Into<String>, state: WorkflowState) -> Self {
        Self {
            seq,
            node: node.into(),
            state,
            message: None,
            at: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Structured failure attached to a failed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub kind: String,
    pub message: String,
}

impl From<&EngineError> for RunError {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// One execution instance of a graph, queryable until process exit
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub graph_id: Uuid,
    pub status: RunStatus,
    pub state: WorkflowState,
    pub log: Vec<LogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn pending(run_id: Uuid, graph_id: Uuid, initial_state: WorkflowState) -> Self {
        Self {
            run_id,
            graph_id,
            status: RunStatus::Pending,
            state: initial_state,
            log: Vec::new(),
            error: None,
            created_at: Utc::now(),
        }
    }
}
