//! Graph execution engine
//!
//! Walks a compiled graph from its entry node: apply the node's tool,
//! record a log entry, pick the next edge in declared order, and keep a
//! per-node revisit counter so a workflow whose conditions never become
//! true fails at the loop cap instead of spinning forever.

use crate::error::EngineError;
use crate::workflow::graph::Graph;
use crate::workflow::run::{LogEntry, RunError, RunStatus};
use crate::workflow::state::WorkflowState;
use std::collections::{HashMap, HashSet};

/// Default maximum revisits to a single node within one run
pub const DEFAULT_LOOP_CAP: u32 = 25;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Maximum revisits to a single node before the run is failed
    pub loop_cap: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            loop_cap: DEFAULT_LOOP_CAP,
        }
    }
}

/// Result of executing a graph: terminal status, final state, full trace
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub state: WorkflowState,
    pub log: Vec<LogEntry>,
    pub error: Option<RunError>,
}

/// Sequential graph executor
///
/// Stateless across runs; a single executor may drive any number of
/// concurrent runs, each with its own state and log.
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Execute `graph` against `initial` until a terminal node, an implicit
    /// exit, or a failure. Engine-level failures (tool error, loop cap,
    /// dangling node) are returned as a failed outcome with the partial log
    /// preserved and the error recorded as the terminal entry; they are
    /// never propagated as panics.
    pub async fn execute(&self, graph: &Graph, initial: WorkflowState) -> RunOutcome {
        let mut state = initial;
        let mut log: Vec<LogEntry> = Vec::new();
        let mut seq: u64 = 0;
        let mut visited: HashSet<String> = HashSet::new();
        let mut revisits: HashMap<String, u32> = HashMap::new();
        let mut current = graph.entry.clone();

        loop {
            let Some(node) = graph.node(&current) else {
                // Compilation checks edge targets, so this only fires on a
                // graph assembled outside the normal path.
                let err = EngineError::not_found("node", current.clone());
                return self.fail(state, log, seq, &current, err);
            };

            log::debug!("graph {}: executing node '{}'", graph.id, node.id);
            match node.tool.apply(state.clone()).await {
                Ok(next) => {
                    state = next;
                    log.push(LogEntry::new(seq, node.id.as_str(), state.clone()));
                    seq += 1;
                }
                Err(e) => {
                    let err = EngineError::transformation(node.id.as_str(), e.to_string());
                    return self.fail(state, log, seq, &current, err);
                }
            }
            visited.insert(node.id.clone());

            // First edge whose condition holds wins; an unconditional edge
            // always holds and sits last by validation.
            let selected = node.edges.iter().find(|edge| {
                edge.condition
                    .as_ref()
                    .map(|c| c.evaluate(&state))
                    .unwrap_or(true)
            });

            let Some(edge) = selected else {
                // Terminal node, or every condition false with no default:
                // both are valid exits.
                log::debug!("graph {}: run completed at node '{}'", graph.id, node.id);
                return RunOutcome {
                    status: RunStatus::Completed,
                    state,
                    log,
                    error: None,
                };
            };

            if visited.contains(&edge.target) {
                let count = revisits.entry(edge.target.clone()).or_insert(0);
                *count += 1;
                if *count > self.config.loop_cap {
                    let err = EngineError::LoopCapExceeded {
                        node: edge.target.clone(),
                        iterations: *count,
                    };
                    let target = edge.target.clone();
                    return self.fail(state, log, seq, &target, err);
                }
            }
            current = edge.target.clone();
        }
    }

    fn fail(
        &self,
        state: WorkflowState,
        mut log: Vec<LogEntry>,
        seq: u64,
        node: &str,
        err: EngineError,
    ) -> RunOutcome {
        log::error!("run failed at node '{node}': {err}");
        log.push(LogEntry::new(seq, node, state.clone()).with_message(err.to_string()));
        RunOutcome {
            status: RunStatus::Failed,
            state,
            log,
            error: Some(RunError::from(&err)),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
