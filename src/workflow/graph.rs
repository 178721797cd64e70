// SPDX-License-Identifier: MIT

//! Graph definitions and compilation
//!
//! A `GraphDef` is what clients submit (and what workflow files contain).
//! Compilation validates it and resolves every node's tool and every edge
//! condition exactly once, producing an immutable `Graph` that any number
//! of concurrent runs can read.

use crate::error::EngineError;
use crate::workflow::condition::Condition;
use crate::workflow::registry::{NodeTool, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A graph definition as submitted by a client
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GraphDef {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    /// Identifier of the entry node
    pub entry: String,
}

/// A node in the definition: an identifier bound to a named tool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeDef {
    pub id: String,
    /// Name of the registered tool this node invokes
    pub tool: String,
}

/// A directed, optionally conditional edge
///
/// Edges sharing a `from` node are evaluated in declared order,
/// first match wins. An edge without `when` always matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeDef {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

/// A compiled edge: target plus parsed condition
pub struct CompiledEdge {
    pub target: String,
    pub condition: Option<Condition>,
}

/// A compiled node: tool resolved, outgoing edges in declared order
pub struct CompiledNode {
    pub id: String,
    pub tool: Arc<dyn NodeTool>,
    pub edges: Vec<CompiledEdge>,
}

/// An immutable, validated workflow graph
pub struct Graph {
    pub id: Uuid,
    pub entry: String,
    nodes: HashMap<String, CompiledNode>,
    def: GraphDef,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Graph {
    /// Validate and compile a definition against the tool registry
    pub async fn compile(def: GraphDef, registry: &ToolRegistry) -> Result<Self, EngineError> {
        if def.nodes.is_empty() {
            return Err(EngineError::validation("graph has no nodes"));
        }

        let mut nodes: HashMap<String, CompiledNode> = HashMap::new();
        for node_def in &def.nodes {
            if nodes.contains_key(&node_def.id) {
                return Err(EngineError::validation(format!(
                    "duplicate node id '{}'",
                    node_def.id
                )));
            }
            let tool = registry
                .get(&node_def.tool)
                .await
                .ok_or_else(|| EngineError::not_found("tool", node_def.tool.as_str()))?;
            nodes.insert(
                node_def.id.clone(),
                CompiledNode {
                    id: node_def.id.clone(),
                    tool,
                    edges: Vec::new(),
                },
            );
        }

        if !nodes.contains_key(&def.entry) {
            return Err(EngineError::validation(format!(
                "entry node '{}' is not defined",
                def.entry
            )));
        }

        for edge in &def.edges {
            if !nodes.contains_key(&edge.to) {
                return Err(EngineError::validation(format!(
                    "edge target '{}' is not a node",
                    edge.to
                )));
            }
            let source = nodes.get_mut(&edge.from).ok_or_else(|| {
                EngineError::validation(format!("edge source '{}' is not a node", edge.from))
            })?;
            if source.edges.iter().any(|e| e.condition.is_none()) {
                // The unconditional edge is the default successor; anything
                // declared after it could never be reached.
                return Err(EngineError::validation(format!(
                    "node '{}' declares edges after its unconditional edge",
                    edge.from
                )));
            }
            let condition = edge.when.as_deref().map(Condition::parse).transpose()?;
            source.edges.push(CompiledEdge {
                target: edge.to.clone(),
                condition,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            entry: def.entry.clone(),
            nodes,
            def,
        })
    }

    pub fn node(&self, id: &str) -> Option<&CompiledNode> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The definition this graph was compiled from
    pub fn def(&self) -> &GraphDef {
        &self.def
    }
}
