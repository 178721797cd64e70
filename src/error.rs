// SPDX-License-Identifier: MIT

//! Typed error handling for stategraph
//!
//! Every operation boundary (create graph, start run, get run) returns one of
//! these variants; callers get a stable kind plus a human-readable message.

use thiserror::Error;

/// Top-level error type for stategraph
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed graph definition at creation time (duplicate node id,
    /// unknown edge endpoint, missing entry node, bad condition syntax)
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown graph, run, or tool identifier on lookup
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A node's tool failed during execution
    #[error("node '{node}' failed: {message}")]
    Transformation { node: String, message: String },

    /// A revisited node exceeded the configured loop cap
    #[error("loop cap exceeded: node '{node}' revisited {iterations} times")]
    LoopCapExceeded { node: String, iterations: u32 },
}

impl EngineError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a transformation error
    pub fn transformation(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transformation {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable kind, used in API payloads and run records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Transformation { .. } => "transformation",
            Self::LoopCapExceeded { .. } => "loop_cap_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(EngineError::validation("x").kind(), "validation");
        assert_eq!(EngineError::not_found("graph", "abc").kind(), "not_found");
        assert_eq!(
            EngineError::transformation("split", "boom").kind(),
            "transformation"
        );
        assert_eq!(
            EngineError::LoopCapExceeded {
                node: "refine".to_string(),
                iterations: 25,
            }
            .kind(),
            "loop_cap_exceeded"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = EngineError::not_found("run", "1234");
        assert_eq!(err.to_string(), "run '1234' not found");

        let err = EngineError::transformation("merge", "missing key");
        assert_eq!(err.to_string(), "node 'merge' failed: missing key");
    }
}
