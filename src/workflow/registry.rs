// SPDX-License-Identifier: MIT

use crate::workflow::state::WorkflowState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A node's transformation capability
///
/// Tools receive the current state by value and return the authoritative
/// next state. A tool may add, overwrite, or drop keys; the engine trusts
/// whatever comes back. Tools that perform external I/O simply take longer,
/// the engine awaits them before evaluating edges.
#[async_trait]
pub trait NodeTool: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(
        &self,
        state: WorkflowState,
    ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>>;
}

/// Registry mapping tool names to implementations
///
/// Graph compilation resolves each node's tool through this registry once;
/// execution never looks tools up again.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn NodeTool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, tool: Arc<dyn NodeTool>) {
        let mut tools = self.tools.write().await;
        tools.insert(tool.name().to_string(), tool);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn NodeTool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MarkerTool {
        name: String,
    }

    impl MarkerTool {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl NodeTool for MarkerTool {
        fn name(&self) -> &str {
            &self.name
        }

        async fn apply(
            &self,
            mut state: WorkflowState,
        ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
            state.set(self.name.clone(), json!(true));
            Ok(state)
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MarkerTool::new("split"))).await;

        let tool = registry.get("split").await;
        assert!(tool.is_some());
        assert_eq!(tool.unwrap().name(), "split");
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_register_overwrites() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MarkerTool::new("same"))).await;
        registry.register(Arc::new(MarkerTool::new("same"))).await;
        assert!(registry.get("same").await.is_some());
    }

    #[tokio::test]
    async fn test_registry_is_clone() {
        let registry = ToolRegistry::new();
        let cloned = registry.clone();
        cloned.register(Arc::new(MarkerTool::new("shared"))).await;

        // Clones share the same underlying map
        assert!(registry.get("shared").await.is_some());
    }

    #[tokio::test]
    async fn test_tool_transforms_state() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(MarkerTool::new("mark"))).await;

        let tool = registry.get("mark").await.unwrap();
        let state = tool.apply(WorkflowState::empty()).await.unwrap();
        assert_eq!(state.get("mark"), Some(&json!(true)));
    }
}
