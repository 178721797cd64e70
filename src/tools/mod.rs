// SPDX-License-Identifier: MIT

//! Built-in tools for the sample summarization workflow
//!
//! split_text → generate_summaries → merge_summaries → refine_summary,
//! with refine_summary looping on itself until the draft fits the word
//! limit. The summarizers are rule based (word truncation); a deployment
//! wanting model-backed summaries swaps in its own `NodeTool` under the
//! same names.

use crate::workflow::registry::{NodeTool, ToolRegistry};
use crate::workflow::state::WorkflowState;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::Arc;

const DEFAULT_CHUNK_SIZE: u64 = 50;
const DEFAULT_PER_CHUNK_WORDS: u64 = 20;
const DEFAULT_SUMMARY_LIMIT: u64 = 40;

/// Register every built-in tool
pub async fn register_tools(registry: &ToolRegistry) {
    registry.register(Arc::new(SplitText)).await;
    registry.register(Arc::new(GenerateSummaries)).await;
    registry.register(Arc::new(MergeSummaries)).await;
    registry.register(Arc::new(RefineSummary)).await;
}

fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_size)
        .map(|chunk| chunk.join(" "))
        .collect()
}

fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Splits `text` into `chunks` of at most `chunk_size` words
pub struct SplitText;

#[async_trait]
impl NodeTool for SplitText {
    fn name(&self) -> &str {
        "split_text"
    }

    async fn apply(
        &self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
        let text = state.get_str("text").unwrap_or_default().to_string();
        let chunk_size = state.get_u64("chunk_size").unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err("chunk_size must be positive".into());
        }

        let chunks = chunk_words(&text, chunk_size as usize);
        state.set("chunks", json!(chunks));
        Ok(state)
    }
}

/// Summarizes each chunk by keeping its first `per_chunk_summary_words` words
pub struct GenerateSummaries;

#[async_trait]
impl NodeTool for GenerateSummaries {
    fn name(&self) -> &str {
        "generate_summaries"
    }

    async fn apply(
        &self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
        let chunks = string_items(state.get("chunks"));
        let max_words = state
            .get_u64("per_chunk_summary_words")
            .unwrap_or(DEFAULT_PER_CHUNK_WORDS) as usize;

        let summaries: Vec<String> = chunks
            .iter()
            .map(|chunk| truncate_words(chunk, max_words))
            .collect();
        state.set("summaries", json!(summaries));
        Ok(state)
    }
}

/// Joins `summaries` into one `draft_summary`
pub struct MergeSummaries;

#[async_trait]
impl NodeTool for MergeSummaries {
    fn name(&self) -> &str {
        "merge_summaries"
    }

    async fn apply(
        &self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
        let draft = string_items(state.get("summaries")).join(" ");
        state.set("draft_summary", json!(draft));
        Ok(state)
    }
}

/// Trims the draft to `summary_limit_words` and flags whether it fit
///
/// The trimmed text also replaces `draft_summary` so a refine loop shrinks
/// the draft each pass and converges instead of re-checking the same text
/// until the loop cap.
pub struct RefineSummary;

#[async_trait]
impl NodeTool for RefineSummary {
    fn name(&self) -> &str {
        "refine_summary"
    }

    async fn apply(
        &self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, Box<dyn Error + Send + Sync>> {
        let draft = state.get_str("draft_summary").unwrap_or_default().to_string();
        let limit = state
            .get_u64("summary_limit_words")
            .unwrap_or(DEFAULT_SUMMARY_LIMIT) as usize;

        let word_count = draft.split_whitespace().count();
        let final_summary = truncate_words(&draft, limit);

        state.set("is_summary_short_enough", json!(word_count <= limit));
        state.set("draft_summary", json!(final_summary.clone()));
        state.set("final_summary", json!(final_summary));
        Ok(state)
    }
}
