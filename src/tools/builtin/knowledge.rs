//! Runbook search tool.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::knowledge::KnowledgeBase;
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

/// Answers an operations question from the runbook knowledge base.
pub struct KbSearchTool {
    knowledge: Arc<dyn KnowledgeBase>,
}

impl KbSearchTool {
    pub fn new(knowledge: Arc<dyn KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for KbSearchTool {
    fn name(&self) -> &str {
        "kb_search"
    }

    fn description(&self) -> &str {
        "Query the Ops knowledge base. Use this for procedures, runbooks and \
         troubleshooting questions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to answer"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let query = require_str(&params, "query")?;

        let answer = self
            .knowledge
            .answer(query)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolOutput::success(
            serde_json::json!({ "answer": answer }),
            start.elapsed(),
        ))
    }
}
