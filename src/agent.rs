//! Tool-calling agent.
//!
//! The keyword router handles fixed phrasings. The agent is the
//! model-driven entry point: the LLM sees the registered tool definitions,
//! decides which to call, and the calls are dispatched through the
//! [`ToolRegistry`]. Tool results go back to the model as a plain-text
//! user turn until it answers with text or the round limit is reached.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::llm::{ChatMessage, LlmProvider, ToolCall, ToolCompletionRequest};
use crate::tools::ToolRegistry;

pub const INSTRUCTION: &str = "You are an Enterprise Ops Copilot.

Your job is to help SREs and on-call engineers with:
- Creating and listing incident tickets
- Answering questions using the Ops runbook
- Keeping answers concise and operationally useful

Use tools when:
- The user asks to create a ticket (use create_ticket)
- The user asks to list or see tickets (use list_tickets)
- The user asks about procedures, runbooks, or troubleshooting (use kb_search)";

/// Model turns allowed to request tools before the agent gives up.
pub const MAX_TOOL_ROUNDS: usize = 5;

const AGENT_TEMPERATURE: f64 = 0.2;

pub struct OpsAgent {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    max_rounds: usize,
}

impl OpsAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Answer one request, calling tools as the model asks.
    ///
    /// Failing tools do not abort the turn: the error text is handed to
    /// the model like any other result.
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        let tools = self.tools.tool_definitions().await;
        let mut messages = vec![ChatMessage::user(input)];

        for round in 1..=self.max_rounds {
            let request = ToolCompletionRequest::new(INSTRUCTION, messages.clone(), tools.clone())
                .with_temperature(AGENT_TEMPERATURE);
            let response = self.llm.complete_with_tools(request).await?;

            if response.tool_calls.is_empty() {
                info!(rounds = round, "Agent answered");
                return Ok(response.content.unwrap_or_default());
            }

            debug!(round, calls = response.tool_calls.len(), "Agent requested tools");
            messages.push(ChatMessage::assistant(describe_calls(
                response.content.as_deref(),
                &response.tool_calls,
            )));

            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                results.push(self.run_tool(call).await);
            }
            messages.push(ChatMessage::user(results.join("\n\n")));
        }

        warn!(limit = self.max_rounds, "Agent stopped at the tool round limit");
        Err(AgentError::RoundLimit {
            limit: self.max_rounds,
        })
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        let outcome = match self.tools.execute(&call.name, call.arguments.clone()).await {
            Ok(output) => output.result.to_string(),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Agent tool call failed");
                format!("Error: {}", e)
            }
        };
        format!("Result of {} (call {}):\n{}", call.name, call.id, outcome)
    }
}

fn describe_calls(content: Option<&str>, calls: &[ToolCall]) -> String {
    content
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .into_iter()
        .chain(
            calls
                .iter()
                .map(|call| format!("Calling {} with {}", call.name, call.arguments)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}
