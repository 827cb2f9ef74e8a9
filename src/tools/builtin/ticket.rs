//! Ticket tools: direct access to the ticket store, bypassing the router.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::TicketError;
use crate::ticket::{DEFAULT_PRIORITY, TicketStore};
use crate::tools::tool::{Tool, ToolError, ToolOutput, optional_str, require_str};

/// Opens a new incident ticket.
pub struct CreateTicketTool {
    store: Arc<TicketStore>,
}

impl CreateTicketTool {
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateTicketTool {
    fn name(&self) -> &str {
        "create_ticket"
    }

    fn description(&self) -> &str {
        "Create an incident ticket and store it in the ticket log. Use this when the \
         user asks to open, raise or file a ticket for a service."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "service": {
                    "type": "string",
                    "description": "Affected service, e.g. payments"
                },
                "summary": {
                    "type": "string",
                    "description": "What is going wrong"
                },
                "priority": {
                    "type": "string",
                    "description": format!("Priority such as P1 or P2 (default: {})", DEFAULT_PRIORITY)
                }
            },
            "required": ["service", "summary"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let service = require_str(&params, "service")?;
        let summary = require_str(&params, "summary")?;
        let priority = optional_str(&params, "priority");

        let ticket = self
            .store
            .create(service, summary, priority)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let result = serde_json::to_value(&ticket).map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

/// Lists tickets by status.
pub struct ListTicketsTool {
    store: Arc<TicketStore>,
}

impl ListTicketsTool {
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListTicketsTool {
    fn name(&self) -> &str {
        "list_tickets"
    }

    fn description(&self) -> &str {
        "List incident tickets filtered by status (OPEN or CLOSED), oldest first."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["OPEN", "CLOSED"],
                    "description": "Ticket status, case-insensitive (default: OPEN)"
                }
            }
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let status = optional_str(&params, "status").unwrap_or("OPEN");

        let tickets = self.store.list(status).await.map_err(|e| match e {
            TicketError::InvalidStatus { .. } => ToolError::InvalidParameters {
                name: self.name().to_string(),
                reason: e.to_string(),
            },
            other => ToolError::ExecutionFailed {
                name: self.name().to_string(),
                reason: other.to_string(),
            },
        })?;

        Ok(ToolOutput::success(
            serde_json::json!({ "tickets": tickets }),
            start.elapsed(),
        ))
    }
}
