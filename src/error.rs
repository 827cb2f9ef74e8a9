//! Error types for Ops Copilot.

/// Top-level error type for the copilot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ticket error: {0}")]
    Ticket(#[from] TicketError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Ticket store errors.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Invalid ticket status {status:?}: status must be 'OPEN' or 'CLOSED'")]
    InvalidStatus { status: String },

    #[error("No ticket id left after T-{last}")]
    IdsExhausted { last: u64 },

    #[error("Failed to write ticket log {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Knowledge base errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge base file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} not found")]
    NotFound { name: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameters for tool {name}: {reason}")]
    InvalidParameters { name: String, reason: String },

    #[error("Tool {name} execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },
}

/// Errors surfaced while routing a request.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Ticket store failed: {0}")]
    Ticket(#[from] TicketError),

    #[error("Knowledge lookup failed: {0}")]
    Knowledge(#[from] KnowledgeError),
}

/// Errors from the tool-calling agent. Tool failures are not here: they
/// are reported back to the model.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Gave up after {limit} rounds of tool calls")]
    RoundLimit { limit: usize },
}

/// Result type alias for the copilot.
pub type Result<T> = std::result::Result<T, Error>;
