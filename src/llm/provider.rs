//! Provider-agnostic LLM interface.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::LlmError;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u64 = 1024;

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System preamble.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.2,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Builder: set sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder: set the generation cap.
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Model output for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}

/// Tool description handed to the model (JSON-schema parameters).
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a text conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A conversation plus the tools the model may call.
///
/// The last message is the one being answered.
#[derive(Debug, Clone)]
pub struct ToolCompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl ToolCompletionRequest {
    pub fn new(
        system: impl Into<String>,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            system: system.into(),
            messages,
            tools,
            temperature: 0.2,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Builder: set sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Model output for a tool-enabled request: text, tool calls, or both.
#[derive(Debug, Clone, Default)]
pub struct ToolCompletionResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// An LLM backend that can answer a completion request.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier, e.g. `claude-sonnet-4-20250514`.
    fn model_name(&self) -> &str;

    /// Run a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Run a completion that may answer with tool calls.
    ///
    /// Providers without native tool support fall back to a plain
    /// completion over the flattened transcript and never call tools.
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| match m.role {
                Role::User => format!("User: {}", m.content),
                Role::Assistant => format!("Assistant: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let completion = CompletionRequest::new(request.system, prompt)
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);
        let response = self.complete(completion).await?;
        Ok(ToolCompletionResponse {
            content: Some(response.content),
            tool_calls: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextOnly;

    #[async_trait]
    impl LlmProvider for TextOnly {
        fn model_name(&self) -> &str {
            "text-only"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: format!("[{}] {}", request.system, request.prompt),
            })
        }
    }

    #[tokio::test]
    async fn text_only_provider_flattens_the_transcript() {
        let tools = vec![ToolDefinition {
            name: "list_tickets".into(),
            description: "List tickets".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let request = ToolCompletionRequest::new(
            "sys",
            vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
                ChatMessage::user("list tickets"),
            ],
            tools,
        );

        let response = TextOnly.complete_with_tools(request).await.unwrap();
        assert!(response.tool_calls.is_empty());
        assert_eq!(
            response.content.as_deref(),
            Some("[sys] User: hi\n\nAssistant: hello\n\nUser: list tickets")
        );
    }
}
