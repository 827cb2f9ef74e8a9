//! CLI channel: stdin/stdout REPL.
//!
//! Each line is routed and the reply written to the output. A few slash
//! commands bypass the router:
//! - `/tools` lists tool definitions
//! - `/tool <name> <json>` runs a tool directly
//! - `/agent <text>` lets the model pick tools
//! - `/quit` exits

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::OpsAgent;
use crate::router::Router;
use crate::tools::ToolRegistry;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    ListTools,
    RunTool {
        name: String,
        params: serde_json::Value,
    },
    Agent(String),
    Query(String),
    /// A malformed slash command, with the message to show.
    Invalid(String),
}

impl Command {
    /// Parse one input line. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let command = match line {
            "/quit" | "/exit" => Self::Quit,
            "/tools" => Self::ListTools,
            _ if line.starts_with("/tool ") => parse_tool_call(&line["/tool ".len()..]),
            "/agent" => Self::Invalid("usage: /agent <request>".to_string()),
            _ if line.starts_with("/agent ") => {
                Self::Agent(line["/agent ".len()..].trim().to_string())
            }
            _ => Self::Query(line.to_string()),
        };
        Some(command)
    }
}

fn parse_tool_call(rest: &str) -> Command {
    let rest = rest.trim();
    let (name, raw) = match rest.split_once(char::is_whitespace) {
        Some((name, raw)) => (name, raw.trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Command::Invalid("usage: /tool <name> <json params>".to_string());
    }

    let params = if raw.is_empty() {
        serde_json::json!({})
    } else {
        match serde_json::from_str(raw) {
            Ok(params) => params,
            Err(e) => return Command::Invalid(format!("invalid JSON params: {}", e)),
        }
    };
    Command::RunTool {
        name: name.to_string(),
        params,
    }
}

/// Interactive channel over any async line source and sink.
pub struct CliChannel {
    router: Router,
    tools: Arc<ToolRegistry>,
    agent: Option<OpsAgent>,
}

impl CliChannel {
    pub fn new(router: Router, tools: Arc<ToolRegistry>) -> Self {
        Self {
            router,
            tools,
            agent: None,
        }
    }

    /// Enable `/agent`.
    pub fn with_agent(mut self, agent: OpsAgent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Run until `/quit` or end of input.
    ///
    /// Routing and tool errors are reported on the output and the loop
    /// continues; only I/O errors on the streams end it early.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        eprint!("> ");
        while let Some(line) = lines.next_line().await? {
            let Some(command) = Command::parse(&line) else {
                eprint!("> ");
                continue;
            };

            let reply = match command {
                Command::Quit => break,
                Command::ListTools => self.describe_tools().await,
                Command::RunTool { name, params } => match self.tools.execute(&name, params).await {
                    Ok(out) => serde_json::to_string_pretty(&out.result)
                        .unwrap_or_else(|_| out.result.to_string()),
                    Err(e) => {
                        tracing::warn!(tool = %name, error = %e, "Tool call failed");
                        format!("Error: {}", e)
                    }
                },
                Command::Agent(text) => self.run_agent(&text).await,
                Command::Query(text) => match self.router.route(&text).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!(error = %e, "Request failed");
                        format!("Error: {}", e)
                    }
                },
                Command::Invalid(message) => format!("Error: {}", message),
            };

            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n\n").await?;
            output.flush().await?;
            eprint!("> ");
        }

        Ok(())
    }

    async fn run_agent(&self, text: &str) -> String {
        let Some(agent) = &self.agent else {
            return "Error: agent mode is not enabled".to_string();
        };
        match agent.run(text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Agent request failed");
                format!("Error: {}", e)
            }
        }
    }

    async fn describe_tools(&self) -> String {
        self.tools
            .tool_definitions()
            .await
            .iter()
            .map(|def| format!("{}: {}", def.name, def.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::{KnowledgeError, LlmError};
    use crate::knowledge::KnowledgeBase;
    use crate::llm::{
        CompletionRequest, CompletionResponse, LlmProvider, ToolCall, ToolCompletionRequest,
        ToolCompletionResponse,
    };
    use crate::ticket::TicketStore;

    struct EchoKnowledge;

    #[async_trait]
    impl KnowledgeBase for EchoKnowledge {
        async fn answer(&self, query: &str) -> Result<String, KnowledgeError> {
            Ok(format!("kb: {}", query))
        }
    }

    async fn channel(dir: &TempDir) -> CliChannel {
        let store = Arc::new(TicketStore::open(dir.path().join("tickets.json")).await);
        let knowledge: Arc<dyn KnowledgeBase> = Arc::new(EchoKnowledge);
        let tools = Arc::new(ToolRegistry::with_copilot_tools(
            Arc::clone(&store),
            Arc::clone(&knowledge),
        ));
        CliChannel::new(Router::new(store, knowledge), tools)
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse(" /tools "), Some(Command::ListTools));
        assert_eq!(
            Command::parse("list tickets"),
            Some(Command::Query("list tickets".into()))
        );
        assert_eq!(
            Command::parse(r#"/tool list_tickets {"status": "closed"}"#),
            Some(Command::RunTool {
                name: "list_tickets".into(),
                params: serde_json::json!({"status": "closed"}),
            })
        );
        assert_eq!(
            Command::parse("/tool list_tickets"),
            Some(Command::RunTool {
                name: "list_tickets".into(),
                params: serde_json::json!({}),
            })
        );
        assert!(matches!(
            Command::parse("/tool kb_search {oops"),
            Some(Command::Invalid(_))
        ));
        assert_eq!(
            Command::parse("/agent  open a P1 for payments "),
            Some(Command::Agent("open a P1 for payments".into()))
        );
        assert!(matches!(Command::parse("/agent"), Some(Command::Invalid(_))));
    }

    #[tokio::test]
    async fn session_routes_each_line() {
        let dir = TempDir::new().unwrap();
        let cli = channel(&dir).await;
        let input: &[u8] = b"list tickets\n\ncreate a p1 ticket for payments\nlist tickets\nhello\n/quit\nlist tickets\n";
        let mut output = Vec::new();

        cli.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        let replies: Vec<&str> = text.split("\n\n").filter(|s| !s.is_empty()).collect();

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0], "There are no open tickets at the moment.");
        assert_eq!(
            replies[1],
            "I've opened a P1 ticket for the payments service with ID T-0001."
        );
        assert!(replies[2].starts_with("Open tickets:\nT-0001 | service=payments"));
        assert_eq!(replies[3], "kb: hello");
    }

    #[tokio::test]
    async fn tool_commands_bypass_router() {
        let dir = TempDir::new().unwrap();
        let cli = channel(&dir).await;
        let input: &[u8] = b"/tools\n/tool create_ticket {\"service\": \"db\", \"summary\": \"slow\"}\n/tool list_tickets {\"status\": \"bogus\"}\n/tool nope\n";
        let mut output = Vec::new();

        cli.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("create_ticket: Create an incident ticket"));
        assert!(text.contains("kb_search: Query the Ops knowledge base"));
        assert!(text.contains("\"id\": \"T-0001\""));
        assert!(text.contains("Error: Invalid parameters for tool list_tickets"));
        assert!(text.contains("Error: Tool nope not found"));
    }

    /// Lists tickets on the first turn, then answers with the tool output.
    struct ListingLlm;

    #[async_trait]
    impl LlmProvider for ListingLlm {
        fn model_name(&self) -> &str {
            "listing"
        }

        async fn complete(&self, _: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            panic!("agent must use tool completions");
        }

        async fn complete_with_tools(
            &self,
            request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            if request.messages.len() == 1 {
                return Ok(ToolCompletionResponse {
                    content: None,
                    tool_calls: vec![ToolCall {
                        id: "call_1".into(),
                        name: "list_tickets".into(),
                        arguments: serde_json::json!({}),
                    }],
                });
            }
            let last = request.messages.last().map(|m| m.content.clone());
            Ok(ToolCompletionResponse {
                content: last,
                tool_calls: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn agent_command_dispatches_through_tools() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TicketStore::open(dir.path().join("tickets.json")).await);
        store.create("payments", "latency", Some("P1")).await.unwrap();
        let knowledge: Arc<dyn KnowledgeBase> = Arc::new(EchoKnowledge);
        let tools = Arc::new(ToolRegistry::with_copilot_tools(
            Arc::clone(&store),
            Arc::clone(&knowledge),
        ));
        let agent = OpsAgent::new(Arc::new(ListingLlm), Arc::clone(&tools));
        let cli = CliChannel::new(Router::new(store, knowledge), tools).with_agent(agent);

        let input: &[u8] = b"/agent what is open right now?\n";
        let mut output = Vec::new();
        cli.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("Result of list_tickets (call call_1):"));
        assert!(text.contains("\"id\":\"T-0001\""));
    }

    #[tokio::test]
    async fn agent_command_without_agent_reports_error() {
        let dir = TempDir::new().unwrap();
        let cli = channel(&dir).await;
        let input: &[u8] = b"/agent list tickets\n";
        let mut output = Vec::new();

        cli.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "Error: agent mode is not enabled\n\n");
    }
}
