use std::sync::Arc;

use ops_copilot::agent::OpsAgent;
use ops_copilot::channels::CliChannel;
use ops_copilot::config::{CopilotConfig, DEFAULT_ENV_FILE};
use ops_copilot::knowledge::{KnowledgeBase, RagKnowledgeBase};
use ops_copilot::llm::create_provider;
use ops_copilot::router::Router;
use ops_copilot::ticket::{LoadOutcome, TicketStore};
use ops_copilot::tools::ToolRegistry;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> ops_copilot::error::Result<()> {
    // Logs go to stderr; stdout carries only replies.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let config = match CopilotConfig::from_env_and_file(DEFAULT_ENV_FILE) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
            std::process::exit(1);
        }
    };

    eprintln!("🛠  Ops Copilot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({})", config.llm.model, config.llm.backend);

    let llm = create_provider(&config.llm)?;

    // ── Tickets ─────────────────────────────────────────────────────────
    let store = Arc::new(TicketStore::open(&config.tickets_path).await);
    match store.load_outcome() {
        LoadOutcome::Discarded { reason } => eprintln!(
            "   Warning: ticket log {} was unreadable and will be moved aside on the next write ({})",
            config.tickets_path.display(),
            reason
        ),
        LoadOutcome::Loaded { skipped, .. } if *skipped > 0 => eprintln!(
            "   Tickets: {} ({} loaded, {} records not recognized)",
            config.tickets_path.display(),
            store.len().await,
            skipped
        ),
        _ => eprintln!(
            "   Tickets: {} ({} loaded)",
            config.tickets_path.display(),
            store.len().await
        ),
    }

    // ── Knowledge base ──────────────────────────────────────────────────
    let rag = RagKnowledgeBase::build(&config.knowledge, Arc::clone(&llm)).await?;
    eprintln!(
        "   Knowledge base: {} ({} chunks)",
        config.knowledge.path.display(),
        rag.chunk_count()
    );
    let knowledge: Arc<dyn KnowledgeBase> = Arc::new(rag);

    // ── Router, tools, agent ────────────────────────────────────────────
    let tools = Arc::new(ToolRegistry::with_copilot_tools(
        Arc::clone(&store),
        Arc::clone(&knowledge),
    ));
    eprintln!("   Tools: {}", tools.list().await.join(", "));
    eprintln!(
        "   Type a request and press Enter. /agent <text> lets the model pick tools, /tools lists tools, /quit exits.\n"
    );

    let agent = OpsAgent::new(llm, Arc::clone(&tools));
    let router = Router::new(store, knowledge);
    let cli = CliChannel::new(router, tools).with_agent(agent);
    cli.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    Ok(())
}
