//! `host-agent` — runs the host-agent dispatcher as a standalone A2A server.
//!
//! Registers a set of remote agents at startup, exposes itself as an
//! ordinary A2A agent, and proxies every incoming message to whichever
//! remote agent the selection policy picks.
//!
//! Grounded on `demos/echo_agent.rs`'s server-wiring boilerplate
//! (`AgentCardBuilder` → executor → `InMemoryTaskStore` →
//! `DefaultRequestHandler` → `a2a_router` → `axum::serve`) and
//! `hello-a2a-python/hosts/cli/host_agent_cli.py`'s CLI flag surface
//! (`--remote`, `--llm-provider`, `--model-name`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use a2a_rs::builders::AgentCardBuilder;
use a2a_rs::dispatcher::{
    HostAgent, KeywordScorer, KeywordScorerConfig, LlmArbiter, OpenAiCompatibleArbiter,
    SelectionPolicy,
};
use a2a_rs::error::A2AResult;
use a2a_rs::server::{
    a2a_router, AgentExecutor, DefaultRequestHandler, EventQueue, InMemoryTaskStore,
    RequestContext, TaskUpdater,
};
use a2a_rs::types::{Part, SendMessageResponse};
use async_trait::async_trait;
use clap::Parser;
use tracing::{error, info};

/// Run the A2A host-agent dispatcher: routes incoming requests to one of
/// several remote A2A agents based on keyword scoring and (optionally) an
/// LLM arbiter.
#[derive(Parser, Debug)]
#[command(name = "host-agent", version, about)]
struct Cli {
    /// Interface to bind the host agent's own A2A server to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the host agent's own A2A server to.
    #[arg(long)]
    port: u16,

    /// Base URL of a remote agent to register. Repeat for multiple agents.
    #[arg(long = "remote", required = true)]
    remotes: Vec<String>,

    /// Human-readable name for this host agent's own agent card.
    #[arg(long, default_value = "Host Agent")]
    agent_type: String,

    /// Base URL of an OpenAI-compatible chat-completions endpoint used to
    /// arbitrate ambiguous routing decisions. Omit to use keyword scoring only.
    #[arg(long)]
    llm_provider: Option<String>,

    /// Model name to request from `--llm-provider`.
    #[arg(long, default_value = "gpt-4o-mini")]
    model_name: String,

    /// API key for `--llm-provider`, if required.
    #[arg(long, env = "HOST_AGENT_LLM_API_KEY")]
    api_key: Option<String>,

    /// Path to a JSON file describing the keyword-scorer vocabulary (see
    /// [`a2a_rs::dispatcher::KeywordScorerConfig`]). The two domain names
    /// must match the names under which the corresponding remote agents are
    /// registered. Omit to use the built-in currency/element reference
    /// vocabulary, which only routes correctly when the registered remote
    /// agents are named `"currency"` and `"element"`.
    #[arg(long)]
    keyword_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.remotes.is_empty() {
        error!("at least one --remote agent address is required");
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "host agent exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let arbiter: Option<Arc<dyn LlmArbiter>> = cli.llm_provider.map(move |base_url| {
        Arc::new(OpenAiCompatibleArbiter::new(base_url, cli.model_name, cli.api_key)) as Arc<dyn LlmArbiter>
    });

    let scorer = match &cli.keyword_config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading --keyword-config {}: {e}", path.display()))?;
            let config: KeywordScorerConfig = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("parsing --keyword-config {}: {e}", path.display()))?;
            config.build()
        }
        None => {
            info!(
                "no --keyword-config given, using the built-in currency/element reference \
                 vocabulary; keyword routing only works if remote agents are named \
                 \"currency\" and \"element\""
            );
            KeywordScorer::reference_currency_element()
        }
    };

    let policy = SelectionPolicy::new(Some(scorer), arbiter);
    let host = Arc::new(HostAgent::create(&cli.remotes, policy).await);

    if host.registry().is_empty() {
        anyhow::bail!("none of the configured --remote agents could be reached");
    }
    info!(agents = ?host.registry().names(), "host agent ready, remote agents registered");

    let url = format!("http://{}:{}/a2a", cli.host, cli.port);
    let mut card_builder = AgentCardBuilder::new(
        cli.agent_type,
        "Routes requests across a pool of specialized remote A2A agents",
        env!("CARGO_PKG_VERSION"),
    )
    .with_jsonrpc_interface(url)
    .with_streaming(false);

    for remote in host.registry().list() {
        card_builder = card_builder.with_skill(
            format!("route-to-{}", remote.name),
            remote.name.clone(),
            remote.description.clone(),
            vec!["routing".to_string()],
        );
    }
    let agent_card = card_builder.build();

    let executor: Arc<dyn AgentExecutor> = Arc::new(DispatchingExecutor { host });
    let store = Arc::new(InMemoryTaskStore::new());
    let handler = Arc::new(DefaultRequestHandler::new(executor, store));
    let app = a2a_router(handler, agent_card);

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    info!(host = %cli.host, port = cli.port, "host agent listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Adapts [`HostAgent::dispatch`] to the [`AgentExecutor`] trait so the host
/// agent can itself be served as an ordinary A2A agent.
struct DispatchingExecutor {
    host: Arc<HostAgent>,
}

#[async_trait]
impl AgentExecutor for DispatchingExecutor {
    async fn execute(&self, context: RequestContext, event_queue: EventQueue) -> A2AResult<()> {
        let updater = TaskUpdater::new(event_queue, context.task_id.clone(), context.context_id.clone());
        let input = context.get_user_input("\n");

        match self.host.dispatch(&input).await {
            Ok(SendMessageResponse::Message(message)) => {
                let text = message
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                updater.complete_with_text(&text).await?;
            }
            Ok(SendMessageResponse::Task(task)) => {
                let summary = task
                    .status
                    .message
                    .as_ref()
                    .map(|m| {
                        m.parts
                            .iter()
                            .filter_map(|part| match part {
                                Part::Text { text, .. } => Some(text.as_str()),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_else(|| format!("remote task {} is {:?}", task.id, task.status.state));
                updater.complete_with_text(&summary).await?;
            }
            Err(e) => {
                updater.failed_with_text(&format!("dispatch failed: {e}")).await?;
            }
        }

        Ok(())
    }

    async fn cancel(&self, context: RequestContext, event_queue: EventQueue) -> A2AResult<()> {
        let updater = TaskUpdater::new(event_queue, context.task_id, context.context_id);
        updater.cancel(None).await?;
        Ok(())
    }
}
