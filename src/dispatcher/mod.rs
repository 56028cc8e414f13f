//! Host-agent dispatcher — registry, keyword-weighted selection, and
//! proxying for routing user requests across remote A2A agents.
//!
//! This is not part of the base A2A protocol: it's the *host* side that
//! decides *which* remote agent should handle an incoming request and then
//! proxies the call through an ordinary [`crate::client::A2AClient`].
//! Grounded on `hello-a2a-python/hosts/webui/backend/host_agent.py`'s
//! `HostAgent` (registry-of-remote-connections, card-driven discovery,
//! message proxying) and `original_source/0.2/__main__.py`'s keyword-weighted
//! agent selection with an oldest-eviction, TTL-expiring query cache; the
//! scored-routing shape is
//! generalized from `cyberelf-ranch/multi-agent/src/team/router.rs`'s
//! `Router`.
//!
//! # Quick start
//!
//! ```no_run
//! use a2a_rs::dispatcher::{HostAgent, SelectionPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = SelectionPolicy::new(None, None);
//! let addresses = vec!["http://localhost:9001".to_string()];
//! let host = HostAgent::create(&addresses, policy).await;
//! let response = host.dispatch("what's the weather like today?").await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod host_agent;
mod keyword_scorer;
mod llm_arbiter;
mod registry;
mod selection;

pub use cache::VerdictCache;
pub use error::DispatchError;
pub use host_agent::HostAgent;
pub use keyword_scorer::{
    AmbiguousTerm, AmbiguousTermConfig, ContextVerdict, KeywordScorer, KeywordScorerConfig,
    Lexicon, LexiconConfig, ScoreVerdict,
};
pub use llm_arbiter::{LlmArbiter, OpenAiCompatibleArbiter};
pub use registry::AgentRegistry;
pub use selection::{
    SelectionMethod, SelectionPolicy, SelectionVerdict, AGREEMENT_CONFIDENCE_FLOOR,
    DISAGREEMENT_LLM_THRESHOLD,
};
