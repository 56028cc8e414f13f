//! Dispatcher-local error type.
//!
//! These never cross the wire as JSON-RPC errors — they surface to the
//! `host-agent` binary or to library callers driving a [`super::HostAgent`]
//! directly.

use crate::error::A2AError;

/// Errors raised while registering remote agents or selecting/dispatching
/// to one of them.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The registry has no remote agents registered.
    #[error("no agents registered")]
    NoAgentsRegistered,

    /// The named agent is not present in the registry.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// The selection policy could not settle on any agent for the query.
    #[error("no agent matched query: {0}")]
    NoMatch(String),

    /// The LLM arbiter could not be reached or returned unusable output.
    /// Non-fatal — callers fall back to the keyword scorer.
    #[error("LLM arbiter unavailable: {0}")]
    LlmArbiterUnavailable(String),

    /// Failure proxying a message through the A2A client to the chosen
    /// remote agent, or resolving its agent card.
    #[error(transparent)]
    Transport(#[from] A2AError),
}
