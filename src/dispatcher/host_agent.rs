//! The host agent itself: owns the remote registry and selection policy,
//! and proxies user text to whichever remote agent the policy picks.
//!
//! Grounded on `hello-a2a-python/hosts/webui/backend/host_agent.py`'s
//! `HostAgent` (`create`, `register_agent_card`, message proxying through a
//! per-agent connection) and `hello-a2a-python/hosts/cli/host_agent_cli.py`'s
//! simpler send-and-wait CLI variant. Streaming proxying prefers
//! `message/stream` whenever the chosen card declares
//! `capabilities.streaming`, otherwise falls back to plain `message/send`.

use tracing::info;

use crate::client::{create_text_message, A2AClient};
use crate::error::A2AError;
use crate::server::append_artifact_to_task;
use crate::types::{
    AgentCard, Role, SendMessageParams, SendMessageResponse, StreamResponse, Task, TaskStatus,
};

use super::error::DispatchError;
use super::registry::AgentRegistry;
use super::selection::{SelectionPolicy, SelectionVerdict};

/// Owns a registry of remote agents and a selection policy, and proxies
/// incoming text to whichever remote is chosen for each request.
pub struct HostAgent {
    registry: AgentRegistry,
    policy: SelectionPolicy,
}

impl HostAgent {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            registry: AgentRegistry::new(),
            policy,
        }
    }

    /// Resolve every remote agent address up front, skipping (and logging)
    /// any that fail to resolve, then return the assembled host agent.
    pub async fn create(remote_agent_addresses: &[String], policy: SelectionPolicy) -> Self {
        let host = Self::new(policy);
        host.registry.register_all(remote_agent_addresses).await;
        host
    }

    pub fn register_agent_card(&self, card: AgentCard) {
        self.registry.register_card(card);
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Choose an agent for `query` without dispatching — useful for callers
    /// that want to inspect or log the verdict before proxying.
    pub async fn choose_agent(&self, query: &str) -> Result<SelectionVerdict, DispatchError> {
        if self.registry.is_empty() {
            return Err(DispatchError::NoAgentsRegistered);
        }
        let agents: Vec<(String, String)> = self
            .registry
            .list()
            .into_iter()
            .map(|card| (card.name, card.description))
            .collect();
        Ok(self.policy.select(query, &agents).await)
    }

    /// Dispatch `user_text` to the best-matching remote agent.
    pub async fn dispatch(&self, user_text: &str) -> Result<SendMessageResponse, DispatchError> {
        let verdict = self.choose_agent(user_text).await?;
        let agent_name = verdict
            .agent
            .ok_or_else(|| DispatchError::NoMatch(user_text.to_string()))?;

        info!(
            agent = %agent_name,
            confidence = verdict.confidence,
            method = ?verdict.method,
            "dispatching request to remote agent"
        );

        let card = self
            .registry
            .get(&agent_name)
            .ok_or_else(|| DispatchError::AgentNotFound(agent_name.clone()))?;
        let client = self.registry.client_for(&agent_name)?;

        if card.capabilities.streaming.unwrap_or(false) {
            self.dispatch_streaming(&client, user_text).await
        } else {
            let message = create_text_message(Role::User, user_text);
            let params = SendMessageParams {
                message,
                configuration: None,
                metadata: None,
                tenant: None,
            };
            Ok(client.send_message(params).await?)
        }
    }

    async fn dispatch_streaming(
        &self,
        client: &A2AClient,
        user_text: &str,
    ) -> Result<SendMessageResponse, DispatchError> {
        use futures::StreamExt;

        let message = create_text_message(Role::User, user_text);
        let params = SendMessageParams {
            message,
            configuration: None,
            metadata: None,
            tenant: None,
        };
        let mut stream = client.send_message_stream(params).await?;

        let mut task: Option<Task> = None;

        while let Some(event) = stream.next().await {
            match event? {
                StreamResponse::Task(snapshot) => task = Some(snapshot),
                StreamResponse::Message(message) => return Ok(SendMessageResponse::Message(message)),
                StreamResponse::StatusUpdate(update) => {
                    let is_final = update.r#final;
                    let status = update.status.clone();
                    match task.as_mut() {
                        Some(t) => t.status = status,
                        None => {
                            task = Some(Task {
                                id: update.task_id,
                                context_id: update.context_id,
                                kind: "task".to_string(),
                                status,
                                artifacts: None,
                                history: None,
                                metadata: None,
                            })
                        }
                    }
                    if is_final {
                        break;
                    }
                }
                StreamResponse::ArtifactUpdate(update) => {
                    let task_ref = task.get_or_insert_with(|| Task {
                        id: update.task_id.clone(),
                        context_id: update.context_id.clone(),
                        kind: "task".to_string(),
                        status: TaskStatus {
                            state: crate::types::TaskState::Working,
                            message: None,
                            timestamp: None,
                        },
                        artifacts: None,
                        history: None,
                        metadata: None,
                    });
                    append_artifact_to_task(task_ref, &update);
                }
            }
        }

        task.map(SendMessageResponse::Task).ok_or_else(|| {
            DispatchError::Transport(A2AError::invalid_agent_response(
                "remote agent's stream ended without ever producing a task snapshot",
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::SelectionPolicy;

    #[tokio::test]
    async fn dispatch_with_empty_registry_errors() {
        let host = HostAgent::new(SelectionPolicy::new(None, None));
        let err = host.dispatch("hello").await.unwrap_err();
        assert!(matches!(err, DispatchError::NoAgentsRegistered));
    }

    #[tokio::test]
    async fn choose_agent_with_one_registered_agent_picks_it() {
        use crate::builders::AgentCardBuilder;

        let host = HostAgent::new(SelectionPolicy::new(None, None));
        host.register_agent_card(
            AgentCardBuilder::new("solo", "the only agent", "1.0.0")
                .with_jsonrpc_interface("http://localhost:9/a2a")
                .build(),
        );

        let verdict = host.choose_agent("anything at all").await.unwrap();
        assert_eq!(verdict.agent.as_deref(), Some("solo"));
    }
}
