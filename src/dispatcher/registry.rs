//! Registry of remote agents available to the host agent.
//!
//! Grounded on `hello-a2a-python/hosts/webui/backend/host_agent.py`'s
//! `HostAgent`, which keeps `remote_agent_connections`/`cards` dictionaries
//! keyed by agent name, built at startup by resolving each configured base
//! URL's card and skipping (with a log) any that fail to resolve.

use dashmap::DashMap;
use tracing::{info, warn};

use crate::client::{A2AClient, CardResolver};
use crate::types::AgentCard;

use super::error::DispatchError;

/// Holds every remote agent card the host agent knows about, keyed by the
/// card's `name`. Building an [`A2AClient`] from a card is cheap, so clients
/// are created on demand rather than cached here.
pub struct AgentRegistry {
    cards: DashMap<String, AgentCard>,
    resolver: CardResolver,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            cards: DashMap::new(),
            resolver: CardResolver::new(),
        }
    }

    /// Resolve and register the agent card served at `base_url`.
    pub async fn register(&self, base_url: &str) -> Result<String, DispatchError> {
        let card = self.resolver.resolve(base_url).await?;
        let name = card.name.clone();
        info!(agent = %name, url = base_url, "registered remote agent");
        self.cards.insert(name.clone(), card);
        Ok(name)
    }

    /// Register every base URL, logging and skipping any that fail to resolve.
    pub async fn register_all(&self, base_urls: &[String]) {
        for url in base_urls {
            if let Err(e) = self.register(url).await {
                warn!(url = %url, error = %e, "failed to register remote agent, skipping");
            }
        }
    }

    /// Register an already-resolved card directly, bypassing discovery.
    pub fn register_card(&self, card: AgentCard) {
        self.cards.insert(card.name.clone(), card);
    }

    pub fn get(&self, name: &str) -> Option<AgentCard> {
        self.cards.get(name).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<AgentCard> {
        self.cards.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.cards.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Build a client for the named agent's card.
    pub fn client_for(&self, name: &str) -> Result<A2AClient, DispatchError> {
        let card = self
            .get(name)
            .ok_or_else(|| DispatchError::AgentNotFound(name.to_string()))?;
        Ok(A2AClient::from_card(card)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::AgentCardBuilder;

    fn sample_card(name: &str) -> AgentCard {
        AgentCardBuilder::new(name, format!("{name} test agent"), "1.0.0")
            .with_jsonrpc_interface(format!("http://localhost/{name}"))
            .build()
    }

    #[test]
    fn register_card_and_lookup() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty());
        registry.register_card(sample_card("weather"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("weather").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn client_for_unknown_agent_errors() {
        let registry = AgentRegistry::new();
        let err = registry.client_for("nope").unwrap_err();
        assert!(matches!(err, DispatchError::AgentNotFound(_)));
    }
}
