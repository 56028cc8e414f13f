//! Pluggable LLM arbiter for agent selection.
//!
//! Grounded on `original_source/0.2/__main__.py`'s `analyze_request` (which
//! calls a `ChatOpenAI` model with a routing system prompt and falls back to
//! keyword analysis on failure) and `hello-a2a-python/hosts/cli/host_agent_cli.py`'s
//! model-backed host agent. The trait is intentionally minimal — a single
//! chat turn — since routing only ever needs one exchange.

use async_trait::async_trait;

use super::error::DispatchError;

/// A chat-completion backend used to arbitrate agent selection when the
/// keyword scorer alone isn't confident enough.
///
/// Implementations are expected to be cheap to construct and safe to share
/// across requests; `chat` should return quickly or fail — the selection
/// policy treats any error as "fall back to the keyword scorer".
#[async_trait]
pub trait LlmArbiter: Send + Sync {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, DispatchError>;
}

/// An [`LlmArbiter`] that speaks the OpenAI-compatible chat-completions API,
/// matching the `base_url`/`api_key`/`model` shape the reference CLI exposes
/// as `--llm-provider`/`--model-name` flags.
pub struct OpenAiCompatibleArbiter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleArbiter {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmArbiter for OpenAiCompatibleArbiter {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, DispatchError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": 0.0,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::LlmArbiterUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DispatchError::LlmArbiterUnavailable(format!(
                "arbiter returned HTTP {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DispatchError::LlmArbiterUnavailable(e.to_string()))?;

        value
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                DispatchError::LlmArbiterUnavailable("response missing choices[0].message.content".into())
            })
    }
}
