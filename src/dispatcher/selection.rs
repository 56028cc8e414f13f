//! Combines the keyword scorer and an optional LLM arbiter into one verdict.
//!
//! Grounded on `original_source/0.2/__main__.py`'s `analyze_request` (LLM
//! first, keyword fallback on failure) and the routing-struct shape of
//! `cyberelf-ranch/multi-agent/src/team/router.rs`. The combiner logic
//! itself — trust the scorer outright above a confidence floor, otherwise
//! defer to the LLM on disagreement, which agrees-or-escalates below it — is
//! this crate's generalization of the reference's ad hoc agent/confidence
//! cache into an explicit, testable policy.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::cache::VerdictCache;
use super::keyword_scorer::KeywordScorer;
use super::llm_arbiter::LlmArbiter;

/// Confidence floor below which the keyword scorer alone is not trusted.
pub const DISAGREEMENT_LLM_THRESHOLD: f64 = 0.65;

/// Confidence floor asserted once the scorer and the LLM arbiter agree.
pub const AGREEMENT_CONFIDENCE_FLOOR: f64 = 0.85;

/// How a [`SelectionVerdict`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    /// The keyword scorer alone, either because no arbiter is configured or
    /// the arbiter was unreachable.
    Keyword,
    /// The LLM arbiter alone, because the scorer wasn't confident enough to
    /// stand behind its pick.
    Llm,
    /// Scorer and arbiter agreed.
    Combined,
}

/// Outcome of [`SelectionPolicy::select`].
#[derive(Debug, Clone)]
pub struct SelectionVerdict {
    /// Name of the chosen agent, or `None` if no agent could be chosen at all.
    pub agent: Option<String>,
    pub confidence: f64,
    pub method: SelectionMethod,
}

/// Decides which registered agent should handle a query, blending a
/// deterministic keyword scorer with an optional LLM arbiter and caching
/// both verdicts by normalized query text.
pub struct SelectionPolicy {
    scorer: Option<KeywordScorer>,
    arbiter: Option<Arc<dyn LlmArbiter>>,
    cache: VerdictCache<SelectionVerdict>,
}

impl SelectionPolicy {
    pub fn new(scorer: Option<KeywordScorer>, arbiter: Option<Arc<dyn LlmArbiter>>) -> Self {
        Self::with_cache_ttl(scorer, arbiter, Duration::from_secs(3600))
    }

    pub fn with_cache_ttl(
        scorer: Option<KeywordScorer>,
        arbiter: Option<Arc<dyn LlmArbiter>>,
        ttl: Duration,
    ) -> Self {
        Self {
            scorer,
            arbiter,
            cache: VerdictCache::new(1000, ttl),
        }
    }

    /// Choose among `agents` (name, description pairs) for `query`.
    pub async fn select(&self, query: &str, agents: &[(String, String)]) -> SelectionVerdict {
        if let Some(cached) = self.cache.get(query) {
            debug!(query, "selection cache hit");
            return cached;
        }

        let verdict = self.select_uncached(query, agents).await;
        self.cache.set(query, verdict.clone());
        verdict
    }

    async fn select_uncached(&self, query: &str, agents: &[(String, String)]) -> SelectionVerdict {
        let keyword_verdict = self.scorer.as_ref().map(|scorer| scorer.score(query));

        let Some(arbiter) = &self.arbiter else {
            return match keyword_verdict {
                Some(kw) => SelectionVerdict {
                    agent: Some(kw.domain),
                    confidence: kw.confidence,
                    method: SelectionMethod::Keyword,
                },
                None => SelectionVerdict {
                    agent: agents.first().map(|(name, _)| name.clone()),
                    confidence: 0.0,
                    method: SelectionMethod::Keyword,
                },
            };
        };

        let llm_pick = match self.ask_llm(arbiter.as_ref(), query, agents).await {
            Ok(pick) => pick,
            Err(e) => {
                warn!(query, error = %e, "LLM arbiter unavailable, falling back to keyword scorer");
                None
            }
        };

        match (keyword_verdict, llm_pick) {
            (Some(kw), Some(llm_agent)) => {
                if llm_agent.eq_ignore_ascii_case(&kw.domain) {
                    SelectionVerdict {
                        agent: Some(kw.domain),
                        confidence: kw.confidence.max(AGREEMENT_CONFIDENCE_FLOOR),
                        method: SelectionMethod::Combined,
                    }
                } else if kw.confidence < DISAGREEMENT_LLM_THRESHOLD {
                    SelectionVerdict {
                        agent: Some(llm_agent),
                        confidence: 0.8,
                        method: SelectionMethod::Llm,
                    }
                } else {
                    SelectionVerdict {
                        agent: Some(kw.domain),
                        confidence: kw.confidence,
                        method: SelectionMethod::Keyword,
                    }
                }
            }
            (Some(kw), None) => SelectionVerdict {
                agent: Some(kw.domain),
                confidence: kw.confidence,
                method: SelectionMethod::Keyword,
            },
            (None, Some(llm_agent)) => SelectionVerdict {
                agent: Some(llm_agent),
                confidence: 0.8,
                method: SelectionMethod::Llm,
            },
            (None, None) => SelectionVerdict {
                agent: agents.first().map(|(name, _)| name.clone()),
                confidence: 0.0,
                method: SelectionMethod::Keyword,
            },
        }
    }

    async fn ask_llm(
        &self,
        arbiter: &dyn LlmArbiter,
        query: &str,
        agents: &[(String, String)],
    ) -> Result<Option<String>, super::error::DispatchError> {
        let agent_list = agents
            .iter()
            .map(|(name, description)| format!("- {name}: {description}"))
            .collect::<Vec<_>>()
            .join("\n");

        let system_prompt =
            "You are a routing decision system. Given a user request and a list of \
             candidate agents, respond with only the name of the single agent best \
             suited to handle it.";
        let user_prompt = format!("Agents:\n{agent_list}\n\nUser request: {query}");

        let response = arbiter.chat(system_prompt, &user_prompt).await?;
        let response_lower = response.to_lowercase();

        Ok(agents
            .iter()
            .find(|(name, _)| response_lower.contains(&name.to_lowercase()))
            .map(|(name, _)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::keyword_scorer::{AmbiguousTerm, Lexicon};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn trivial_scorer() -> KeywordScorer {
        let a = Lexicon::new("alpha", [("foo", 1.0)]);
        let b = Lexicon::new("beta", [("bar", 3.0)]);
        KeywordScorer::new(a, b, Vec::<AmbiguousTerm>::new(), Lexicon::new("a", []), Lexicon::new("b", []))
    }

    struct FixedArbiter {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmArbiter for FixedArbiter {
        async fn chat(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, super::super::error::DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FailingArbiter;

    #[async_trait]
    impl LlmArbiter for FailingArbiter {
        async fn chat(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, super::super::error::DispatchError> {
            Err(super::super::error::DispatchError::LlmArbiterUnavailable("boom".into()))
        }
    }

    fn agents() -> Vec<(String, String)> {
        vec![
            ("alpha".to_string(), "handles foo".to_string()),
            ("beta".to_string(), "handles bar".to_string()),
        ]
    }

    #[tokio::test]
    async fn trusts_llm_when_scorer_unconfident_and_disagreeing() {
        // "bar" alone gives beta full confidence (1.0), so force a genuine
        // low-confidence tie by using a query with no keyword signal at all.
        let arbiter = Arc::new(FixedArbiter { reply: "alpha".to_string(), calls: AtomicUsize::new(0) });
        let policy = SelectionPolicy::new(Some(trivial_scorer()), Some(arbiter));
        let verdict = policy.select("ambiguous request with no keywords", &agents()).await;
        assert_eq!(verdict.agent.as_deref(), Some("alpha"));
        assert_eq!(verdict.method, SelectionMethod::Llm);
    }

    #[tokio::test]
    async fn trusts_scorer_above_threshold_on_disagreement() {
        let arbiter = Arc::new(FixedArbiter { reply: "alpha".to_string(), calls: AtomicUsize::new(0) });
        let policy = SelectionPolicy::new(Some(trivial_scorer()), Some(arbiter));
        // "bar" scores beta with full confidence (1.0), above the threshold.
        let verdict = policy.select("tell me about bar", &agents()).await;
        assert_eq!(verdict.agent.as_deref(), Some("beta"));
        assert_eq!(verdict.method, SelectionMethod::Keyword);
    }

    #[tokio::test]
    async fn agreement_floors_confidence() {
        let arbiter = Arc::new(FixedArbiter { reply: "beta".to_string(), calls: AtomicUsize::new(0) });
        let policy = SelectionPolicy::new(Some(trivial_scorer()), Some(arbiter));
        let verdict = policy.select("tell me about bar", &agents()).await;
        assert_eq!(verdict.agent.as_deref(), Some("beta"));
        assert_eq!(verdict.method, SelectionMethod::Combined);
        assert!(verdict.confidence >= AGREEMENT_CONFIDENCE_FLOOR);
    }

    #[tokio::test]
    async fn unreachable_arbiter_falls_back_to_scorer() {
        let policy = SelectionPolicy::new(Some(trivial_scorer()), Some(Arc::new(FailingArbiter)));
        let verdict = policy.select("tell me about bar", &agents()).await;
        assert_eq!(verdict.agent.as_deref(), Some("beta"));
        assert_eq!(verdict.method, SelectionMethod::Keyword);
    }

    #[tokio::test]
    async fn cache_hit_avoids_a_second_llm_call() {
        let arbiter = Arc::new(FixedArbiter { reply: "beta".to_string(), calls: AtomicUsize::new(0) });
        let policy = SelectionPolicy::new(Some(trivial_scorer()), Some(arbiter.clone()));

        policy.select("tell me about bar", &agents()).await;
        policy.select("tell me about bar", &agents()).await;

        assert_eq!(arbiter.calls.load(Ordering::SeqCst), 1);
    }
}
