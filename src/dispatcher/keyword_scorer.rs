//! Weighted keyword scoring for domain-agnostic agent selection.
//!
//! Grounded on `original_source/0.2/__main__.py`'s `analyze_request_by_keywords`
//! and `analyze_ambiguous_term_context`: two weighted term lexicons are scored
//! against the query, and a small table of ambiguous terms (words that appear
//! in both lexicons, like "gold") are resolved by scoring a ±100-character
//! window around each occurrence against a pair of context-indicator lexicons.
//!
//! This module only knows about two named lexicons — callers supply the
//! vocabulary. The `host-agent` binary wires up a real configuration; the
//! tests below use the currency/element domain from the original reference
//! implementation because its weights and test queries are well-understood.

use std::collections::HashMap;

use serde::Deserialize;

/// A named, weighted vocabulary. Term matching is a case-insensitive
/// substring search, exactly as the reference implementation does it.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub name: String,
    terms: HashMap<String, f64>,
}

impl Lexicon {
    pub fn new(name: impl Into<String>, terms: impl IntoIterator<Item = (&'static str, f64)>) -> Self {
        Self {
            name: name.into(),
            terms: terms.into_iter().map(|(t, w)| (t.to_lowercase(), w)).collect(),
        }
    }

    /// Same as [`Lexicon::new`] but for vocabulary loaded at runtime (e.g.
    /// from a JSON config file), where terms aren't `&'static str`.
    pub fn from_owned(name: impl Into<String>, terms: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            name: name.into(),
            terms: terms.into_iter().map(|(t, w)| (t.to_lowercase(), w)).collect(),
        }
    }

    /// Sum the weights of every term that appears in `text_lower` (already
    /// lowercased by the caller).
    fn score(&self, text_lower: &str) -> f64 {
        self.terms
            .iter()
            .filter(|(term, _)| text_lower.contains(term.as_str()))
            .map(|(_, weight)| *weight)
            .sum()
    }
}

/// A term that carries signal for both lexicons and needs its surrounding
/// context inspected to tell which domain the query actually means — e.g.
/// "gold" as a commodity price versus "gold" as the element Au.
#[derive(Debug, Clone)]
pub struct AmbiguousTerm {
    pub term: String,
    /// Weight added toward the first lexicon when context doesn't disambiguate.
    pub base_weight_a: f64,
    /// Weight added toward the second lexicon when context doesn't disambiguate.
    pub base_weight_b: f64,
}

/// Result of inspecting the context window around an ambiguous term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextVerdict {
    LeansA,
    LeansB,
    Unknown,
}

/// Verdict produced by [`KeywordScorer::score`].
#[derive(Debug, Clone)]
pub struct ScoreVerdict {
    /// Name of the winning lexicon.
    pub domain: String,
    /// `winner / (winner + loser)`, or `0.5` on a tie.
    pub confidence: f64,
    pub score_a: f64,
    pub score_b: f64,
}

/// Scores a query against two weighted lexicons, resolving ambiguous terms
/// via context-window analysis.
pub struct KeywordScorer {
    domain_a: Lexicon,
    domain_b: Lexicon,
    ambiguous_terms: Vec<AmbiguousTerm>,
    context_indicators_a: Lexicon,
    context_indicators_b: Lexicon,
    /// Characters of context considered on each side of an ambiguous term.
    context_window: usize,
}

impl KeywordScorer {
    pub fn new(
        domain_a: Lexicon,
        domain_b: Lexicon,
        ambiguous_terms: Vec<AmbiguousTerm>,
        context_indicators_a: Lexicon,
        context_indicators_b: Lexicon,
    ) -> Self {
        Self {
            domain_a,
            domain_b,
            ambiguous_terms,
            context_indicators_a,
            context_indicators_b,
            context_window: 100,
        }
    }

    pub fn score(&self, query: &str) -> ScoreVerdict {
        let query_lower = query.to_lowercase();
        let mut score_a = self.domain_a.score(&query_lower);
        let mut score_b = self.domain_b.score(&query_lower);

        for term in &self.ambiguous_terms {
            if !query_lower.contains(term.term.as_str()) {
                continue;
            }
            match self.analyze_ambiguous_term_context(&query_lower, &term.term) {
                ContextVerdict::LeansA => {
                    score_a += term.base_weight_a * 1.5;
                    score_b += term.base_weight_b * 0.5;
                }
                ContextVerdict::LeansB => {
                    score_a += term.base_weight_a * 0.5;
                    score_b += term.base_weight_b * 1.5;
                }
                ContextVerdict::Unknown => {
                    score_a += term.base_weight_a;
                    score_b += term.base_weight_b;
                }
            }
        }

        let total = score_a + score_b;
        if total <= 0.0 {
            // No signal at all — default to the second lexicon with a coin-flip
            // confidence, matching the reference's tie-break behavior.
            return ScoreVerdict {
                domain: self.domain_b.name.clone(),
                confidence: 0.5,
                score_a,
                score_b,
            };
        }

        if score_a > score_b {
            ScoreVerdict {
                domain: self.domain_a.name.clone(),
                confidence: score_a / total,
                score_a,
                score_b,
            }
        } else {
            ScoreVerdict {
                domain: self.domain_b.name.clone(),
                confidence: score_b / total,
                score_a,
                score_b,
            }
        }
    }

    /// Score the ±`context_window` character window around the first
    /// occurrence of `term` against the two context-indicator lexicons.
    pub fn analyze_ambiguous_term_context(&self, text_lower: &str, term: &str) -> ContextVerdict {
        let Some(byte_pos) = text_lower.find(term) else {
            return ContextVerdict::Unknown;
        };
        let window = char_window(text_lower, byte_pos, term.len(), self.context_window);

        let score_a = self.context_indicators_a.score(&window);
        let score_b = self.context_indicators_b.score(&window);

        if score_a > score_b {
            ContextVerdict::LeansA
        } else if score_b > score_a {
            ContextVerdict::LeansB
        } else {
            ContextVerdict::Unknown
        }
    }
}

/// On-disk shape of a [`Lexicon`], for loading vocabulary from a `--keyword-config`
/// JSON file instead of compiling it in.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    pub name: String,
    pub terms: HashMap<String, f64>,
}

impl From<LexiconConfig> for Lexicon {
    fn from(config: LexiconConfig) -> Self {
        Lexicon::from_owned(config.name, config.terms)
    }
}

/// On-disk shape of an [`AmbiguousTerm`].
#[derive(Debug, Clone, Deserialize)]
pub struct AmbiguousTermConfig {
    pub term: String,
    pub base_weight_a: f64,
    pub base_weight_b: f64,
}

impl From<AmbiguousTermConfig> for AmbiguousTerm {
    fn from(config: AmbiguousTermConfig) -> Self {
        AmbiguousTerm {
            term: config.term,
            base_weight_a: config.base_weight_a,
            base_weight_b: config.base_weight_b,
        }
    }
}

/// On-disk configuration for a [`KeywordScorer`], so an operator can supply
/// the domain vocabulary (lexicons, ambiguous terms, context indicators) as
/// a JSON file rather than recompiling the binary. Domain names must match
/// the names under which the corresponding remote agents are registered.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordScorerConfig {
    pub domain_a: LexiconConfig,
    pub domain_b: LexiconConfig,
    #[serde(default)]
    pub ambiguous_terms: Vec<AmbiguousTermConfig>,
    pub context_indicators_a: LexiconConfig,
    pub context_indicators_b: LexiconConfig,
}

impl KeywordScorerConfig {
    pub fn build(self) -> KeywordScorer {
        KeywordScorer::new(
            self.domain_a.into(),
            self.domain_b.into(),
            self.ambiguous_terms.into_iter().map(Into::into).collect(),
            self.context_indicators_a.into(),
            self.context_indicators_b.into(),
        )
    }
}

impl KeywordScorer {
    /// The currency-vs-element vocabulary from
    /// `original_source/0.2/__main__.py`'s `currency_keywords`/
    /// `element_keywords` tables, usable out of the box when no
    /// `--keyword-config` is supplied and the registered remote agents are
    /// named `"currency"` and `"element"`.
    pub fn reference_currency_element() -> Self {
        let currency = Lexicon::new(
            "currency",
            [
                ("currency", 3.0),
                ("exchange rate", 3.0),
                ("exchange", 2.5),
                ("dollar", 2.0),
                ("euro", 2.0),
                ("yen", 2.0),
                ("pound", 2.0),
                ("money", 1.0),
                ("usd", 1.5),
                ("eur", 1.5),
                ("rate", 1.0),
                ("convert", 1.5),
                ("price", 0.8),
                ("market", 0.8),
                ("bitcoin", 2.0),
                ("cryptocurrency", 2.0),
                ("value", 1.0),
            ],
        );
        let element = Lexicon::new(
            "element",
            [
                ("element", 3.0),
                ("periodic table", 3.0),
                ("chemistry", 2.5),
                ("atom", 2.0),
                ("atomic number", 2.5),
                ("hydrogen", 2.0),
                ("oxygen", 2.0),
                ("carbon", 2.0),
                ("sodium", 2.0),
                ("potassium", 2.0),
                ("nitrogen", 2.0),
                ("isotope", 2.0),
                ("electron", 2.0),
                ("reactivity", 1.8),
                ("properties", 1.0),
            ],
        );
        let ambiguous_terms = vec![
            AmbiguousTerm { term: "gold".into(), base_weight_a: 1.5, base_weight_b: 1.0 },
            AmbiguousTerm { term: "silver".into(), base_weight_a: 1.5, base_weight_b: 1.0 },
            AmbiguousTerm { term: "platinum".into(), base_weight_a: 1.0, base_weight_b: 1.5 },
        ];
        let currency_indicators = Lexicon::new(
            "currency",
            [
                ("price", 3.0),
                ("worth", 2.0),
                ("market", 2.0),
                ("invest", 3.0),
                ("investment", 3.0),
                ("spot price", 3.0),
                ("usd", 3.5),
                ("buy", 2.5),
                ("sell", 2.5),
            ],
        );
        let element_indicators = Lexicon::new(
            "element",
            [
                ("atomic", 3.5),
                ("atomic number", 3.5),
                ("atomic weight", 3.5),
                ("electron", 3.0),
                ("chemical", 3.5),
                ("reaction", 2.5),
                ("transition metal", 2.5),
                ("catalyst", 2.5),
                ("reactive", 2.0),
            ],
        );
        KeywordScorer::new(currency, element, ambiguous_terms, currency_indicators, element_indicators)
    }
}

/// Extract a character-safe window of `text` spanning `window` characters
/// before and after the byte range `[byte_pos, byte_pos + term_len_bytes)`.
fn char_window(text: &str, byte_pos: usize, term_len_bytes: usize, window: usize) -> String {
    let start_char = text[..byte_pos].chars().count();
    let end_byte = (byte_pos + term_len_bytes).min(text.len());
    let end_char = text[..end_byte].chars().count();

    let chars: Vec<char> = text.chars().collect();
    let from = start_char.saturating_sub(window);
    let to = (end_char + window).min(chars.len());
    chars[from..to].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mirrors `original_source/0.2/__main__.py`'s `currency_keywords`/
    /// `element_keywords` tables plus its `gold`/`silver`/`platinum` special
    /// cases and `currency_indicators`/`element_indicators` context tables.
    fn currency_vs_element_scorer() -> KeywordScorer {
        KeywordScorer::reference_currency_element()
    }

    #[test]
    fn keyword_scorer_config_builds_equivalent_scorer() {
        let json = r#"{
            "domain_a": {"name": "currency", "terms": {"dollar": 2.0, "exchange": 2.5}},
            "domain_b": {"name": "element", "terms": {"atom": 2.0, "chemistry": 2.5}},
            "ambiguous_terms": [
                {"term": "gold", "base_weight_a": 1.5, "base_weight_b": 1.0}
            ],
            "context_indicators_a": {"name": "currency", "terms": {"invest": 3.0}},
            "context_indicators_b": {"name": "element", "terms": {"atomic": 3.5}}
        }"#;
        let config: KeywordScorerConfig = serde_json::from_str(json).unwrap();
        let scorer = config.build();

        let verdict = scorer.score("exchange my dollars please");
        assert_eq!(verdict.domain, "currency");

        let verdict = scorer.score("tell me about chemistry and atoms");
        assert_eq!(verdict.domain, "element");
    }

    #[test]
    fn clear_currency_queries_favor_currency() {
        let scorer = currency_vs_element_scorer();
        for query in [
            "What is the exchange rate for USD to EUR?",
            "How much is 100 dollars in yen?",
            "Tell me about Bitcoin price trends",
            "Compare euro and pound exchange rates",
        ] {
            let verdict = scorer.score(query);
            assert_eq!(verdict.domain, "currency", "query: {query}");
            assert!(verdict.confidence > 0.6, "query: {query}, confidence: {}", verdict.confidence);
        }
    }

    #[test]
    fn clear_element_queries_favor_element() {
        let scorer = currency_vs_element_scorer();
        for query in [
            "What is the atomic number of Hydrogen?",
            "Tell me about the properties of Oxygen",
            "Compare the reactivity of Sodium and Potassium",
            "What are the isotopes of Carbon?",
        ] {
            let verdict = scorer.score(query);
            assert_eq!(verdict.domain, "element", "query: {query}");
            assert!(verdict.confidence > 0.6, "query: {query}, confidence: {}", verdict.confidence);
        }
    }

    #[test]
    fn ambiguous_gold_resolves_by_context() {
        let scorer = currency_vs_element_scorer();

        let verdict = scorer.score("What's the current price of gold in USD?");
        assert_eq!(verdict.domain, "currency");

        let verdict = scorer.score("What's the atomic weight of gold?");
        assert_eq!(verdict.domain, "element");
    }

    #[test]
    fn context_window_picks_up_nearby_indicators() {
        let scorer = currency_vs_element_scorer();
        let text = "what is the market price of gold today? i want to invest.";
        let verdict = scorer.analyze_ambiguous_term_context(text, "gold");
        assert_eq!(verdict, ContextVerdict::LeansA);

        let text = "gold has an atomic number of 79 and is quite unreactive.";
        let verdict = scorer.analyze_ambiguous_term_context(text, "gold");
        assert_eq!(verdict, ContextVerdict::LeansB);
    }

    #[test]
    fn no_signal_defaults_to_second_lexicon_with_tie_confidence() {
        let scorer = currency_vs_element_scorer();
        let verdict = scorer.score("good morning, how are you?");
        assert_eq!(verdict.domain, "element");
        assert_eq!(verdict.confidence, 0.5);
    }
}
