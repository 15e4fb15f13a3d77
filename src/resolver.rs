//! # Answer resolver
//!
//! Orchestration of the answer pipeline: cache lookup → prompt formatting →
//! model call → validation → encyclopedia fallback → cache write.
//!
//! The resolver never returns an error. Every external call is matched as a
//! tagged outcome and a failure degrades to the next fallback, ending at a
//! fixed apology string; the interaction always ends with *some* answer.
//! Callers are expected to reject empty or whitespace-only questions before
//! invoking.

use crate::api;
use crate::cache::SemanticCache;
use crate::config::WonderWhyConfig;
use crate::encyclopedia::{EncyclopediaClient, NOT_FOUND_MESSAGE};
use crate::prompt::format_question;

use tracing::{info, warn};

/// A cached answer is reused only when its squared Euclidean distance is
/// below this.
///
/// A fixed constant with no documented derivation. Not configurable, not
/// adaptive.
pub const REUSE_DISTANCE_THRESHOLD: f32 = 0.2;

/// Model responses with fewer whitespace-separated words than this are
/// treated as failures.
pub const MIN_ANSWER_WORDS: usize = 5;

/// Sentence count requested from the encyclopedia fallback.
pub const SUMMARY_SENTENCES: usize = 2;

/// Where a resolved answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// A sufficiently similar question was already cached.
    Cache,
    /// The chat model produced an acceptable answer.
    Model,
    /// The encyclopedia summary (or the apology string) stood in.
    Encyclopedia,
}

/// The resolved answer plus its provenance, so the interface can phrase its
/// status line ("Found a similar question!", "Falling back...").
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnswer {
    pub text: String,
    pub source: AnswerSource,
}

/// Outcome of the model call after validation.
enum ModelOutcome {
    Accepted(String),
    Rejected(String),
}

/// Resolve a non-empty question into an answer, persisting newly learned
/// question/answer pairs into the cache.
///
/// # Algorithm
/// 1. Look up the nearest cached question. Within
///    [`REUSE_DISTANCE_THRESHOLD`], return its stored answer verbatim — a
///    pure cache hit, no write.
/// 2. Otherwise format the question, call the model, and validate the
///    response ([`MIN_ANSWER_WORDS`]). A failed call or a too-short answer
///    selects a [`SUMMARY_SENTENCES`]-sentence encyclopedia summary of the
///    **raw** question; if that also fails, the fixed not-found apology.
/// 3. Persist the raw question with whichever answer won as one new cache
///    entry under a fresh identifier.
pub async fn resolve(
    config: &WonderWhyConfig,
    cache: &mut SemanticCache,
    encyclopedia: &EncyclopediaClient,
    question: &str,
) -> ResolvedAnswer {
    debug_assert!(!question.trim().is_empty(), "caller must reject empty questions");

    match cache.lookup(question) {
        Ok(Some(hit)) if hit.distance < REUSE_DISTANCE_THRESHOLD => {
            info!(
                "Cache hit at distance {:.3}: {:?}",
                hit.distance, hit.question
            );
            return ResolvedAnswer {
                text: hit.answer,
                source: AnswerSource::Cache,
            };
        }
        Ok(Some(hit)) => {
            info!(
                "Nearest cached question too far ({:.3} >= {REUSE_DISTANCE_THRESHOLD}), asking the model",
                hit.distance
            );
        }
        Ok(None) => info!("Cache is empty, asking the model"),
        Err(e) => warn!("Cache lookup failed, asking the model: {e}"),
    }

    let formatted = format_question(question);
    let outcome = match api::fetch_answer(config, &formatted).await {
        Ok(answer) => {
            if answer.split_whitespace().count() < MIN_ANSWER_WORDS {
                ModelOutcome::Rejected(format!("answer too short: {answer:?}"))
            } else {
                ModelOutcome::Accepted(answer)
            }
        }
        Err(e) => ModelOutcome::Rejected(e.to_string()),
    };

    let (text, source) = match outcome {
        ModelOutcome::Accepted(answer) => (answer, AnswerSource::Model),
        ModelOutcome::Rejected(reason) => {
            info!("Model answer rejected ({reason}), falling back to the encyclopedia");
            match encyclopedia.summary(question, SUMMARY_SENTENCES).await {
                Ok(summary) => (summary, AnswerSource::Encyclopedia),
                Err(e) => {
                    warn!("Encyclopedia lookup failed: {e}");
                    (NOT_FOUND_MESSAGE.to_string(), AnswerSource::Encyclopedia)
                }
            }
        }
    };

    if let Err(e) = cache.insert(question, &text) {
        warn!("Failed to cache answer for {question:?}: {e}");
    }

    ResolvedAnswer { text, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FixtureEmbedder;
    use httpmock::prelude::*;

    const SKY_QUESTION: &str = "why is the sky blue";

    fn test_config(api_base: String) -> WonderWhyConfig {
        WonderWhyConfig {
            api_key: "test_key".to_string(),
            api_base,
            model: "test_model".to_string(),
            max_answer_tokens: 256,
            speech_rate: 150,
            speech_voice: None,
            mic_command: None,
        }
    }

    fn sky_cache() -> SemanticCache {
        let embedder = FixtureEmbedder::new(4)
            .with(SKY_QUESTION, vec![1.0, 0.0, 0.0, 0.0])
            .with("why is the sky so blue", vec![0.95, 0.0, 0.0, 0.0])
            .with("what do pandas eat", vec![0.0, 2.0, 0.0, 0.0]);
        SemanticCache::new(4, Box::new(embedder))
    }

    fn mock_model<'a>(server: &'a MockServer, content: &str) -> httpmock::Mock<'a> {
        let content = content.to_string();
        server.mock(move |when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 0,
                "model": "test_model",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            }));
        })
    }

    fn mock_model_failure(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).json_body(serde_json::json!({
                "error": { "message": "bad key", "type": "invalid_request_error" }
            }));
        })
    }

    fn mock_encyclopedia(server: &MockServer, extract: &str) {
        let extract = extract.to_string();
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("list", "search");
            then.status(200).json_body(serde_json::json!({
                "query": { "search": [{ "title": "Some page" }] }
            }));
        });
        server.mock(move |when, then| {
            when.method(GET).path("/w/api.php").query_param("prop", "extracts");
            then.status(200).json_body(serde_json::json!({
                "query": { "pages": { "1": { "title": "Some page", "extract": extract } } }
            }));
        });
    }

    fn mock_encyclopedia_failure(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(200)
                .json_body(serde_json::json!({ "query": { "search": [] } }));
        });
    }

    fn encyclopedia_for(server: &MockServer) -> EncyclopediaClient {
        EncyclopediaClient::new(&format!("{}/w/api.php", server.base_url()))
    }

    #[tokio::test]
    async fn near_duplicate_is_served_from_the_cache_without_model_calls() {
        let server = MockServer::start();
        let model = mock_model(&server, "this should never be requested by the resolver");

        let mut cache = sky_cache();
        cache
            .insert(SKY_QUESTION, "Sunlight scatters in the air.")
            .unwrap();

        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        // The fixture vectors put "why is the sky so blue" at squared
        // distance 0.0025 from the cached entry, well inside the threshold.
        let resolved = resolve(&config, &mut cache, &encyclopedia, "why is the sky so blue").await;

        assert_eq!(resolved.text, "Sunlight scatters in the air.");
        assert_eq!(resolved.source, AnswerSource::Cache);
        assert_eq!(model.calls(), 0);
        assert_eq!(cache.len(), 1, "a pure cache hit must not write");
    }

    #[tokio::test]
    async fn distant_match_still_goes_to_the_model() {
        let server = MockServer::start();
        let model = mock_model(&server, "Pandas mostly eat bamboo all day long.");

        let mut cache = sky_cache();
        cache
            .insert(SKY_QUESTION, "Sunlight scatters in the air.")
            .unwrap();

        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        // Distance from the sky question is well above the reuse threshold.
        let resolved = resolve(&config, &mut cache, &encyclopedia, "what do pandas eat").await;

        assert_eq!(resolved.source, AnswerSource::Model);
        assert_eq!(resolved.text, "Pandas mostly eat bamboo all day long.");
        assert_eq!(model.calls(), 1);
        assert_eq!(cache.len(), 2, "a miss must write exactly one new entry");
    }

    #[tokio::test]
    async fn empty_cache_formats_the_prompt_and_caches_the_model_answer() {
        let server = MockServer::start();
        let model = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_includes("Explain this kindly to a 6-year-old: Why is the sky blue");
            then.status(200).json_body(serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 0,
                "model": "test_model",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "Tiny bits of air scatter the blue light everywhere."
                    },
                    "finish_reason": "stop"
                }]
            }));
        });

        let mut cache = sky_cache();
        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        let resolved = resolve(&config, &mut cache, &encyclopedia, SKY_QUESTION).await;

        model.assert();
        assert_eq!(resolved.source, AnswerSource::Model);
        assert_eq!(cache.len(), 1);

        // The raw question, not the formatted prompt, is what got cached.
        let hit = cache.lookup(SKY_QUESTION).unwrap().unwrap();
        assert_eq!(hit.question, SKY_QUESTION);
        assert_eq!(hit.answer, "Tiny bits of air scatter the blue light everywhere.");
    }

    #[tokio::test]
    async fn short_model_answer_is_replaced_by_the_encyclopedia_summary() {
        let server = MockServer::start();
        mock_model(&server, "Blue.");
        mock_encyclopedia(
            &server,
            "Diffuse sky radiation is scattered sunlight. It makes the sky look blue.",
        );

        let mut cache = sky_cache();
        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        let resolved = resolve(&config, &mut cache, &encyclopedia, SKY_QUESTION).await;

        assert_eq!(resolved.source, AnswerSource::Encyclopedia);
        assert!(resolved.text.starts_with("Diffuse sky radiation"));
        assert_ne!(resolved.text, "Blue.", "the rejected short answer must never surface");
        assert_eq!(cache.len(), 1, "the fallback answer is still cached");
    }

    #[tokio::test]
    async fn model_error_falls_back_to_the_encyclopedia() {
        let server = MockServer::start();
        mock_model_failure(&server);
        mock_encyclopedia(
            &server,
            "Diffuse sky radiation is scattered sunlight. It makes the sky look blue.",
        );

        let mut cache = sky_cache();
        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        let resolved = resolve(&config, &mut cache, &encyclopedia, SKY_QUESTION).await;

        assert_eq!(resolved.source, AnswerSource::Encyclopedia);
        assert!(resolved.text.starts_with("Diffuse sky radiation"));
    }

    #[tokio::test]
    async fn double_failure_yields_the_apology_string() {
        let server = MockServer::start();
        mock_model_failure(&server);
        mock_encyclopedia_failure(&server);

        let mut cache = sky_cache();
        let config = test_config(server.base_url());
        let encyclopedia = encyclopedia_for(&server);

        let resolved = resolve(&config, &mut cache, &encyclopedia, SKY_QUESTION).await;

        assert_eq!(resolved.source, AnswerSource::Encyclopedia);
        assert_eq!(resolved.text, NOT_FOUND_MESSAGE);
        assert_eq!(cache.len(), 1, "even the apology is cached for the question");
    }
}
