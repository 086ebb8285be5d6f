use std::time::Duration;

use serde_json::Value;

use memvec_config::Config;
use memvec_domain::{
	memory,
	qualification::{self, QualifiedMemory},
};
use memvec_providers::extractor::ChatRequest;
use memvec_storage::models::Event;

use crate::{LanguageModel, Result};

pub(crate) const QUALIFIER_TEMPERATURE: f32 = 0.0;

pub const QUALIFIER_SYSTEM_PROMPT: &str = r#"You extract durable memories from a single incoming event for an assistant's memory service.
Reply with one JSON object and nothing else: no markdown, no commentary, no additional keys.

Schema:
{
  "memories": [
    {
      "type": "fact|preference|goal|plan|constraint|episode",
      "scope": "profile|session",
      "key": "category.key",
      "value": { "any": "json object" },
      "confidence": 0.0
    }
  ]
}

General rules:
- Favour precision. Zero to three strong memories beat many weak ones.
- Only record what is stated or unambiguously implied. Never invent.
- Never store secrets such as passwords, API keys, tokens, private keys, account numbers or full addresses. Omit or generalise them.
- When in doubt, leave the memory out.

Types:
- fact: stable, objective information about the actor or their setup.
- preference: how the actor wants things done (style, format, verbosity, likes and dislikes).
- goal: an outcome the actor wants to reach.
- plan: a strategy or steps toward a goal.
- constraint: a hard rule that must not be broken.
- episode: a time-bound event worth remembering.

Scopes:
- episode uses "session".
- every other type uses "profile".

Record a memory only when:
A) the actor explicitly asks to remember, store or save something (misspellings such as "remeber" count), or
B) the content is a durable signal that will be useful in later interactions.

Confidence:
- 0.90 to 1.00 when explicit, clear and durable.
- 0.70 to 0.89 when clear but lightly normalised.
- 0.50 to 0.69 when implied yet useful.
- below 0.50: do not emit the memory.

Keys:
- lowercase ASCII, dot separated, matching ^[a-z0-9]+(\.[a-z0-9]+){1,3}$ (two to four segments).
- a key names a category bucket, never a specific item. Put items, names and quantities in value.
- no sentiment words, dates, session markers, counters or random suffixes in keys.
- shape: <type>.<domain>.<facet>, for example preference.food.likes or fact.personal.identity.
- domains: communication, food, health, fitness, work, finance, travel, learning, tools, tech, personal, schedule, relationships, entertainment, shopping, general.
- facets: likes, dislikes, preferences, settings, identity, background, objective, steps, rules, context.
- if unsure use domain "general" with facet "preferences" ("context" for episodes).
- reuse an existing bucket instead of inventing a new key.

Suggested value shapes:
- preference: { "items": [...], "polarity": "like|dislike|prefer", "evidence": "<short quote>" }
- goal: { "objective": "...", "evidence": "<short quote>" }
- fact: { "data": { ... }, "evidence": "<short quote>" }
- constraint: { "rule": "...", "evidence": "<short quote>" }
- plan: { "steps": [...], "evidence": "<short quote>" }
- episode: { "summary": "...", "evidence": "<short quote>" }

Each memory object holds exactly type, scope, key, value and confidence.
If nothing qualifies, reply { "memories": [] }."#;

/// Candidates produced for one event, plus how they were obtained.
#[derive(Clone, Debug)]
pub struct QualifyOutcome {
	pub candidates: Vec<QualifiedMemory>,
	pub source: crate::CandidateSource,
	/// Set when the model answered but its output was rejected as a whole.
	pub rejection: Option<String>,
}

pub fn build_user_prompt(actor_type: &str, actor_id: &str, text: &str, payload: &Value) -> String {
	let payload = serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string());

	format!(
		"Classify this incoming event.\n\nactor_type: {actor_type}\nactor_id: {actor_id}\n\ntext:\n{text}\n\npayload (json):\n{payload}"
	)
}

/// Turns one event into memory candidates.
///
/// Empty events never reach the model. Transport failures are returned as errors; unusable model
/// output yields an empty candidate list with the rejection recorded.
pub async fn qualify(
	cfg: &Config,
	llm: &dyn LanguageModel,
	event: &Event,
) -> Result<QualifyOutcome> {
	if !qualification::has_content(&event.text, &event.payload) {
		tracing::debug!(event_id = event.id, "Event is empty. Skipping qualification.");

		return Ok(QualifyOutcome {
			candidates: Vec::new(),
			source: crate::CandidateSource::Empty,
			rejection: None,
		});
	}
	if !cfg.memory.use_llm_qualifier {
		tracing::debug!(event_id = event.id, "Model qualification disabled. Using fallback.");

		return Ok(QualifyOutcome {
			candidates: vec![qualification::fallback_candidate(&event.text, &event.payload)],
			source: crate::CandidateSource::Fallback,
			rejection: None,
		});
	}

	let user_prompt =
		build_user_prompt(&event.actor_type, &event.actor_id, &event.text, &event.payload);
	let request = ChatRequest {
		system_prompt: QUALIFIER_SYSTEM_PROMPT,
		user_prompt: &user_prompt,
		temperature: QUALIFIER_TEMPERATURE,
		timeout: Duration::from_millis(cfg.providers.llm_extractor.timeout_ms),
	};
	let raw = llm.generate(&cfg.providers.llm_extractor, &request).await?;

	match qualification::parse_qualification(&raw) {
		Ok(candidates) => {
			for candidate in &candidates {
				if !memory::is_canonical_key(&candidate.key) {
					tracing::debug!(
						event_id = event.id,
						key = %candidate.key,
						"Candidate key does not follow the key grammar."
					);
				}
			}

			tracing::info!(event_id = event.id, candidates = candidates.len(), "Event qualified.");

			Ok(QualifyOutcome {
				candidates,
				source: crate::CandidateSource::Model,
				rejection: None,
			})
		},
		Err(err) => {
			tracing::warn!(event_id = event.id, error = %err, "Model output rejected.");

			Ok(QualifyOutcome {
				candidates: Vec::new(),
				source: crate::CandidateSource::Model,
				rejection: Some(err.to_string()),
			})
		},
	}
}
