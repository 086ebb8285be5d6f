use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::{FALLBACK_CONFIDENCE, FALLBACK_KEY, MemoryScope, MemoryType};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
	#[error("Model output is not valid JSON: {message}")]
	Format { message: String },
	#[error("Model output does not match the qualification schema: {message}")]
	Schema { message: String },
}

/// A candidate memory produced by the extractor, not yet persisted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QualifiedMemory {
	#[serde(rename = "type")]
	pub memory_type: MemoryType,
	pub scope: MemoryScope,
	pub key: String,
	#[serde(default = "empty_object")]
	pub value: Value,
	pub confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemoryQualification {
	memories: Vec<QualifiedMemory>,
}

/// Parses raw model text into JSON, recovering the outermost `{...}` span when the model wraps
/// its answer in prose or code fences.
pub fn parse_model_output(raw: &str) -> Result<Value, ExtractionError> {
	let strict_err = match serde_json::from_str::<Value>(raw) {
		Ok(value) => return Ok(value),
		Err(err) => err,
	};
	let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
		return Err(ExtractionError::Format { message: strict_err.to_string() });
	};

	if end <= start {
		return Err(ExtractionError::Format { message: strict_err.to_string() });
	}

	serde_json::from_str::<Value>(&raw[start..=end])
		.map_err(|err| ExtractionError::Format { message: err.to_string() })
}

/// Validates a whole qualification object. One bad element rejects the batch.
pub fn validate_qualification(value: Value) -> Result<Vec<QualifiedMemory>, ExtractionError> {
	let qualification: MemoryQualification = serde_json::from_value(value)
		.map_err(|err| ExtractionError::Schema { message: err.to_string() })?;

	for (idx, memory) in qualification.memories.iter().enumerate() {
		if !memory.value.is_object() {
			return Err(ExtractionError::Schema {
				message: format!("memories[{idx}].value must be a JSON object."),
			});
		}
		if !(0.0..=1.0).contains(&memory.confidence) {
			return Err(ExtractionError::Schema {
				message: format!("memories[{idx}].confidence must be in the range 0.0-1.0."),
			});
		}
	}

	Ok(qualification.memories)
}

pub fn parse_qualification(raw: &str) -> Result<Vec<QualifiedMemory>, ExtractionError> {
	validate_qualification(parse_model_output(raw)?)
}

pub fn is_empty_payload(payload: &Value) -> bool {
	match payload {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::String(text) => text.is_empty(),
		_ => false,
	}
}

/// An event is worth qualifying when it carries text or a non-empty payload.
pub fn has_content(text: &str, payload: &Value) -> bool {
	!text.trim().is_empty() || !is_empty_payload(payload)
}

/// The single low-confidence episode used when model extraction is disabled.
pub fn fallback_candidate(text: &str, payload: &Value) -> QualifiedMemory {
	let mut value = Map::new();

	value.insert("text".to_string(), Value::String(text.to_string()));
	value.insert("payload".to_string(), payload.clone());

	QualifiedMemory {
		memory_type: MemoryType::Episode,
		scope: MemoryScope::Session,
		key: FALLBACK_KEY.to_string(),
		value: Value::Object(value),
		confidence: FALLBACK_CONFIDENCE,
	}
}

fn empty_object() -> Value {
	Value::Object(Map::new())
}
