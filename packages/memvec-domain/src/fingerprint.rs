use serde_json::{Map, Value};

/// Serializes a JSON value with object keys sorted at every depth and no insignificant
/// whitespace.
pub fn canonical_json(value: &Value) -> String {
	serde_json::to_string(&sorted(value)).unwrap_or_else(|_| "null".to_string())
}

/// Text embedded for duplicate detection: the key on the first line, the canonical value after.
pub fn fingerprint_text(key: &str, value: &Value) -> String {
	format!("{}\n{}", key.trim(), canonical_json(value))
}

fn sorted(value: &Value) -> Value {
	match value {
		Value::Object(map) => {
			let mut entries: Vec<(&String, &Value)> = map.iter().collect();

			entries.sort_by(|a, b| a.0.cmp(b.0));

			let mut out = Map::new();

			for (key, inner) in entries {
				out.insert(key.clone(), sorted(inner));
			}

			Value::Object(out)
		},
		Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
		other => other.clone(),
	}
}
