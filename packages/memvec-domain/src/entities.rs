use serde::Serialize;
use serde_json::Value;

use memvec_config::EntityTerm;

use crate::{fingerprint, memory::MemoryType};

pub const PREFERENCE_KEY_ENTITY_TYPE: &str = "preference_key";

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct EntityRef {
	pub name: String,
	pub entity_type: String,
}

/// Coarse entity detection for the graph mirror.
///
/// A preference contributes its own key. Every vocabulary term found in the lowercased key and
/// value text contributes one entity. Duplicates are collapsed and first-seen order is kept.
pub fn extract_entities(
	memory_type: MemoryType,
	key: &str,
	value: &Value,
	vocabulary: &[EntityTerm],
) -> Vec<EntityRef> {
	let mut out: Vec<EntityRef> = Vec::new();

	if memory_type == MemoryType::Preference && !key.trim().is_empty() {
		out.push(EntityRef {
			name: key.to_string(),
			entity_type: PREFERENCE_KEY_ENTITY_TYPE.to_string(),
		});
	}

	let haystack = format!("{key} {}", fingerprint::canonical_json(value)).to_lowercase();

	for term in vocabulary {
		let needle = term.name.to_lowercase();

		if needle.is_empty() || !haystack.contains(&needle) {
			continue;
		}

		let entity = EntityRef { name: needle, entity_type: term.entity_type.clone() };

		if !out.contains(&entity) {
			out.push(entity);
		}
	}

	out
}
