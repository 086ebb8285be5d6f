use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FALLBACK_KEY: &str = "event_summary";
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

const KEY_PATTERN: &str = r"^[a-z0-9]+(\.[a-z0-9]+){1,3}$";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
	Fact,
	Preference,
	Goal,
	Plan,
	Constraint,
	Episode,
}
impl MemoryType {
	pub const ALL: [Self; 6] =
		[Self::Fact, Self::Preference, Self::Goal, Self::Plan, Self::Constraint, Self::Episode];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fact => "fact",
			Self::Preference => "preference",
			Self::Goal => "goal",
			Self::Plan => "plan",
			Self::Constraint => "constraint",
			Self::Episode => "episode",
		}
	}

	/// Key used when a candidate arrives with a blank key.
	pub fn default_key(self) -> String {
		format!("{}_auto", self.as_str())
	}
}
impl fmt::Display for MemoryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for MemoryType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|memory_type| memory_type.as_str() == s)
			.ok_or_else(|| UnknownVariant { kind: "memory type", value: s.to_string() })
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
	Profile,
	Session,
}
impl MemoryScope {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Profile => "profile",
			Self::Session => "session",
		}
	}
}
impl fmt::Display for MemoryScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for MemoryScope {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"profile" => Ok(Self::Profile),
			"session" => Ok(Self::Session),
			_ => Err(UnknownVariant { kind: "memory scope", value: s.to_string() }),
		}
	}
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value:?}.")]
pub struct UnknownVariant {
	pub kind: &'static str,
	pub value: String,
}

/// Episodes are always session scoped regardless of what the extractor asked for.
pub fn effective_scope(memory_type: MemoryType, scope: MemoryScope) -> MemoryScope {
	match memory_type {
		MemoryType::Episode => MemoryScope::Session,
		_ => scope,
	}
}

pub fn effective_key(memory_type: MemoryType, key: &str) -> String {
	let key = key.trim();

	if key.is_empty() { memory_type.default_key() } else { key.to_string() }
}

/// Matches the dotted ontology grammar the extractor is instructed to follow.
pub fn is_canonical_key(key: &str) -> bool {
	static KEY_RE: OnceLock<Option<Regex>> = OnceLock::new();

	KEY_RE
		.get_or_init(|| Regex::new(KEY_PATTERN).ok())
		.as_ref()
		.map(|re| re.is_match(key))
		.unwrap_or(false)
}
