use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::memory::UnknownVariant;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum NodeLabel {
	Actor,
	Memory,
	Entity,
}
impl NodeLabel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Actor => "Actor",
			Self::Memory => "Memory",
			Self::Entity => "Entity",
		}
	}
}
impl fmt::Display for NodeLabel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for NodeLabel {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Actor" => Ok(Self::Actor),
			"Memory" => Ok(Self::Memory),
			"Entity" => Ok(Self::Entity),
			_ => Err(UnknownVariant { kind: "node label", value: s.to_string() }),
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum EdgeType {
	#[serde(rename = "HAS_MEMORY")]
	HasMemory,
	#[serde(rename = "ABOUT")]
	About,
}
impl EdgeType {
	pub const ALL: [Self; 2] = [Self::HasMemory, Self::About];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::HasMemory => "HAS_MEMORY",
			Self::About => "ABOUT",
		}
	}
}
impl fmt::Display for EdgeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for EdgeType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HAS_MEMORY" => Ok(Self::HasMemory),
			"ABOUT" => Ok(Self::About),
			_ => Err(UnknownVariant { kind: "edge type", value: s.to_string() }),
		}
	}
}

pub fn actor_node_id(actor_type: &str, actor_id: &str) -> String {
	format!("actor:{actor_type}:{actor_id}")
}

pub fn memory_node_id(memory_id: i64) -> String {
	format!("memory:{memory_id}")
}

pub fn entity_node_id(entity_type: &str, name: &str) -> String {
	format!("entity:{entity_type}:{}", name.to_lowercase())
}
