use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use memvec_domain::memory::{MemoryScope, MemoryType};
use memvec_storage::{models::Memory, queries};

use crate::{Error, MemvecService, Result};

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1_000;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListMemoriesRequest {
	pub scope: Option<String>,
	#[serde(rename = "type")]
	pub memory_type: Option<String>,
	pub limit: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemoryRecord {
	pub id: i64,
	#[serde(rename = "type")]
	pub memory_type: String,
	pub scope: String,
	pub key: String,
	pub value: Value,
	pub confidence: f32,
	pub assertion_count: i32,
	pub decay: f32,
	pub superseded_by_memory_id: Option<i64>,
	#[serde(rename = "event_id")]
	pub source_event_id: i64,
	#[serde(with = "crate::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl From<Memory> for MemoryRecord {
	fn from(memory: Memory) -> Self {
		Self {
			id: memory.id,
			memory_type: memory.memory_type,
			scope: memory.scope,
			key: memory.key,
			value: memory.value,
			confidence: memory.confidence,
			assertion_count: memory.assertion_count,
			decay: memory.decay,
			superseded_by_memory_id: memory.superseded_by_memory_id,
			source_event_id: memory.source_event_id,
			created_at: memory.created_at,
		}
	}
}

impl MemvecService {
	/// Lists memories newest first.
	pub async fn list_memories(&self, req: ListMemoriesRequest) -> Result<Vec<MemoryRecord>> {
		let scope = parse_filter::<MemoryScope>(req.scope.as_deref())?;
		let memory_type = parse_filter::<MemoryType>(req.memory_type.as_deref())?;
		let limit = req.limit.unwrap_or(DEFAULT_LIST_LIMIT);

		if !(1..=MAX_LIST_LIMIT).contains(&limit) {
			return Err(Error::InvalidRequest {
				message: format!("limit must be between 1 and {MAX_LIST_LIMIT}."),
			});
		}

		let rows = queries::list_memories(
			&self.db.pool,
			scope.map(MemoryScope::as_str),
			memory_type.map(MemoryType::as_str),
			limit,
		)
		.await?;

		Ok(rows.into_iter().map(MemoryRecord::from).collect())
	}

	pub async fn get_memory(&self, memory_id: i64) -> Result<MemoryRecord> {
		queries::get_memory(&self.db.pool, memory_id)
			.await?
			.map(MemoryRecord::from)
			.ok_or_else(|| Error::NotFound { message: format!("Memory {memory_id} not found.") })
	}
}

fn parse_filter<T>(raw: Option<&str>) -> Result<Option<T>>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	match raw.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => value
			.parse::<T>()
			.map(Some)
			.map_err(|err| Error::InvalidRequest { message: err.to_string() }),
		None => Ok(None),
	}
}
