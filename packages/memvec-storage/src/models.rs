use serde_json::Value;
use time::OffsetDateTime;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Event {
	pub id: i64,
	pub actor_type: String,
	pub actor_id: String,
	pub text: String,
	pub payload: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct NewEvent {
	pub actor_type: String,
	pub actor_id: String,
	pub text: String,
	pub payload: Value,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Memory {
	pub id: i64,
	#[sqlx(rename = "type")]
	pub memory_type: String,
	pub scope: String,
	pub key: String,
	pub value: Value,
	pub confidence: f32,
	pub assertion_count: i32,
	pub decay: f32,
	pub superseded_by_memory_id: Option<i64>,
	pub source_event_id: i64,
	pub created_at: OffsetDateTime,
}

/// Row values for a memory about to be created. Scope and key are already normalized.
#[derive(Clone, Debug)]
pub struct NewMemory {
	pub memory_type: String,
	pub scope: String,
	pub key: String,
	pub value: Value,
	pub confidence: f32,
	pub assertion_count: i32,
	pub source_event_id: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GraphNode {
	pub node_id: String,
	pub label: String,
	pub attrs: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GraphEdge {
	pub src_id: String,
	pub edge_type: String,
	pub dst_id: String,
	pub created_at: OffsetDateTime,
}
