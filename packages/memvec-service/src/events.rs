use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use memvec_storage::{
	models::{Event, NewEvent},
	queries,
};

use crate::{Error, MemvecService, ProcessReport, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct IngestEventRequest {
	#[serde(default = "default_actor_type")]
	pub actor_type: String,
	#[serde(default = "default_actor_id")]
	pub actor_id: String,
	#[serde(default)]
	pub text: String,
	#[serde(default = "empty_payload")]
	pub payload: Value,
}
impl Default for IngestEventRequest {
	fn default() -> Self {
		Self {
			actor_type: default_actor_type(),
			actor_id: default_actor_id(),
			text: String::new(),
			payload: empty_payload(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
	pub id: i64,
	pub actor_type: String,
	pub actor_id: String,
	pub text: String,
	pub payload: Value,
	#[serde(with = "crate::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl From<Event> for EventRecord {
	fn from(event: Event) -> Self {
		Self {
			id: event.id,
			actor_type: event.actor_type,
			actor_id: event.actor_id,
			text: event.text,
			payload: event.payload,
			created_at: event.created_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestEventResponse {
	pub event: EventRecord,
	pub report: ProcessReport,
}

impl MemvecService {
	/// Stores an event and runs it through qualification and storage.
	///
	/// The event row is committed before processing starts. Processing errors propagate to the
	/// caller and the stored event can be retried with `process_event`.
	pub async fn ingest_event(&self, req: IngestEventRequest) -> Result<IngestEventResponse> {
		let event = self.store_event(req).await?;
		let report = self.process(&event).await.inspect_err(|err| {
			tracing::error!(event_id = event.id, error = %err, "Event processing failed.");
		})?;

		Ok(IngestEventResponse { event: event.into(), report })
	}

	pub async fn get_event(&self, event_id: i64) -> Result<EventRecord> {
		queries::get_event(&self.db.pool, event_id)
			.await?
			.map(EventRecord::from)
			.ok_or_else(|| Error::NotFound { message: format!("Event {event_id} not found.") })
	}

	pub(crate) async fn store_event(&self, req: IngestEventRequest) -> Result<Event> {
		let actor_type = non_blank_or(req.actor_type, default_actor_type);
		let actor_id = non_blank_or(req.actor_id, default_actor_id);
		let payload = if req.payload.is_null() { empty_payload() } else { req.payload };
		let event = queries::insert_event(
			&self.db.pool,
			&NewEvent { actor_type, actor_id, text: req.text, payload },
		)
		.await?;

		tracing::info!(
			event_id = event.id,
			actor_type = %event.actor_type,
			actor_id = %event.actor_id,
			"Event stored."
		);

		Ok(event)
	}
}

fn non_blank_or(value: String, default: fn() -> String) -> String {
	let trimmed = value.trim();

	if trimmed.is_empty() { default() } else { trimmed.to_string() }
}

fn default_actor_type() -> String {
	"user".to_string()
}

fn default_actor_id() -> String {
	"unknown".to_string()
}

fn empty_payload() -> Value {
	Value::Object(Map::new())
}
