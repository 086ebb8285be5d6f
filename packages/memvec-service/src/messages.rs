use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{IngestEventRequest, MemvecService, ProcessReport, Result};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageRequest {
	pub actor_id: Option<String>,
	pub text: Option<String>,
	pub payload: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
	/// Id of the inbound user event.
	pub event_id: i64,
	pub output_text: String,
	pub memories_created: usize,
}

impl MemvecService {
	/// Records a user message, qualifies it and records the system acknowledgement.
	pub async fn handle_message(&self, req: MessageRequest) -> Result<MessageResponse> {
		let incoming = self
			.store_event(IngestEventRequest {
				actor_type: self.cfg.actors.user_actor.clone(),
				actor_id: req.actor_id.unwrap_or_default(),
				text: req.text.unwrap_or_default(),
				payload: req.payload.unwrap_or(Value::Null),
			})
			.await?;
		let report = self.process(&incoming).await?;
		let output_text = acknowledgement(&report);
		let response = self
			.store_event(IngestEventRequest {
				actor_type: self.cfg.actors.system_actor.clone(),
				actor_id: self.cfg.actors.system_actor_id.clone(),
				text: output_text.clone(),
				payload: json!({ "in_response_to_event_id": incoming.id }),
			})
			.await?;

		tracing::debug!(
			event_id = response.id,
			in_response_to_event_id = incoming.id,
			"System response stored."
		);

		Ok(MessageResponse {
			event_id: incoming.id,
			output_text,
			memories_created: report.created_count(),
		})
	}
}

fn acknowledgement(report: &ProcessReport) -> String {
	let mut created = report.created();

	match (created.next(), created.next()) {
		(None, _) => "Got it.".to_string(),
		(Some(memory), None) => format!("Noted: {}", memory.key),
		_ => format!("Noted {} items.", report.created_count()),
	}
}
