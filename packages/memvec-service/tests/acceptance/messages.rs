use serde_json::json;

use memvec_service::MessageRequest;

use crate::support::{self, SpyLanguageModel};

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn message_is_acknowledged_with_the_stored_key() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping message_is_acknowledged_with_the_stored_key; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([{
		"type": "preference",
		"scope": "profile",
		"key": "preference.communication.style",
		"value": { "items": ["short answers"], "polarity": "prefer" },
		"confidence": 0.9
	}])));
	let h = super::harness(&test_db, llm, |_| {}).await;
	let response = h
		.service
		.handle_message(MessageRequest {
			actor_id: Some("u7".to_string()),
			text: Some("Please keep answers short.".to_string()),
			payload: None,
		})
		.await
		.expect("Message failed.");

	assert_eq!(response.output_text, "Noted: preference.communication.style");
	assert_eq!(response.memories_created, 1);

	let incoming = h.service.get_event(response.event_id).await.expect("Lookup failed.");

	assert_eq!(incoming.actor_type, "user");
	assert_eq!(incoming.actor_id, "u7");

	let (actor_type, actor_id, text, payload): (String, String, String, serde_json::Value) =
		sqlx::query_as(
			"SELECT actor_type, actor_id, text, payload FROM events WHERE id <> $1 ORDER BY id DESC LIMIT 1",
		)
		.bind(response.event_id)
		.fetch_one(&h.service.db.pool)
		.await
		.expect("System event missing.");

	assert_eq!(actor_type, "system");
	assert_eq!(actor_id, "memvec");
	assert_eq!(text, response.output_text);
	assert_eq!(payload, json!({ "in_response_to_event_id": response.event_id }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn message_counts_several_memories() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping message_counts_several_memories; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([
		{
			"type": "fact",
			"scope": "profile",
			"key": "fact.work.background",
			"value": { "data": { "role": "engineer" } },
			"confidence": 0.9
		},
		{
			"type": "goal",
			"scope": "profile",
			"key": "goal.learning.objective",
			"value": { "objective": "learn Rust" },
			"confidence": 0.85
		}
	])));
	let h = super::harness(&test_db, llm, |_| {}).await;
	let request = MessageRequest {
		actor_id: None,
		text: Some("I am an engineer learning Rust.".to_string()),
		payload: None,
	};
	let first = h.service.handle_message(request.clone()).await.expect("Message failed.");

	assert_eq!(first.output_text, "Noted 2 items.");
	assert_eq!(first.memories_created, 2);
	assert_eq!(
		h.service.get_event(first.event_id).await.expect("Lookup failed.").actor_id,
		"unknown"
	);

	let second = h.service.handle_message(request).await.expect("Message failed.");

	assert_eq!(second.output_text, "Got it.");
	assert_eq!(second.memories_created, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
