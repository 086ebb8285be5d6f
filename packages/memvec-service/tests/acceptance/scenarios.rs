use serde_json::json;

use memvec_service::{
	CandidateOutcome, CandidateSource, Error, IngestEventRequest, ListMemoriesRequest, StepStatus,
};

use crate::support::{self, SpyLanguageModel};

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn explicit_fact_is_stored_in_profile_scope() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping explicit_fact_is_stored_in_profile_scope; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([{
		"type": "fact",
		"scope": "profile",
		"key": "fact.personal.identity",
		"value": { "name": "Rishi" },
		"confidence": 0.95
	}])));
	let h = super::harness(&test_db, llm, |_| {}).await;
	let response = h
		.service
		.ingest_event(IngestEventRequest {
			text: "Remember this fact: My name is Rishi.".to_string(),
			..Default::default()
		})
		.await
		.expect("Ingest failed.");

	assert_eq!(response.event.actor_type, "user");
	assert_eq!(response.event.actor_id, "unknown");

	let report = response.report;
	let created = report.created().collect::<Vec<_>>();

	assert!(!created.is_empty());
	assert_eq!(created[0].memory_type, "fact");
	assert_eq!(created[0].scope, "profile");
	assert_eq!(created[0].assertion_count, 1);
	assert!(matches!(
		&report.outcomes[0],
		CandidateOutcome::Created { index: StepStatus::Done, graph: StepStatus::Done, .. }
	));
	assert!(h.graph.node_count() >= 2);

	let stored = h.service.get_memory(created[0].id).await.expect("Memory lookup failed.");

	assert_eq!(stored.source_event_id, response.event.id);
	assert_eq!(h.llm.calls(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn empty_event_creates_nothing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping empty_event_creates_nothing; set MEMVEC_PG_DSN to run.");

		return;
	};
	let h = super::harness(&test_db, SpyLanguageModel::replying("{}"), |_| {}).await;
	let response = h
		.service
		.ingest_event(IngestEventRequest::default())
		.await
		.expect("Ingest failed.");
	let report = response.report;

	assert_eq!(report.candidate_source, CandidateSource::Empty);
	assert_eq!(super::memory_count(&h.service).await, 0);
	assert_eq!(h.llm.calls(), 0);
	assert_eq!(h.service.get_event(response.event.id).await.expect("Lookup failed.").text, "");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn disabled_qualifier_stores_the_fallback_episode() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping disabled_qualifier_stores_the_fallback_episode; set MEMVEC_PG_DSN to run.");

		return;
	};
	let h = super::harness(&test_db, SpyLanguageModel::replying("{}"), |cfg| {
		cfg.memory.use_llm_qualifier = false;
	})
	.await;

	h.service
		.ingest_event(IngestEventRequest { text: "hello".to_string(), ..Default::default() })
		.await
		.expect("Ingest failed.");

	let memories = h
		.service
		.list_memories(ListMemoriesRequest::default())
		.await
		.expect("Failed to list memories.");

	assert_eq!(memories.len(), 1);
	assert_eq!(memories[0].memory_type, "episode");
	assert_eq!(memories[0].scope, "session");
	assert_eq!(memories[0].key, "event_summary");
	assert!((memories[0].confidence - 0.3).abs() < 1e-6);
	assert_eq!(memories[0].value, json!({ "text": "hello", "payload": {} }));
	assert_eq!(h.llm.calls(), 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn episode_scope_and_blank_keys_are_normalized() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping episode_scope_and_blank_keys_are_normalized; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([
		{
			"type": "episode",
			"scope": "profile",
			"key": "episode.travel.context",
			"value": { "summary": "Flew to Lisbon." },
			"confidence": 0.8
		},
		{
			"type": "fact",
			"scope": "profile",
			"key": "  ",
			"value": { "data": { "city": "Lisbon" } },
			"confidence": 0.7
		}
	])));
	let h = super::harness(&test_db, llm, |_| {}).await;

	h.service
		.ingest_event(IngestEventRequest {
			text: "I flew to Lisbon and I live there now.".to_string(),
			..Default::default()
		})
		.await
		.expect("Ingest failed.");

	let episodes = h
		.service
		.list_memories(ListMemoriesRequest {
			memory_type: Some("episode".to_string()),
			..Default::default()
		})
		.await
		.expect("Failed to list memories.");

	assert_eq!(episodes.len(), 1);
	assert_eq!(episodes[0].scope, "session");

	let facts = h
		.service
		.list_memories(ListMemoriesRequest {
			memory_type: Some("fact".to_string()),
			scope: Some("profile".to_string()),
			..Default::default()
		})
		.await
		.expect("Failed to list memories.");

	assert_eq!(facts.len(), 1);
	assert_eq!(facts[0].key, "fact_auto");

	let invalid = h
		.service
		.list_memories(ListMemoriesRequest { scope: Some("global".to_string()), ..Default::default() })
		.await;

	assert!(matches!(invalid, Err(Error::InvalidRequest { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn index_failure_keeps_the_memory_and_skips_the_graph() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping index_failure_keeps_the_memory_and_skips_the_graph; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([{
		"type": "goal",
		"scope": "profile",
		"key": "goal.fitness.objective",
		"value": { "objective": "run a marathon" },
		"confidence": 0.9
	}])));
	let h = super::harness(&test_db, llm, |_| {}).await;

	h.vectors.fail_upserts.store(true, std::sync::atomic::Ordering::SeqCst);

	let response = h
		.service
		.ingest_event(IngestEventRequest {
			text: "I want to run a marathon.".to_string(),
			..Default::default()
		})
		.await
		.expect("Ingest failed.");
	let report = response.report;

	assert!(matches!(
		&report.outcomes[0],
		CandidateOutcome::Created {
			index: StepStatus::Failed { .. },
			graph: StepStatus::Skipped,
			mirror: None,
			..
		}
	));
	assert_eq!(super::memory_count(&h.service).await, 1);
	assert_eq!(h.graph.node_count(), 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn lookup_failure_propagates_and_keeps_the_event() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping lookup_failure_propagates_and_keeps_the_event; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([{
		"type": "constraint",
		"scope": "profile",
		"key": "constraint.health.rules",
		"value": { "rule": "no peanuts" },
		"confidence": 0.95
	}])));
	let h = super::harness(&test_db, llm, |_| {}).await;

	h.embedding.fail.store(true, std::sync::atomic::Ordering::SeqCst);

	let err = h
		.service
		.ingest_event(IngestEventRequest {
			text: "I am allergic to peanuts.".to_string(),
			..Default::default()
		})
		.await
		.expect_err("Expected the lookup failure to propagate.");

	assert!(matches!(err, Error::Provider { .. }), "Unexpected error: {err}");
	assert_eq!(super::memory_count(&h.service).await, 0);

	let event_id = super::latest_event_id(&h.service).await;
	let event = h.service.get_event(event_id).await.expect("Stored event missing.");

	assert_eq!(event.text, "I am allergic to peanuts.");

	h.embedding.fail.store(false, std::sync::atomic::Ordering::SeqCst);

	let report = h.service.process_event(event_id).await.expect("Reprocess failed.");

	assert_eq!(report.created_count(), 1);

	let missing = h.service.process_event(event_id + 1_000).await;

	assert!(matches!(missing, Err(Error::NotFound { .. })));
	assert!(matches!(h.service.get_memory(9_999).await, Err(Error::NotFound { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn memory_write_failure_is_a_storage_error() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping memory_write_failure_is_a_storage_error; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([{
		"type": "fact",
		"scope": "profile",
		"key": "fact.personal.identity",
		"value": { "name": "Rishi" },
		"confidence": 0.95
	}])));
	let h = super::harness(&test_db, llm, |_| {}).await;

	sqlx::query("ALTER TABLE memories RENAME TO memories_moved")
		.execute(&h.service.db.pool)
		.await
		.expect("Failed to rename the memories table.");

	let err = h
		.service
		.ingest_event(IngestEventRequest {
			text: "My name is Rishi.".to_string(),
			..Default::default()
		})
		.await
		.expect_err("Expected the memory write to fail.");

	assert!(matches!(err, Error::Storage { .. }), "Unexpected error: {err}");
	assert_eq!(h.vectors.len(), 0);

	let event_id = super::latest_event_id(&h.service).await;

	assert!(h.service.get_event(event_id).await.is_ok());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
