use serde_json::json;

use memvec_service::{IngestEventRequest, RebuildGraphReport, RebuildIndexReport};

use crate::support::{self, SpyLanguageModel};

#[tokio::test]
#[ignore = "Requires external Postgres. Set MEMVEC_PG_DSN to run."]
async fn projections_are_rebuilt_from_stored_memories() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping projections_are_rebuilt_from_stored_memories; set MEMVEC_PG_DSN to run.");

		return;
	};
	let llm = SpyLanguageModel::replying(support::qualification(json!([
		{
			"type": "preference",
			"scope": "profile",
			"key": "preference.tools.likes",
			"value": { "items": ["qdrant"] },
			"confidence": 0.9
		},
		{
			"type": "plan",
			"scope": "profile",
			"key": "plan.work.steps",
			"value": { "steps": ["ship the ollama integration"] },
			"confidence": 0.8
		}
	])));
	let h = super::harness(&test_db, llm, |_| {}).await;

	h.service
		.ingest_event(IngestEventRequest {
			text: "I like Qdrant and plan to ship the Ollama integration.".to_string(),
			..Default::default()
		})
		.await
		.expect("Ingest failed.");

	let nodes_before = h.graph.node_count();
	let edges_before = h.graph.edge_count();

	h.vectors.clear();
	h.graph.clear();

	let index_report = h.service.rebuild_index().await.expect("Index rebuild failed.");

	assert_eq!(index_report, RebuildIndexReport { rebuilt_count: 2, error_count: 0 });
	assert_eq!(h.vectors.len(), 2);

	let graph_report = h.service.rebuild_graph().await.expect("Graph rebuild failed.");

	assert_eq!(
		graph_report,
		RebuildGraphReport { mirrored_count: 2, degraded_count: 0, error_count: 0 }
	);
	assert_eq!(h.graph.node_count(), nodes_before);
	assert_eq!(h.graph.edge_count(), edges_before);

	h.vectors.fail_upserts.store(true, std::sync::atomic::Ordering::SeqCst);

	let failing = h.service.rebuild_index().await.expect("Index rebuild failed.");

	assert_eq!(failing, RebuildIndexReport { rebuilt_count: 0, error_count: 2 });

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
