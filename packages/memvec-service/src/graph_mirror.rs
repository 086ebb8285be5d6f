use serde::Serialize;
use serde_json::json;

use memvec_config::Config;
use memvec_domain::{
	entities,
	graph::{self, EdgeType, NodeLabel},
	memory::MemoryType,
};
use memvec_storage::models::{Event, Memory};

use crate::GraphStore;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
	pub nodes_upserted: u32,
	pub edges_upserted: u32,
	pub failures: u32,
	pub skipped_edges: u32,
}
impl MirrorReport {
	pub fn is_clean(&self) -> bool {
		self.failures == 0 && self.skipped_edges == 0
	}
}

/// Mirrors one persisted memory into the graph.
///
/// Every write is attempted independently. Failures are logged and counted, never returned, and
/// an edge is only written when both of its endpoints were written in this pass.
pub async fn mirror_memory(
	cfg: &Config,
	graph_store: &dyn GraphStore,
	event: &Event,
	memory: &Memory,
) -> MirrorReport {
	let mut report = MirrorReport::default();
	let actor_id = graph::actor_node_id(&event.actor_type, &event.actor_id);
	let memory_node_id = graph::memory_node_id(memory.id);
	let actor_attrs = json!({ "actor_type": event.actor_type, "actor_id": event.actor_id });
	let memory_attrs = json!({
		"memory_id": memory.id,
		"type": memory.memory_type,
		"scope": memory.scope,
		"key": memory.key,
		"confidence": memory.confidence,
	});
	let actor_ok =
		upsert_node(graph_store, &mut report, &actor_id, NodeLabel::Actor, &actor_attrs).await;
	let memory_ok =
		upsert_node(graph_store, &mut report, &memory_node_id, NodeLabel::Memory, &memory_attrs)
			.await;

	if actor_ok && memory_ok {
		upsert_edge(graph_store, &mut report, &actor_id, EdgeType::HasMemory, &memory_node_id)
			.await;
	} else {
		report.skipped_edges += 1;
	}

	let Ok(memory_type) = memory.memory_type.parse::<MemoryType>() else {
		tracing::warn!(
			memory_id = memory.id,
			memory_type = %memory.memory_type,
			"Unknown memory type. Skipping entity extraction."
		);

		report.failures += 1;

		return report;
	};

	for entity in entities::extract_entities(
		memory_type,
		&memory.key,
		&memory.value,
		&cfg.graph.entity_vocabulary,
	) {
		let entity_id = graph::entity_node_id(&entity.entity_type, &entity.name);
		let attrs = json!({ "name": entity.name, "entity_type": entity.entity_type });
		let entity_ok =
			upsert_node(graph_store, &mut report, &entity_id, NodeLabel::Entity, &attrs).await;

		if entity_ok && memory_ok {
			upsert_edge(graph_store, &mut report, &memory_node_id, EdgeType::About, &entity_id)
				.await;
		} else {
			report.skipped_edges += 1;
		}
	}

	report
}

async fn upsert_node(
	graph_store: &dyn GraphStore,
	report: &mut MirrorReport,
	node_id: &str,
	label: NodeLabel,
	attrs: &serde_json::Value,
) -> bool {
	match graph_store.upsert_node(node_id, label, attrs).await {
		Ok(()) => {
			report.nodes_upserted += 1;

			true
		},
		Err(err) => {
			tracing::warn!(node_id, label = %label, error = %err, "Graph node upsert failed.");

			report.failures += 1;

			false
		},
	}
}

async fn upsert_edge(
	graph_store: &dyn GraphStore,
	report: &mut MirrorReport,
	src_id: &str,
	edge_type: EdgeType,
	dst_id: &str,
) {
	match graph_store.upsert_edge(src_id, edge_type, dst_id).await {
		Ok(()) => report.edges_upserted += 1,
		Err(err) => {
			tracing::warn!(
				src_id,
				dst_id,
				edge_type = %edge_type,
				error = %err,
				"Graph edge upsert failed."
			);

			report.failures += 1;
		},
	}
}
