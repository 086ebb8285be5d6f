use serde::{Deserialize, Serialize};

use memvec_storage::{models::Memory, queries};

use crate::{MemvecService, Result, StepStatus, graph_mirror, ingest};

const REBUILD_BATCH_SIZE: i64 = 256;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct RebuildIndexReport {
	pub rebuilt_count: u64,
	pub error_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct RebuildGraphReport {
	pub mirrored_count: u64,
	pub degraded_count: u64,
	pub error_count: u64,
}

impl MemvecService {
	/// Re-embeds every stored memory and writes it back into the similarity index.
	pub async fn rebuild_index(&self) -> Result<RebuildIndexReport> {
		let mut report = RebuildIndexReport::default();
		let mut after_id = 0_i64;

		loop {
			let batch = self.next_batch(after_id).await?;
			let Some(last) = batch.last() else {
				break;
			};

			after_id = last.id;

			for memory in &batch {
				match self.index_memory(memory).await {
					StepStatus::Done => report.rebuilt_count += 1,
					_ => report.error_count += 1,
				}
			}
		}

		tracing::info!(
			rebuilt_count = report.rebuilt_count,
			error_count = report.error_count,
			"Index rebuild finished."
		);

		Ok(report)
	}

	/// Mirrors every stored memory into the graph again, using its source event for the actor.
	pub async fn rebuild_graph(&self) -> Result<RebuildGraphReport> {
		let mut report = RebuildGraphReport::default();
		let mut after_id = 0_i64;

		loop {
			let batch = self.next_batch(after_id).await?;
			let Some(last) = batch.last() else {
				break;
			};

			after_id = last.id;

			for memory in &batch {
				let event = match queries::get_event(&self.db.pool, memory.source_event_id).await {
					Ok(Some(event)) => event,
					Ok(None) => {
						tracing::warn!(
							memory_id = memory.id,
							event_id = memory.source_event_id,
							"Source event missing. Skipping graph rebuild for memory."
						);

						report.error_count += 1;

						continue;
					},
					Err(err) => {
						tracing::warn!(
							memory_id = memory.id,
							error = %err,
							"Source event lookup failed."
						);

						report.error_count += 1;

						continue;
					},
				};
				let graph_store = self.stores.graph.as_ref();
				let mirror = graph_mirror::mirror_memory(&self.cfg, graph_store, &event, memory).await;

				match ingest::mirror_status(&mirror) {
					StepStatus::Done => report.mirrored_count += 1,
					StepStatus::Degraded { .. } => report.degraded_count += 1,
					_ => report.error_count += 1,
				}
			}
		}

		tracing::info!(
			mirrored_count = report.mirrored_count,
			degraded_count = report.degraded_count,
			error_count = report.error_count,
			"Graph rebuild finished."
		);

		Ok(report)
	}

	async fn next_batch(&self, after_id: i64) -> Result<Vec<Memory>> {
		Ok(queries::list_memories_after(&self.db.pool, after_id, REBUILD_BATCH_SIZE).await?)
	}
}
