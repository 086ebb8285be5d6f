use serde::Serialize;
use serde_json::Value;

use memvec_domain::{memory, qualification::QualifiedMemory};
use memvec_storage::{
	models::{Event, Memory, NewMemory},
	queries,
};

use crate::{
	DedupIndex, Error, IndexMetadata, MemoryRecord, MemvecService, Result,
	graph_mirror::{self, MirrorReport},
	qualify,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
	/// Candidates came from the language model.
	Model,
	/// Model qualification is disabled and the fallback episode was used.
	Fallback,
	/// The event had nothing to qualify.
	Empty,
}

/// Result of a best-effort step that runs after the authoritative write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
	Done,
	Degraded { message: String },
	Failed { message: String },
	Skipped,
}
impl StepStatus {
	pub fn is_done(&self) -> bool {
		matches!(self, Self::Done)
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CandidateOutcome {
	Duplicate {
		memory_id: i64,
		assertion_count: i32,
	},
	Created {
		memory: MemoryRecord,
		index: StepStatus,
		graph: StepStatus,
		#[serde(skip_serializing_if = "Option::is_none")]
		mirror: Option<MirrorReport>,
	},
}

#[derive(Clone, Debug, Serialize)]
pub struct ProcessReport {
	pub event_id: i64,
	pub candidate_source: CandidateSource,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub extraction_error: Option<String>,
	pub outcomes: Vec<CandidateOutcome>,
}
impl ProcessReport {
	pub fn created(&self) -> impl Iterator<Item = &MemoryRecord> {
		self.outcomes.iter().filter_map(|outcome| match outcome {
			CandidateOutcome::Created { memory, .. } => Some(memory),
			CandidateOutcome::Duplicate { .. } => None,
		})
	}

	pub fn created_count(&self) -> usize {
		self.created().count()
	}
}

impl MemvecService {
	/// Re-runs qualification and storage for an event that is already persisted.
	pub async fn process_event(&self, event_id: i64) -> Result<ProcessReport> {
		let event = queries::get_event(&self.db.pool, event_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Event {event_id} not found.") })?;

		self.process(&event).await
	}

	pub(crate) async fn process(&self, event: &Event) -> Result<ProcessReport> {
		let qualified = qualify::qualify(&self.cfg, self.providers.llm.as_ref(), event).await?;
		let mut outcomes = Vec::with_capacity(qualified.candidates.len());

		for candidate in &qualified.candidates {
			outcomes.push(self.store_candidate(event, candidate).await?);
		}

		let report = ProcessReport {
			event_id: event.id,
			candidate_source: qualified.source,
			extraction_error: qualified.rejection,
			outcomes,
		};

		tracing::info!(
			event_id = event.id,
			candidates = report.outcomes.len(),
			created = report.created_count(),
			"Event processed."
		);

		Ok(report)
	}

	async fn store_candidate(
		&self,
		event: &Event,
		candidate: &QualifiedMemory,
	) -> Result<CandidateOutcome> {
		let memory_type = candidate.memory_type;
		let scope = memory::effective_scope(memory_type, candidate.scope);
		let key = memory::effective_key(memory_type, &candidate.key);
		let index = self.dedup_index();
		let hits =
			index.duplicate_hits(&key, &candidate.value, self.cfg.memory.dup_min_score).await?;
		let mut stale_points = Vec::new();
		let mut stale_memories = Vec::new();

		for hit in hits {
			if stale_memories.contains(&hit.memory_id) {
				stale_points.push(hit.point_id);

				continue;
			}

			let Some(existing) =
				queries::increment_assertion_count(&self.db.pool, hit.memory_id).await?
			else {
				tracing::warn!(
					event_id = event.id,
					memory_id = hit.memory_id,
					point_id = hit.point_id,
					"Index points at a missing memory."
				);

				stale_memories.push(hit.memory_id);
				stale_points.push(hit.point_id);

				continue;
			};

			tracing::info!(
				event_id = event.id,
				memory_id = existing.id,
				key = %existing.key,
				assertion_count = existing.assertion_count,
				"Duplicate memory asserted again."
			);

			if let Err(err) = index
				.update_field(existing.id, "assertion_count", Value::from(existing.assertion_count))
				.await
			{
				tracing::warn!(
					memory_id = existing.id,
					error = %err,
					"Index payload patch failed."
				);
			}

			repoint_stale(&index, &stale_points, existing.id).await;

			return Ok(CandidateOutcome::Duplicate {
				memory_id: existing.id,
				assertion_count: existing.assertion_count,
			});
		}

		let memory = queries::insert_memory(
			&self.db.pool,
			&NewMemory {
				memory_type: memory_type.as_str().to_string(),
				scope: scope.as_str().to_string(),
				key,
				value: candidate.value.clone(),
				confidence: candidate.confidence,
				assertion_count: 1,
				source_event_id: event.id,
			},
		)
		.await?;

		tracing::info!(
			event_id = event.id,
			memory_id = memory.id,
			memory_type = %memory.memory_type,
			key = %memory.key,
			"Memory stored."
		);

		let index_status = self.index_memory(&memory).await;

		repoint_stale(&index, &stale_points, memory.id).await;

		let (graph_status, mirror) = if index_status.is_done() {
			let report =
				graph_mirror::mirror_memory(&self.cfg, self.stores.graph.as_ref(), event, &memory)
					.await;

			(mirror_status(&report), Some(report))
		} else {
			(StepStatus::Skipped, None)
		};

		Ok(CandidateOutcome::Created {
			memory: memory.into(),
			index: index_status,
			graph: graph_status,
			mirror,
		})
	}

	pub(crate) async fn index_memory(&self, memory: &Memory) -> StepStatus {
		let metadata = IndexMetadata {
			memory_type: &memory.memory_type,
			scope: &memory.scope,
			confidence: memory.confidence,
			source_event_id: memory.source_event_id,
		};

		match self.dedup_index().insert(memory.id, &memory.key, &memory.value, &metadata).await {
			Ok(()) => StepStatus::Done,
			Err(err) => {
				tracing::warn!(memory_id = memory.id, error = %err, "Memory indexing failed.");

				StepStatus::Failed { message: err.to_string() }
			},
		}
	}
}

/// Moves fingerprints whose memory row is gone onto the row that now holds the memory.
async fn repoint_stale(index: &DedupIndex<'_>, stale_points: &[u64], memory_id: i64) {
	for &point_id in stale_points {
		match index.repoint(point_id, memory_id).await {
			Ok(()) => tracing::info!(point_id, memory_id, "Stale fingerprint repointed."),
			Err(err) => {
				tracing::warn!(
					point_id,
					memory_id,
					error = %err,
					"Stale fingerprint repoint failed."
				);
			},
		}
	}
}

pub(crate) fn mirror_status(report: &MirrorReport) -> StepStatus {
	if report.is_clean() {
		StepStatus::Done
	} else if report.nodes_upserted > 0 {
		StepStatus::Degraded {
			message: format!(
				"{} graph writes failed and {} edges were skipped.",
				report.failures, report.skipped_edges
			),
		}
	} else {
		StepStatus::Failed { message: "No graph nodes could be written.".to_string() }
	}
}
