use serde_json::{Map, Value};

use memvec_config::Config;
use memvec_domain::fingerprint;
use memvec_storage::qdrant::{QdrantStore, StoredPoint};

use crate::{BoxFuture, EmbeddingProvider, Error, Result, VectorStore};

const DUPLICATE_SEARCH_LIMIT: u64 = 8;

/// A fingerprint close enough to count as the same memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateHit {
	pub point_id: u64,
	pub memory_id: i64,
}

/// Metadata stored next to each fingerprint.
#[derive(Clone, Debug)]
pub struct IndexMetadata<'a> {
	pub memory_type: &'a str,
	pub scope: &'a str,
	pub confidence: f32,
	pub source_event_id: i64,
}

/// Semantic duplicate detection over memory fingerprints.
pub struct DedupIndex<'a> {
	cfg: &'a Config,
	embedding: &'a dyn EmbeddingProvider,
	vectors: &'a dyn VectorStore,
}
impl<'a> DedupIndex<'a> {
	pub fn new(
		cfg: &'a Config,
		embedding: &'a dyn EmbeddingProvider,
		vectors: &'a dyn VectorStore,
	) -> Self {
		Self { cfg, embedding, vectors }
	}

	/// Returns the id of an equivalent memory when the closest fingerprint scores at least
	/// `min_score`.
	pub async fn find_duplicate(
		&self,
		key: &str,
		value: &Value,
		min_score: f32,
	) -> Result<Option<i64>> {
		let hits = self.duplicate_hits(key, value, min_score).await?;

		Ok(hits.first().map(|hit| hit.memory_id))
	}

	/// Returns every fingerprint scoring at least `min_score`, best first.
	///
	/// Several points may share a fingerprint after a memory row was lost, so callers walk the
	/// hits until one resolves to a live memory.
	pub async fn duplicate_hits(
		&self,
		key: &str,
		value: &Value,
		min_score: f32,
	) -> Result<Vec<DuplicateHit>> {
		let vector = self.embed_fingerprint(key, value).await?;
		let hits = self.vectors.search(vector, DUPLICATE_SEARCH_LIMIT, Some(min_score)).await?;

		Ok(hits
			.into_iter()
			.filter(|hit| !hit.score.is_some_and(|score| score < min_score))
			.filter_map(|hit| {
				memory_id_of(&hit).map(|memory_id| DuplicateHit { point_id: hit.id, memory_id })
			})
			.collect())
	}

	/// Points an existing fingerprint at another memory row.
	pub async fn repoint(&self, point_id: u64, memory_id: i64) -> Result<()> {
		self.vectors.set_payload(point_id, "memory_id", Value::from(memory_id)).await
	}

	pub async fn insert(
		&self,
		memory_id: i64,
		key: &str,
		value: &Value,
		metadata: &IndexMetadata<'_>,
	) -> Result<()> {
		let point_id = point_id(memory_id)?;
		let vector = self.embed_fingerprint(key, value).await?;
		let mut payload = Map::new();

		payload.insert("memory_id".to_string(), Value::from(memory_id));
		payload.insert("type".to_string(), Value::String(metadata.memory_type.to_string()));
		payload.insert("scope".to_string(), Value::String(metadata.scope.to_string()));
		payload.insert("key".to_string(), Value::String(key.to_string()));
		payload.insert("value".to_string(), value.clone());
		payload.insert("confidence".to_string(), Value::from(f64::from(metadata.confidence)));
		payload.insert("source_event_id".to_string(), Value::from(metadata.source_event_id));

		self.vectors.upsert(point_id, vector, &payload).await
	}

	/// Patches one metadata field of an indexed memory without re-embedding it.
	pub async fn update_field(&self, memory_id: i64, field: &str, value: Value) -> Result<()> {
		if field.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "field must not be empty.".to_string() });
		}

		self.vectors.set_payload(point_id(memory_id)?, field, value).await
	}

	async fn embed_fingerprint(&self, key: &str, value: &Value) -> Result<Vec<f32>> {
		let text = fingerprint::fingerprint_text(key, value);
		let vectors =
			self.embedding.embed(&self.cfg.providers.embedding, std::slice::from_ref(&text)).await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions, expected {}.",
					vector.len(),
					self.cfg.storage.qdrant.vector_dim
				),
			});
		}

		Ok(vector)
	}
}

pub(crate) fn point_id(memory_id: i64) -> Result<u64> {
	u64::try_from(memory_id).map_err(|_| Error::InvalidRequest {
		message: format!("Memory id {memory_id} cannot be used as a point id."),
	})
}

fn memory_id_of(point: &StoredPoint) -> Option<i64> {
	point
		.payload
		.get("memory_id")
		.and_then(Value::as_i64)
		.or_else(|| i64::try_from(point.id).ok())
}

impl VectorStore for QdrantStore {
	fn upsert<'a>(
		&'a self,
		id: u64,
		vector: Vec<f32>,
		payload: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, id, vector, payload).await?) })
	}

	fn retrieve<'a>(&'a self, id: u64) -> BoxFuture<'a, Result<Option<StoredPoint>>> {
		Box::pin(async move { Ok(QdrantStore::retrieve(self, id).await?) })
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		min_score: Option<f32>,
	) -> BoxFuture<'a, Result<Vec<StoredPoint>>> {
		Box::pin(async move { Ok(QdrantStore::search(self, vector, limit, min_score).await?) })
	}

	fn set_payload<'a>(
		&'a self,
		id: u64,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::set_payload(self, id, field, value).await?) })
	}
}
