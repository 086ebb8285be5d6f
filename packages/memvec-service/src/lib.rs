pub mod admin;
pub mod dedup;
pub mod events;
pub mod graph;
pub mod graph_mirror;
pub mod ingest;
pub mod memories;
pub mod messages;
pub mod qualify;

mod error;
mod rfc3339;

pub use admin::{RebuildGraphReport, RebuildIndexReport};
pub use dedup::{DedupIndex, DuplicateHit, IndexMetadata};
pub use error::{Error, Result};
pub use events::{EventRecord, IngestEventRequest, IngestEventResponse};
pub use graph::{GraphEdgeRecord, GraphNodeRecord, PgGraphStore};
pub use graph_mirror::MirrorReport;
pub use ingest::{CandidateOutcome, CandidateSource, ProcessReport, StepStatus};
pub use memories::{ListMemoriesRequest, MemoryRecord};
pub use messages::{MessageRequest, MessageResponse};
pub use qualify::QualifyOutcome;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use memvec_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use memvec_domain::graph::{EdgeType, NodeLabel};
use memvec_providers::{embedding, extractor, extractor::ChatRequest};
use memvec_storage::{
	db::Db,
	qdrant::{QdrantStore, StoredPoint},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait LanguageModel
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest<'a>,
	) -> BoxFuture<'a, Result<String>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Similarity index keyed by numeric point ids.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn upsert<'a>(
		&'a self,
		id: u64,
		vector: Vec<f32>,
		payload: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<()>>;

	fn retrieve<'a>(&'a self, id: u64) -> BoxFuture<'a, Result<Option<StoredPoint>>>;

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		min_score: Option<f32>,
	) -> BoxFuture<'a, Result<Vec<StoredPoint>>>;

	fn set_payload<'a>(
		&'a self,
		id: u64,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<()>>;
}

/// Property graph holding the derived actor/memory/entity mirror.
pub trait GraphStore
where
	Self: Send + Sync,
{
	fn upsert_node<'a>(
		&'a self,
		node_id: &'a str,
		label: NodeLabel,
		attrs: &'a Value,
	) -> BoxFuture<'a, Result<()>>;

	fn upsert_edge<'a>(
		&'a self,
		src_id: &'a str,
		edge_type: EdgeType,
		dst_id: &'a str,
	) -> BoxFuture<'a, Result<()>>;

	fn get_node<'a>(
		&'a self,
		node_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GraphNodeRecord>>>;

	fn neighbors<'a>(
		&'a self,
		node_id: &'a str,
		edge_type: Option<EdgeType>,
	) -> BoxFuture<'a, Result<Vec<GraphEdgeRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LanguageModel>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LanguageModel>) -> Self {
		Self { embedding, llm }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), llm: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub vectors: Arc<dyn VectorStore>,
	pub graph: Arc<dyn GraphStore>,
}
impl Stores {
	pub fn new(vectors: Arc<dyn VectorStore>, graph: Arc<dyn GraphStore>) -> Self {
		Self { vectors, graph }
	}
}

pub struct MemvecService {
	pub cfg: Config,
	pub db: Db,
	pub stores: Stores,
	pub providers: Providers,
}
impl MemvecService {
	/// Wires the HTTP providers, the Qdrant collection and the Postgres graph tables.
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		let graph = PgGraphStore::new(db.pool.clone());
		let stores = Stores::new(Arc::new(qdrant), Arc::new(graph));

		Self { cfg, db, stores, providers: Providers::default() }
	}

	pub fn with_parts(cfg: Config, db: Db, stores: Stores, providers: Providers) -> Self {
		Self { cfg, db, stores, providers }
	}

	pub fn dedup_index(&self) -> DedupIndex<'_> {
		DedupIndex::new(
			&self.cfg,
			self.providers.embedding.as_ref(),
			self.stores.vectors.as_ref(),
		)
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl LanguageModel for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest<'a>,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(extractor::generate(cfg, request).await?) })
	}
}
