#![allow(dead_code)]

use std::{
	collections::{BTreeMap, BTreeSet, HashMap, HashSet, hash_map::DefaultHasher},
	hash::{Hash, Hasher},
	sync::{
		Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};
use time::OffsetDateTime;

use memvec_config::{EmbeddingProviderConfig, LlmProviderConfig};
use memvec_domain::graph::{EdgeType, NodeLabel};
use memvec_providers::extractor::ChatRequest;
use memvec_service::{
	BoxFuture, EmbeddingProvider, Error, GraphEdgeRecord, GraphNodeRecord, GraphStore,
	LanguageModel, Result, VectorStore,
};
use memvec_storage::{
	models::{Event, Memory},
	qdrant::StoredPoint,
};

pub const VECTOR_DIM: u32 = 16;

/// Replays a fixed reply and records every request it receives.
pub struct SpyLanguageModel {
	pub reply: std::result::Result<String, String>,
	pub calls: AtomicUsize,
	pub temperatures: Mutex<Vec<f32>>,
	pub user_prompts: Mutex<Vec<String>>,
}
impl SpyLanguageModel {
	pub fn replying(reply: impl Into<String>) -> Self {
		Self {
			reply: Ok(reply.into()),
			calls: AtomicUsize::new(0),
			temperatures: Mutex::new(Vec::new()),
			user_prompts: Mutex::new(Vec::new()),
		}
	}

	pub fn failing(message: impl Into<String>) -> Self {
		Self { reply: Err(message.into()), ..Self::replying("") }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl LanguageModel for SpyLanguageModel {
	fn generate<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest<'a>,
	) -> BoxFuture<'a, Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.temperatures.lock().unwrap_or_else(|err| err.into_inner()).push(request.temperature);
		self.user_prompts
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push(request.user_prompt.to_string());

		let reply = self.reply.clone().map_err(|message| Error::Provider { message });

		Box::pin(async move { reply })
	}
}

/// Deterministic embedding: equal texts map to equal vectors, different texts scatter.
pub struct HashEmbedding {
	pub vector_dim: u32,
	pub calls: AtomicUsize,
	pub fail: AtomicBool,
}
impl HashEmbedding {
	pub fn new(vector_dim: u32) -> Self {
		Self { vector_dim, calls: AtomicUsize::new(0), fail: AtomicBool::new(false) }
	}

	pub fn vector_for(&self, text: &str) -> Vec<f32> {
		(0..self.vector_dim)
			.map(|dim| {
				let mut hasher = DefaultHasher::new();

				text.hash(&mut hasher);
				dim.hash(&mut hasher);

				(hasher.finish() % 2_001) as f32 / 1_000.0 - 1.0
			})
			.collect()
	}
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result: Result<Vec<Vec<f32>>> = if self.fail.load(Ordering::SeqCst) {
			Err(Error::Provider { message: "embedding unavailable".to_string() })
		} else {
			Ok(texts.iter().map(|text| self.vector_for(text)).collect())
		};

		Box::pin(async move { result })
	}
}

/// Brute-force cosine index.
#[derive(Default)]
pub struct MemoryVectorStore {
	pub points: Mutex<HashMap<u64, (Vec<f32>, Map<String, Value>)>>,
	pub fail_upserts: AtomicBool,
}
impl MemoryVectorStore {
	pub fn len(&self) -> usize {
		self.points.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn clear(&self) {
		self.points.lock().unwrap_or_else(|err| err.into_inner()).clear();
	}
}
impl VectorStore for MemoryVectorStore {
	fn upsert<'a>(
		&'a self,
		id: u64,
		vector: Vec<f32>,
		payload: &'a Map<String, Value>,
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.fail_upserts.load(Ordering::SeqCst) {
			Err(Error::Qdrant { message: "upsert rejected".to_string() })
		} else {
			self.points
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(id, (vector, payload.clone()));

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn retrieve<'a>(&'a self, id: u64) -> BoxFuture<'a, Result<Option<StoredPoint>>> {
		let point = self.points.lock().unwrap_or_else(|err| err.into_inner()).get(&id).map(
			|(_, payload)| StoredPoint { id, score: None, payload: payload.clone() },
		);

		Box::pin(async move { Ok(point) })
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		min_score: Option<f32>,
	) -> BoxFuture<'a, Result<Vec<StoredPoint>>> {
		let mut hits = self
			.points
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.map(|(id, (stored, payload))| StoredPoint {
				id: *id,
				score: Some(cosine(&vector, stored)),
				payload: payload.clone(),
			})
			.filter(|point| min_score.is_none_or(|min| point.score.unwrap_or(0.0) >= min))
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
		hits.truncate(limit as usize);

		Box::pin(async move { Ok(hits) })
	}

	fn set_payload<'a>(
		&'a self,
		id: u64,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<()>> {
		let mut points = self.points.lock().unwrap_or_else(|err| err.into_inner());
		let result = match points.get_mut(&id) {
			Some((_, payload)) => {
				payload.insert(field.to_string(), value);

				Ok(())
			},
			None => Err(Error::Qdrant { message: format!("point {id} not found") }),
		};

		Box::pin(async move { result })
	}
}

/// Graph with the same idempotence and endpoint rules as the Postgres tables.
#[derive(Default)]
pub struct MemoryGraphStore {
	pub nodes: Mutex<BTreeMap<String, (NodeLabel, Value)>>,
	pub edges: Mutex<BTreeSet<(String, String, String)>>,
	pub failing_labels: Mutex<HashSet<NodeLabel>>,
}
impl MemoryGraphStore {
	pub fn fail_label(&self, label: NodeLabel) {
		self.failing_labels.lock().unwrap_or_else(|err| err.into_inner()).insert(label);
	}

	pub fn node_count(&self) -> usize {
		self.nodes.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn clear(&self) {
		self.nodes.lock().unwrap_or_else(|err| err.into_inner()).clear();
		self.edges.lock().unwrap_or_else(|err| err.into_inner()).clear();
	}
}
impl GraphStore for MemoryGraphStore {
	fn upsert_node<'a>(
		&'a self,
		node_id: &'a str,
		label: NodeLabel,
		attrs: &'a Value,
	) -> BoxFuture<'a, Result<()>> {
		let failing =
			self.failing_labels.lock().unwrap_or_else(|err| err.into_inner()).contains(&label);
		let result = if failing {
			Err(Error::Graph { message: format!("{label} writes are failing") })
		} else {
			self.nodes
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(node_id.to_string(), (label, attrs.clone()));

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn upsert_edge<'a>(
		&'a self,
		src_id: &'a str,
		edge_type: EdgeType,
		dst_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		let nodes = self.nodes.lock().unwrap_or_else(|err| err.into_inner());
		let result = if nodes.contains_key(src_id) && nodes.contains_key(dst_id) {
			self.edges.lock().unwrap_or_else(|err| err.into_inner()).insert((
				src_id.to_string(),
				edge_type.as_str().to_string(),
				dst_id.to_string(),
			));

			Ok(())
		} else {
			Err(Error::Graph { message: format!("dangling edge {src_id} -> {dst_id}") })
		};

		Box::pin(async move { result })
	}

	fn get_node<'a>(
		&'a self,
		node_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GraphNodeRecord>>> {
		let node = self.nodes.lock().unwrap_or_else(|err| err.into_inner()).get(node_id).map(
			|(label, attrs)| GraphNodeRecord {
				node_id: node_id.to_string(),
				label: label.as_str().to_string(),
				attrs: attrs.clone(),
			},
		);

		Box::pin(async move { Ok(node) })
	}

	fn neighbors<'a>(
		&'a self,
		node_id: &'a str,
		edge_type: Option<EdgeType>,
	) -> BoxFuture<'a, Result<Vec<GraphEdgeRecord>>> {
		let edges: Vec<GraphEdgeRecord> = self
			.edges
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|(src, kind, dst)| {
				(src == node_id || dst == node_id)
					&& edge_type.is_none_or(|wanted| wanted.as_str() == kind)
			})
			.map(|(src, kind, dst)| GraphEdgeRecord {
				src_id: src.clone(),
				edge_type: kind.clone(),
				dst_id: dst.clone(),
			})
			.collect();

		Box::pin(async move { Ok(edges) })
	}
}

pub fn event(id: i64, text: &str, payload: Value) -> Event {
	Event {
		id,
		actor_type: "user".to_string(),
		actor_id: "u1".to_string(),
		text: text.to_string(),
		payload,
		created_at: OffsetDateTime::now_utc(),
	}
}

pub fn memory(id: i64, memory_type: &str, key: &str, value: Value) -> Memory {
	Memory {
		id,
		memory_type: memory_type.to_string(),
		scope: if memory_type == "episode" { "session" } else { "profile" }.to_string(),
		key: key.to_string(),
		value,
		confidence: 0.9,
		assertion_count: 1,
		decay: 0.0,
		superseded_by_memory_id: None,
		source_event_id: 1,
		created_at: OffsetDateTime::now_utc(),
	}
}

pub fn qualification(memories: Value) -> String {
	serde_json::json!({ "memories": memories }).to_string()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}
