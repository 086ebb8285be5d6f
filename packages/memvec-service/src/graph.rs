use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use memvec_domain::graph::{EdgeType, NodeLabel};
use memvec_storage::{
	graph,
	models::{GraphEdge, GraphNode},
};

use crate::{BoxFuture, Error, GraphStore, MemvecService, Result};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GraphNodeRecord {
	pub node_id: String,
	pub label: String,
	pub attrs: Value,
}
impl From<GraphNode> for GraphNodeRecord {
	fn from(node: GraphNode) -> Self {
		Self { node_id: node.node_id, label: node.label, attrs: node.attrs }
	}
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GraphEdgeRecord {
	pub src_id: String,
	pub edge_type: String,
	pub dst_id: String,
}
impl From<GraphEdge> for GraphEdgeRecord {
	fn from(edge: GraphEdge) -> Self {
		Self { src_id: edge.src_id, edge_type: edge.edge_type, dst_id: edge.dst_id }
	}
}

/// Graph mirror persisted in the `graph_nodes` and `graph_edges` tables.
pub struct PgGraphStore {
	pool: PgPool,
}
impl PgGraphStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}
impl GraphStore for PgGraphStore {
	fn upsert_node<'a>(
		&'a self,
		node_id: &'a str,
		label: NodeLabel,
		attrs: &'a Value,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			graph::upsert_node(&self.pool, node_id, label.as_str(), attrs)
				.await
				.map_err(graph_error)?;

			Ok(())
		})
	}

	fn upsert_edge<'a>(
		&'a self,
		src_id: &'a str,
		edge_type: EdgeType,
		dst_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			graph::upsert_edge(&self.pool, src_id, edge_type.as_str(), dst_id)
				.await
				.map_err(graph_error)?;

			Ok(())
		})
	}

	fn get_node<'a>(
		&'a self,
		node_id: &'a str,
	) -> BoxFuture<'a, Result<Option<GraphNodeRecord>>> {
		Box::pin(async move {
			let node = graph::get_node(&self.pool, node_id).await.map_err(graph_error)?;

			Ok(node.map(GraphNodeRecord::from))
		})
	}

	fn neighbors<'a>(
		&'a self,
		node_id: &'a str,
		edge_type: Option<EdgeType>,
	) -> BoxFuture<'a, Result<Vec<GraphEdgeRecord>>> {
		Box::pin(async move {
			let edges = graph::neighbors(&self.pool, node_id, edge_type.map(EdgeType::as_str))
				.await
				.map_err(graph_error)?;

			Ok(edges.into_iter().map(GraphEdgeRecord::from).collect())
		})
	}
}

impl MemvecService {
	pub async fn get_node(&self, node_id: &str) -> Result<GraphNodeRecord> {
		self.stores
			.graph
			.get_node(node_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Node {node_id:?} not found.") })
	}

	/// Lists edges touching a node. Without an edge type every mirror edge type is followed.
	pub async fn neighbors(
		&self,
		node_id: &str,
		edge_type: Option<&str>,
	) -> Result<Vec<GraphEdgeRecord>> {
		let edge_type = match edge_type.map(str::trim).filter(|value| !value.is_empty()) {
			Some(raw) => Some(raw.parse::<EdgeType>().map_err(|err| Error::InvalidRequest {
				message: err.to_string(),
			})?),
			None => None,
		};

		self.stores.graph.neighbors(node_id, edge_type).await
	}
}

fn graph_error(err: memvec_storage::Error) -> Error {
	Error::Graph { message: err.to_string() }
}
