use serde_json::Value;
use sqlx::PgExecutor;

use crate::{
	Error, Result,
	models::{GraphEdge, GraphNode},
};

/// Inserts a node or replaces its label and attributes.
pub async fn upsert_node<'e, E>(
	executor: E,
	node_id: &str,
	label: &str,
	attrs: &Value,
) -> Result<GraphNode>
where
	E: PgExecutor<'e>,
{
	if node_id.trim().is_empty() {
		return Err(Error::InvalidArgument("graph node id must not be empty".to_string()));
	}

	let row = sqlx::query_as::<_, GraphNode>(
		"\
INSERT INTO graph_nodes (node_id, label, attrs)
VALUES ($1, $2, $3)
ON CONFLICT (node_id) DO UPDATE
SET
	label = EXCLUDED.label,
	attrs = EXCLUDED.attrs,
	updated_at = now()
RETURNING node_id, label, attrs, created_at, updated_at",
	)
	.bind(node_id)
	.bind(label)
	.bind(attrs)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

/// Inserts an edge if it does not exist yet. Returns whether a row was added.
pub async fn upsert_edge<'e, E>(
	executor: E,
	src_id: &str,
	edge_type: &str,
	dst_id: &str,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO graph_edges (src_id, edge_type, dst_id)
VALUES ($1, $2, $3)
ON CONFLICT (src_id, edge_type, dst_id) DO NOTHING",
	)
	.bind(src_id)
	.bind(edge_type)
	.bind(dst_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn get_node<'e, E>(executor: E, node_id: &str) -> Result<Option<GraphNode>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, GraphNode>(
		"\
SELECT node_id, label, attrs, created_at, updated_at
FROM graph_nodes
WHERE node_id = $1",
	)
	.bind(node_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Edges touching `node_id` in either direction, optionally restricted to one edge type.
pub async fn neighbors<'e, E>(
	executor: E,
	node_id: &str,
	edge_type: Option<&str>,
) -> Result<Vec<GraphEdge>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, GraphEdge>(
		"\
SELECT src_id, edge_type, dst_id, created_at
FROM graph_edges
WHERE (src_id = $1 OR dst_id = $1)
	AND ($2::text IS NULL OR edge_type = $2)
ORDER BY created_at ASC, src_id ASC, dst_id ASC",
	)
	.bind(node_id)
	.bind(edge_type)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
