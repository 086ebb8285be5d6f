use sqlx::PgExecutor;

use crate::{
	Error, Result,
	models::{Event, Memory, NewEvent, NewMemory},
};

const MEMORY_COLUMNS: &str = "\
id,
	type,
	scope,
	key,
	value,
	confidence,
	assertion_count,
	decay,
	superseded_by_memory_id,
	source_event_id,
	created_at";

pub async fn insert_event<'e, E>(executor: E, event: &NewEvent) -> Result<Event>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Event>(
		"\
INSERT INTO events (actor_type, actor_id, text, payload)
VALUES ($1, $2, $3, $4)
RETURNING id, actor_type, actor_id, text, payload, created_at",
	)
	.bind(event.actor_type.as_str())
	.bind(event.actor_id.as_str())
	.bind(event.text.as_str())
	.bind(&event.payload)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

pub async fn get_event<'e, E>(executor: E, event_id: i64) -> Result<Option<Event>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Event>(
		"\
SELECT id, actor_type, actor_id, text, payload, created_at
FROM events
WHERE id = $1",
	)
	.bind(event_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn insert_memory<'e, E>(executor: E, memory: &NewMemory) -> Result<Memory>
where
	E: PgExecutor<'e>,
{
	if memory.key.trim().is_empty() {
		return Err(Error::InvalidArgument("memory key must not be blank".to_string()));
	}
	if !(0.0..=1.0).contains(&memory.confidence) {
		return Err(Error::InvalidArgument(format!(
			"memory confidence {} is outside 0.0-1.0",
			memory.confidence
		)));
	}

	let sql = format!(
		"\
INSERT INTO memories (type, scope, key, value, confidence, assertion_count, source_event_id)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING
	{MEMORY_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Memory>(&sql)
		.bind(memory.memory_type.as_str())
		.bind(memory.scope.as_str())
		.bind(memory.key.as_str())
		.bind(&memory.value)
		.bind(memory.confidence)
		.bind(memory.assertion_count)
		.bind(memory.source_event_id)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

pub async fn get_memory<'e, E>(executor: E, memory_id: i64) -> Result<Option<Memory>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
	{MEMORY_COLUMNS}
FROM memories
WHERE id = $1"
	);
	let row = sqlx::query_as::<_, Memory>(&sql).bind(memory_id).fetch_optional(executor).await?;

	Ok(row)
}

/// Adds one assertion in a single statement. Returns `None` when the memory no longer exists.
pub async fn increment_assertion_count<'e, E>(executor: E, memory_id: i64) -> Result<Option<Memory>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE memories
SET assertion_count = assertion_count + 1
WHERE id = $1
RETURNING
	{MEMORY_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Memory>(&sql).bind(memory_id).fetch_optional(executor).await?;

	Ok(row)
}

/// Lists memories newest first, optionally narrowed by scope and type.
pub async fn list_memories<'e, E>(
	executor: E,
	scope: Option<&str>,
	memory_type: Option<&str>,
	limit: i64,
) -> Result<Vec<Memory>>
where
	E: PgExecutor<'e>,
{
	if limit <= 0 {
		return Err(Error::InvalidArgument("limit must be greater than zero".to_string()));
	}

	let sql = format!(
		"\
SELECT
	{MEMORY_COLUMNS}
FROM memories
WHERE ($1::text IS NULL OR scope = $1)
	AND ($2::text IS NULL OR type = $2)
ORDER BY id DESC
LIMIT $3"
	);
	let rows = sqlx::query_as::<_, Memory>(&sql)
		.bind(scope)
		.bind(memory_type)
		.bind(limit)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

/// Keyset page over all memories in ascending id order, used by projection rebuilds.
pub async fn list_memories_after<'e, E>(
	executor: E,
	after_id: i64,
	batch_size: i64,
) -> Result<Vec<Memory>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
	{MEMORY_COLUMNS}
FROM memories
WHERE id > $1
ORDER BY id ASC
LIMIT $2"
	);
	let rows = sqlx::query_as::<_, Memory>(&sql)
		.bind(after_id)
		.bind(batch_size)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

pub async fn list_memories_for_event<'e, E>(executor: E, event_id: i64) -> Result<Vec<Memory>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
	{MEMORY_COLUMNS}
FROM memories
WHERE source_event_id = $1
ORDER BY id ASC"
	);
	let rows = sqlx::query_as::<_, Memory>(&sql).bind(event_id).fetch_all(executor).await?;

	Ok(rows)
}
