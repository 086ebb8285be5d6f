use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use memvec_service::{
	Error, EventRecord, GraphEdgeRecord, GraphNodeRecord, IngestEventRequest, IngestEventResponse,
	ListMemoriesRequest, MemoryRecord, MessageRequest, MessageResponse, ProcessReport,
	RebuildGraphReport, RebuildIndexReport,
};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct NeighborsQuery {
	edge_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Provider { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Internal error.")
			},
			Error::Qdrant { message } => {
				tracing::error!(error = %message, "Qdrant request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "QDRANT_ERROR", "Internal error.")
			},
			Error::Graph { message } => {
				tracing::error!(error = %message, "Graph request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "GRAPH_ERROR", "Internal error.")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/events", post(ingest_event))
		.route("/v1/events/{event_id}", get(get_event))
		.route("/v1/events/{event_id}/process", post(process_event))
		.route("/v1/memories", get(list_memories))
		.route("/v1/memories/{memory_id}", get(get_memory))
		.route("/v1/graph/nodes/{node_id}", get(get_node))
		.route("/v1/graph/neighbors/{node_id}", get(neighbors))
		.route("/v1/messages", post(handle_message))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/rebuild_index", post(rebuild_index))
		.route("/v1/admin/rebuild_graph", post(rebuild_graph))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ingest_event(
	State(state): State<AppState>,
	Json(payload): Json<IngestEventRequest>,
) -> Result<(StatusCode, Json<IngestEventResponse>), ApiError> {
	let response = state.service.ingest_event(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_event(
	State(state): State<AppState>,
	Path(event_id): Path<i64>,
) -> Result<Json<EventRecord>, ApiError> {
	Ok(Json(state.service.get_event(event_id).await?))
}

async fn process_event(
	State(state): State<AppState>,
	Path(event_id): Path<i64>,
) -> Result<Json<ProcessReport>, ApiError> {
	Ok(Json(state.service.process_event(event_id).await?))
}

async fn list_memories(
	State(state): State<AppState>,
	Query(query): Query<ListMemoriesRequest>,
) -> Result<Json<Vec<MemoryRecord>>, ApiError> {
	Ok(Json(state.service.list_memories(query).await?))
}

async fn get_memory(
	State(state): State<AppState>,
	Path(memory_id): Path<i64>,
) -> Result<Json<MemoryRecord>, ApiError> {
	Ok(Json(state.service.get_memory(memory_id).await?))
}

async fn get_node(
	State(state): State<AppState>,
	Path(node_id): Path<String>,
) -> Result<Json<GraphNodeRecord>, ApiError> {
	Ok(Json(state.service.get_node(&node_id).await?))
}

async fn neighbors(
	State(state): State<AppState>,
	Path(node_id): Path<String>,
	Query(query): Query<NeighborsQuery>,
) -> Result<Json<Vec<GraphEdgeRecord>>, ApiError> {
	Ok(Json(state.service.neighbors(&node_id, query.edge_type.as_deref()).await?))
}

async fn handle_message(
	State(state): State<AppState>,
	Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
	Ok(Json(state.service.handle_message(payload).await?))
}

async fn rebuild_index(
	State(state): State<AppState>,
) -> Result<Json<RebuildIndexReport>, ApiError> {
	Ok(Json(state.service.rebuild_index().await?))
}

async fn rebuild_graph(
	State(state): State<AppState>,
) -> Result<Json<RebuildGraphReport>, ApiError> {
	Ok(Json(state.service.rebuild_graph().await?))
}
