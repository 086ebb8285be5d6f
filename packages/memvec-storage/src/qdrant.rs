use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		CreateCollectionBuilder, Distance, GetPointsBuilder, PointId, PointStruct, PointsIdsList,
		Query, QueryPointsBuilder, SetPayloadPointsBuilder, UpsertPointsBuilder, Value as QValue,
		VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// A point read back from the collection, with its payload converted to JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredPoint {
	pub id: u64,
	pub score: Option<f32>,
	pub payload: Map<String, Value>,
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &memvec_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection with a single unnamed cosine vector when it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert(
		&self,
		id: u64,
		vector: Vec<f32>,
		payload: &Map<String, Value>,
	) -> Result<()> {
		self.check_dim(&vector)?;

		let point = PointStruct::new(id, vector, to_payload(payload));

		self.client
			.upsert_points(
				UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
			)
			.await?;

		Ok(())
	}

	pub async fn retrieve(&self, id: u64) -> Result<Option<StoredPoint>> {
		let response = self
			.client
			.get_points(
				GetPointsBuilder::new(self.collection.clone(), vec![PointId::from(id)])
					.with_payload(true),
			)
			.await?;

		Ok(response.result.into_iter().find_map(|point| {
			let id = point.id.as_ref().and_then(point_id_to_u64)?;

			Some(StoredPoint { id, score: None, payload: from_payload(point.payload) })
		}))
	}

	/// Nearest neighbours by cosine similarity, best first, dropping hits below `min_score`.
	pub async fn search(
		&self,
		vector: Vec<f32>,
		limit: u64,
		min_score: Option<f32>,
	) -> Result<Vec<StoredPoint>> {
		self.check_dim(&vector)?;

		let mut builder = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(limit);

		if let Some(min_score) = min_score {
			builder = builder.score_threshold(min_score);
		}

		let response = self.client.query(builder).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| {
				let id = point.id.as_ref().and_then(point_id_to_u64)?;
				let payload = from_payload(point.payload);

				Some(StoredPoint { id, score: Some(point.score), payload })
			})
			.collect())
	}

	pub async fn set_payload(&self, id: u64, field: &str, value: Value) -> Result<()> {
		let mut payload = Payload::new();

		payload.insert(field, value);

		self.client
			.set_payload(
				SetPayloadPointsBuilder::new(self.collection.clone(), payload)
					.points_selector(PointsIdsList { ids: vec![PointId::from(id)] })
					.wait(true),
			)
			.await?;

		Ok(())
	}

	fn check_dim(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"vector has {} dimensions, collection {} expects {}",
				vector.len(),
				self.collection,
				self.vector_dim
			)));
		}

		Ok(())
	}
}

pub fn point_id_to_u64(point_id: &PointId) -> Option<u64> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(id)) => Some(*id),
		_ => None,
	}
}

fn to_payload(map: &Map<String, Value>) -> Payload {
	let mut payload = Payload::new();

	for (key, value) in map {
		payload.insert(key.as_str(), value.clone());
	}

	payload
}

fn from_payload(payload: HashMap<String, QValue>) -> Map<String, Value> {
	payload.into_iter().map(|(key, value)| (key, qdrant_value_to_json(value))).collect()
}

pub fn qdrant_value_to_json(value: QValue) -> Value {
	match value.kind {
		None | Some(Kind::NullValue(_)) => Value::Null,
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => Value::from(number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null),
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(
			object
				.fields
				.into_iter()
				.map(|(key, inner)| (key, qdrant_value_to_json(inner)))
				.collect(),
		),
	}
}
