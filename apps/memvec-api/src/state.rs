use std::sync::Arc;

use memvec_config::Config;
use memvec_service::MemvecService;
use memvec_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MemvecService>,
}
impl AppState {
	/// Connects the stores, creating the schema and the collection when missing.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		Ok(Self::from_service(MemvecService::new(config, db, qdrant)))
	}

	pub fn from_service(service: MemvecService) -> Self {
		Self { service: Arc::new(service) }
	}
}
