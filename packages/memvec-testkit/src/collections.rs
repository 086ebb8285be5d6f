use std::time::Duration;

use qdrant_client::Qdrant;
use tokio::time;

use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Deletes test collections that still exist. Without `MEMVEC_QDRANT_URL` there is nothing
/// to reach, so the call is a no-op.
pub(crate) async fn delete_all(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = crate::env_qdrant_url() else {
		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;
	let mut leaked = Vec::new();

	for collection in collections {
		let exists = time::timeout(REQUEST_TIMEOUT, client.collection_exists(collection.clone()))
			.await
			.map_err(|_| Error::Message(format!("Timed out checking {collection}.")))??;

		if !exists {
			continue;
		}

		match time::timeout(REQUEST_TIMEOUT, client.delete_collection(collection.clone())).await {
			Ok(Ok(_)) => {},
			Ok(Err(err)) => leaked.push(format!("{collection}: {err}")),
			Err(_) => leaked.push(format!("{collection}: timed out")),
		}
	}

	if leaked.is_empty() {
		Ok(())
	} else {
		Err(Error::Message(format!("Could not delete collections: {}.", leaked.join("; "))))
	}
}
