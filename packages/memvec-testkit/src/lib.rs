//! Throwaway Postgres databases and Qdrant collections for integration tests.

mod collections;
mod config;
mod database;
mod error;

pub use config::{test_config, test_embedding_config, test_llm_config};
pub use database::TestDatabase;
pub use error::{Error, Result};

use std::{env, future::Future};

pub const PG_DSN_VAR: &str = "MEMVEC_PG_DSN";
pub const QDRANT_URL_VAR: &str = "MEMVEC_QDRANT_URL";

pub fn env_dsn() -> Option<String> {
	non_empty_var(PG_DSN_VAR)
}

pub fn env_qdrant_url() -> Option<String> {
	non_empty_var(QDRANT_URL_VAR)
}

/// Runs `f` against a fresh database and drops it afterwards, even when `f` fails.
///
/// A cleanup error only surfaces when `f` itself succeeded.
pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let test_db = TestDatabase::new(base_dsn).await?;
	let outcome = f(&test_db).await;
	let teardown = test_db.cleanup().await;

	match (outcome, teardown) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(err)) => Err(err),
		(Err(err), teardown) => {
			if let Err(cleanup_err) = teardown {
				eprintln!("Ignoring test database teardown error: {cleanup_err}.");
			}

			Err(err)
		},
	}
}

fn non_empty_var(name: &str) -> Option<String> {
	env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
