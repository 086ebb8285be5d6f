use std::{str::FromStr, sync::Mutex, thread};

use sqlx::{
	ConnectOptions, Connection,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use crate::{Error, PG_DSN_VAR, Result, collections};

// Tried in order when the DSN's own database cannot host CREATE DATABASE.
const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];

/// A uniquely named database created for one test, plus any Qdrant collections the test
/// derived from it.
///
/// Call [`TestDatabase::cleanup`] at the end of a test. If the value is dropped without it
/// (for example on a panic), teardown runs on a helper thread.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	collections: Mutex<Vec<String>>,
	torn_down: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("{PG_DSN_VAR} is not a valid DSN: {err}.")))?;
		let (maintenance, mut conn) = open_maintenance(&base).await?;
		let name = format!("memvec_t_{}", Uuid::new_v4().simple());

		sqlx::query(&format!(r#"CREATE DATABASE "{name}""#))
			.execute(&mut conn)
			.await
			.map_err(|err| Error::Message(format!("Could not create database {name}: {err}.")))?;

		let _ = conn.close().await;
		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, collections: Mutex::new(Vec::new()), torn_down: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns a collection name bound to this database and schedules it for deletion.
	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.name);
		let mut owned = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if !owned.contains(&collection) {
			owned.push(collection.clone());
		}

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let result = self.teardown().await;

		self.torn_down = true;

		result
	}

	async fn teardown(&self) -> Result<()> {
		let collections = self.owned_collections();
		let dropped = drop_database(&self.name, &self.maintenance).await;

		collections::delete_all(&collections).await?;

		dropped
	}

	fn owned_collections(&self) -> Vec<String> {
		self.collections.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.torn_down {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		let collections = self.owned_collections();
		let worker = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Could not start a runtime to drop {name}: {err}.");

					return;
				},
			};

			runtime.block_on(async {
				if let Err(err) = collections::delete_all(&collections).await {
					eprintln!("Leaked Qdrant collections for {name}: {err}.");
				}
				if let Err(err) = drop_database(&name, &maintenance).await {
					eprintln!("Leaked test database {name}: {err}.");
				}
			});
		});

		let _ = worker.join();
	}
}

async fn open_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut failures = Vec::new();

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => failures.push(format!("{database}: {err}")),
		}
	}

	Err(Error::Message(format!(
		"No maintenance database reachable ({}).",
		failures.join("; ")
	)))
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pools held by the test may still be open.
	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{name}""#))
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Could not drop database {name}: {err}.")))?;

	Ok(())
}
