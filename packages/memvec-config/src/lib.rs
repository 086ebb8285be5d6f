mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Actors, Config, EmbeddingProviderConfig, EntityTerm, Graph, LlmProviderConfig, Memory,
	Postgres, Providers, Qdrant, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.qdrant.url", &cfg.storage.qdrant.url),
		("storage.qdrant.collection", &cfg.storage.qdrant.collection),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("llm_extractor", cfg.providers.llm_extractor.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if !matches!(cfg.providers.llm_extractor.protocol.as_str(), "openai" | "ollama") {
		return Err(Error::Validation {
			message: "providers.llm_extractor.protocol must be one of openai or ollama."
				.to_string(),
		});
	}
	if !cfg.memory.dup_min_score.is_finite() {
		return Err(Error::Validation {
			message: "memory.dup_min_score must be a finite number.".to_string(),
		});
	}
	if cfg.memory.dup_min_score <= 0.0 || cfg.memory.dup_min_score > 1.0 {
		return Err(Error::Validation {
			message: "memory.dup_min_score must be in the range (0.0, 1.0].".to_string(),
		});
	}

	for (label, value) in [
		("actors.user_actor", &cfg.actors.user_actor),
		("actors.system_actor", &cfg.actors.system_actor),
		("actors.system_actor_id", &cfg.actors.system_actor_id),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	for term in &cfg.graph.entity_vocabulary {
		if term.name.trim().is_empty() || term.entity_type.trim().is_empty() {
			return Err(Error::Validation {
				message: "graph.entity_vocabulary entries need a non-empty name and entity_type."
					.to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_key in
		[&mut cfg.providers.embedding.api_key, &mut cfg.providers.llm_extractor.api_key]
	{
		if api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
			*api_key = None;
		}
	}

	cfg.providers.llm_extractor.protocol =
		cfg.providers.llm_extractor.protocol.trim().to_ascii_lowercase();
	cfg.actors.user_actor = cfg.actors.user_actor.trim().to_string();
	cfg.actors.system_actor = cfg.actors.system_actor.trim().to_string();

	for term in &mut cfg.graph.entity_vocabulary {
		term.name = term.name.trim().to_lowercase();
	}
}
