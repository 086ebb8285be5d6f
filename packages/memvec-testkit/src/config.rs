use serde_json::Map;

use memvec_config::{
	Actors, Config, EmbeddingProviderConfig, Graph, LlmProviderConfig, Memory, Postgres,
	Providers, Qdrant, Service, Storage,
};

/// Config for integration tests. Provider endpoints point nowhere, so tests swap in fakes.
pub fn test_config(dsn: String, qdrant_url: String, collection: String, vector_dim: u32) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			postgres: Postgres { dsn, pool_max_conns: 4 },
			qdrant: Qdrant { url: qdrant_url, collection, vector_dim },
		},
		providers: Providers {
			embedding: test_embedding_config(vector_dim),
			llm_extractor: test_llm_config(),
		},
		memory: Memory { use_llm_qualifier: true, dup_min_score: 0.95 },
		actors: Actors::default(),
		graph: Graph::default(),
	}
}

pub fn test_embedding_config(dimensions: u32) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: None,
		path: "/v1/embeddings".to_string(),
		model: "test-embedding".to_string(),
		dimensions,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

pub fn test_llm_config() -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: None,
		path: "/v1/chat/completions".to_string(),
		model: "test-llm".to_string(),
		protocol: "openai".to_string(),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}
