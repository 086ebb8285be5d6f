use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub memory: Memory,
	#[serde(default)]
	pub actors: Actors,
	#[serde(default)]
	pub graph: Graph,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Optional. Local runtimes such as Ollama accept unauthenticated requests.
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	/// Wire format of the chat endpoint, either "openai" or "ollama".
	#[serde(default = "default_llm_protocol")]
	pub protocol: String,
	#[serde(default = "default_llm_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Memory {
	/// When false, every non-empty event yields a single low-confidence episode instead of an
	/// extraction call.
	#[serde(default = "default_true")]
	pub use_llm_qualifier: bool,
	#[serde(default = "default_dup_min_score")]
	pub dup_min_score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Actors {
	pub user_actor: String,
	pub system_actor: String,
	pub system_actor_id: String,
}
impl Default for Actors {
	fn default() -> Self {
		Self {
			user_actor: "user".to_string(),
			system_actor: "system".to_string(),
			system_actor_id: "memvec".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Graph {
	pub entity_vocabulary: Vec<EntityTerm>,
}
impl Default for Graph {
	fn default() -> Self {
		let entity_vocabulary = [
			("qdrant", "tool"),
			("fastapi", "tool"),
			("sqlalchemy", "library"),
			("ollama", "runtime"),
			("qwen", "llm"),
			("knowledge graph", "concept"),
		]
		.into_iter()
		.map(|(name, entity_type)| EntityTerm {
			name: name.to_string(),
			entity_type: entity_type.to_string(),
		})
		.collect();

		Self { entity_vocabulary }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct EntityTerm {
	pub name: String,
	pub entity_type: String,
}

fn default_llm_protocol() -> String {
	"openai".to_string()
}

fn default_llm_timeout_ms() -> u64 {
	30_000
}

fn default_dup_min_score() -> f32 {
	0.95
}

fn default_true() -> bool {
	true
}
