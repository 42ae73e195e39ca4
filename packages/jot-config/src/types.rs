use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub translation: Translation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	/// SQLite connection string, e.g. `sqlite://database/app.db` or `sqlite::memory:`.
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Blank means "not configured"; the LLM adapter is then never constructed.
	#[serde(default)]
	pub api_key: String,
	/// Environment variable consulted when `api_key` is blank.
	#[serde(default)]
	pub api_key_env: Option<String>,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Translation {
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	/// Pause after an error escapes a worker iteration, and before a panicked worker restarts.
	pub error_pause_ms: u64,
	pub default_target_language: String,
}
impl Default for Translation {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			initial_backoff_ms: 1_000,
			error_pause_ms: 1_000,
			default_target_language: "en".to_string(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
