mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	env, fs,
	future::Future,
	io::ErrorKind,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
	time::Duration,
};

use serde_json::Value;
use tokio::{
	sync::{Notify, Semaphore},
	time::Instant,
};
use uuid::Uuid;

use jot_config::{LlmProviderConfig, Storage, Translation};
use jot_providers::{BoxFuture, ChatMessage, CompletionProvider, CompletionRequest, RetryPolicy};

const SIDECAR_SUFFIXES: [&str; 3] = ["", "-wal", "-shm"];

/// A throwaway SQLite database file under the system temp directory.
pub struct TestDatabase {
	name: String,
	path: PathBuf,
	dsn: String,
	cleaned: bool,
}
impl TestDatabase {
	pub fn new() -> Result<Self> {
		let name = format!("jot_test_{}", Uuid::new_v4().simple());
		let path = env::temp_dir().join(format!("{name}.db"));
		let dsn = format!("sqlite://{}", path.display());

		Ok(Self { name, path, dsn, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn storage_config(&self) -> Storage {
		Storage { dsn: self.dsn.clone(), pool_max_conns: 4 }
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		remove_database_files(&self.path)?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}
		if let Err(err) = remove_database_files(&self.path) {
			eprintln!("Test database cleanup failed: {err}.");
		}
	}
}

pub async fn with_test_db<F, Fut, T>(f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let db = TestDatabase::new()?;
	let result = f(&db).await;
	let mut db = db;

	if let Err(err) = db.cleanup_inner() {
		eprintln!("Test database cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

pub fn llm_config() -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "scripted".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "test-key".to_string(),
		api_key_env: None,
		path: "/chat/completions".to_string(),
		model: "scripted-model".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

/// Translation settings with millisecond pauses so suites do not wait on real backoff.
pub fn translation_config() -> Translation {
	Translation {
		max_attempts: 3,
		initial_backoff_ms: 1,
		error_pause_ms: 10,
		default_target_language: "en".to_string(),
	}
}

pub fn retry_policy() -> RetryPolicy {
	RetryPolicy::from_config(&translation_config())
}

#[derive(Debug, Clone)]
pub enum Reply {
	Text(String),
	Transient,
	Rejected,
	Panic,
}
impl Reply {
	pub fn json(value: Value) -> Self {
		Self::Text(value.to_string())
	}
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
	pub at: Instant,
	pub messages: Vec<ChatMessage>,
}
impl RecordedCall {
	pub fn prompt(&self) -> String {
		self.messages.iter().map(|message| message.content.as_str()).collect::<Vec<_>>().join("\n")
	}
}

/// Holds gated completions until permits are released.
#[derive(Clone)]
pub struct Gate {
	permits: Arc<Semaphore>,
}
impl Gate {
	pub fn open(&self, calls: usize) {
		self.permits.add_permits(calls);
	}
}

/// Completion provider that answers from a script, then repeats a fallback reply.
pub struct ScriptedCompletion {
	script: Mutex<VecDeque<Reply>>,
	fallback: Reply,
	calls: Mutex<Vec<RecordedCall>>,
	called: Notify,
	gate: Option<Gate>,
}
impl ScriptedCompletion {
	pub fn new(fallback: Reply) -> Self {
		Self {
			script: Mutex::new(VecDeque::new()),
			fallback,
			calls: Mutex::new(Vec::new()),
			called: Notify::new(),
			gate: None,
		}
	}

	pub fn replying(text: impl Into<String>) -> Self {
		Self::new(Reply::Text(text.into()))
	}

	pub fn with_script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
		self.script.lock().unwrap_or_else(|err| err.into_inner()).extend(replies);

		self
	}

	pub fn with_gate(mut self) -> (Self, Gate) {
		let gate = Gate { permits: Arc::new(Semaphore::new(0)) };

		self.gate = Some(gate.clone());

		(self, gate)
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn prompts(&self) -> Vec<String> {
		self.calls().iter().map(RecordedCall::prompt).collect()
	}

	/// Resolves once at least `count` calls were recorded, or fails after `timeout`.
	pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> Result<()> {
		let wait = async {
			loop {
				let notified = self.called.notified();

				if self.call_count() >= count {
					return;
				}

				notified.await;
			}
		};

		tokio::time::timeout(timeout, wait).await.map_err(|_| {
			Error::Message(format!("Timed out waiting for {count} completion calls."))
		})
	}

	fn record(&self, request: &CompletionRequest) -> Reply {
		self.calls
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push(RecordedCall { at: Instant::now(), messages: request.messages.clone() });
		self.called.notify_waiters();

		self.script
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.pop_front()
			.unwrap_or_else(|| self.fallback.clone())
	}
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, jot_providers::Result<String>> {
		Box::pin(async move {
			let reply = self.record(request);

			if let Some(gate) = &self.gate {
				let permit = gate.permits.acquire().await.map_err(|err| {
					jot_providers::Error::Transient { message: err.to_string() }
				})?;

				permit.forget();
			}

			match reply {
				Reply::Text(text) => Ok(text),
				Reply::Transient => Err(jot_providers::Error::Transient {
					message: "Scripted transient failure.".to_string(),
				}),
				Reply::Rejected => Err(jot_providers::Error::Rejected {
					message: "Scripted rejection.".to_string(),
				}),
				Reply::Panic => panic!("Scripted completion panic."),
			}
		})
	}
}

fn remove_database_files(path: &Path) -> Result<()> {
	for suffix in SIDECAR_SUFFIXES {
		let mut file = path.as_os_str().to_owned();

		file.push(suffix);

		match fs::remove_file(&file) {
			Ok(()) => {},
			Err(err) if err.kind() == ErrorKind::NotFound => {},
			Err(err) => return Err(err.into()),
		}
	}

	Ok(())
}
