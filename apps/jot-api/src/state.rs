use std::sync::Arc;

use time::OffsetDateTime;

use jot_config::Translation;
use jot_providers::{LlmAdapter, RetryPolicy};
use jot_service::NoteService;
use jot_storage::{db::Db, queries};
use jot_worker::{TranslationQueue, TranslationWorker};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NoteService>,
	pub worker: Arc<TranslationWorker>,
}
impl AppState {
	pub async fn new(config: jot_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage).await?;

		db.ensure_schema().await?;

		let stranded = queries::fail_stranded_translations(&db, OffsetDateTime::now_utc()).await?;

		if stranded > 0 {
			tracing::warn!(stranded, "Marked translations interrupted by a previous run as failed.");
		}

		let retry = RetryPolicy::from_config(&config.translation);
		let adapter = match LlmAdapter::new(config.providers.llm, retry) {
			Ok(adapter) => Some(Arc::new(adapter)),
			Err(jot_providers::Error::MissingCredential) => {
				tracing::warn!("LLM API key is not configured. Generation and translation are disabled.");

				None
			},
			Err(err) => return Err(err.into()),
		};

		Ok(Self::from_parts(config.translation, db, adapter))
	}

	/// Wires the queue, worker and service around an already prepared store. The worker is
	/// not started.
	pub fn from_parts(cfg: Translation, db: Db, adapter: Option<Arc<LlmAdapter>>) -> Self {
		let (queue, receiver) = TranslationQueue::new();
		let worker = TranslationWorker::new(db.clone(), adapter.clone(), receiver, &cfg);
		let service = NoteService::new(cfg, db, queue, adapter);

		Self { service: Arc::new(service), worker: Arc::new(worker) }
	}
}
