pub mod add_note;
pub mod delete;
pub mod generate;
pub mod list;
pub mod notes;
pub mod time_serde;
pub mod translate;
pub mod update;

mod error;

pub use add_note::{CreateNoteRequest, TagsInput};
pub use error::{Error, Result};
pub use generate::{GenerateNoteRequest, GenerateNoteResponse};
pub use notes::NoteResponse;
pub use translate::{TranslateRequest, TranslateResponse};
pub use update::UpdateNoteRequest;

use std::sync::Arc;

use time::OffsetDateTime;

use jot_config::Translation;
use jot_providers::LlmAdapter;
use jot_storage::{db::Db, models::Note, queries};
use jot_worker::{Reservation, TranslationQueue, TranslationTask};

pub type ServiceResult<T> = Result<T, Error>;

/// Request handlers over the note store, the translation queue and the LLM adapter.
pub struct NoteService {
	pub cfg: Translation,
	pub db: Db,
	pub queue: TranslationQueue,
	/// `None` when no credential is configured.
	pub adapter: Option<Arc<LlmAdapter>>,
}
impl NoteService {
	pub fn new(
		cfg: Translation,
		db: Db,
		queue: TranslationQueue,
		adapter: Option<Arc<LlmAdapter>>,
	) -> Self {
		Self { cfg, db, queue, adapter }
	}

	pub(crate) fn adapter(&self) -> Result<&LlmAdapter> {
		self.adapter.as_deref().ok_or_else(|| Error::Configuration {
			message: "LLM provider credential is not configured.".to_string(),
		})
	}

	/// Explicit request, then the note's own language, then the configured default.
	pub(crate) fn target_language(&self, requested: Option<&str>, note: Option<&str>) -> String {
		requested
			.or(note)
			.map(str::trim)
			.filter(|language| !language.is_empty())
			.unwrap_or(self.cfg.default_target_language.as_str())
			.to_string()
	}

	/// Hands a reserved note to the worker with a snapshot of its current text.
	pub(crate) fn submit_translation(
		&self,
		reservation: Reservation,
		note: &Note,
		requested_language: Option<&str>,
	) -> Result<()> {
		let task = TranslationTask {
			note_id: note.id,
			title: note.title.clone(),
			content: note.content.clone(),
			target_language: self.target_language(requested_language, note.language.as_deref()),
		};

		tracing::debug!(note_id = note.id, target_language = %task.target_language, "Translation enqueued.");

		reservation.submit(task)?;

		Ok(())
	}

	/// Marks a `pending` note failed when its task never reached the queue.
	pub(crate) async fn abandon_translation(&self, note_id: i64, cause: &Error) -> Result<Note> {
		tracing::error!(error = %cause, note_id, "Failed to enqueue translation.");
		queries::abandon_translation(&self.db, note_id, OffsetDateTime::now_utc()).await?;

		queries::get_note(&self.db, note_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Note {note_id} does not exist.") })
	}
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(crate) fn parse_schedule(raw: Option<&str>) -> Result<Option<OffsetDateTime>> {
	match raw.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => Ok(Some(jot_domain::schedule::parse_timestamp(value)?)),
		None => Ok(None),
	}
}

pub(crate) fn require_title(title: &str) -> Result<()> {
	if title.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "title must not be blank.".to_string() });
	}

	Ok(())
}
