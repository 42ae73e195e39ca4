use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;

use jot_storage::{models::NoteChanges, queries};

use crate::{NoteResponse, NoteService, ServiceResult, TagsInput};

/// Partial update. For `language`, `tags` and `scheduled_at` an explicit `null` clears the
/// field while an absent key leaves it untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default, deserialize_with = "present")]
	pub language: Option<Option<String>>,
	#[serde(default, deserialize_with = "present")]
	pub tags: Option<Option<TagsInput>>,
	#[serde(default, deserialize_with = "present")]
	pub scheduled_at: Option<Option<String>>,
	#[serde(default)]
	pub translate: bool,
	#[serde(default)]
	pub target_language: Option<String>,
}

impl NoteService {
	/// With `translate` set the note must not already be pending or in progress; the
	/// translation then runs asynchronously exactly like on create.
	pub async fn update_note(&self, id: i64, req: UpdateNoteRequest) -> ServiceResult<NoteResponse> {
		if let Some(title) = &req.title {
			crate::require_title(title)?;
		}

		let scheduled_at = match &req.scheduled_at {
			Some(raw) => Some(crate::parse_schedule(raw.as_deref())?),
			None => None,
		};
		let changes = NoteChanges {
			title: req.title,
			content: req.content,
			language: req.language.map(crate::non_blank),
			tags: req.tags.map(|tags| tags.as_ref().and_then(TagsInput::to_stored)),
			scheduled_at,
			request_translation: req.translate,
		};
		let reservation = if req.translate { Some(self.queue.reserve(id)?) } else { None };
		let note = queries::update_note(&self.db, id, &changes, OffsetDateTime::now_utc()).await?;

		tracing::info!(note_id = id, translate = req.translate, "Note updated.");

		let Some(reservation) = reservation else {
			return note.try_into();
		};

		match self.submit_translation(reservation, &note, req.target_language.as_deref()) {
			Ok(()) => note.try_into(),
			Err(err) => self.abandon_translation(id, &err).await?.try_into(),
		}
	}
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}
