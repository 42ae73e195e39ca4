use time::OffsetDateTime;

use jot_domain::{TranslationStatus, tags, translation};

use crate::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Note {
	pub id: i64,
	pub title: String,
	pub content: String,
	pub language: Option<String>,
	/// Comma-joined, already normalized.
	pub tags: Option<String>,
	pub translation_status: Option<String>,
	pub translated_title: Option<String>,
	pub translated_content: Option<String>,
	pub scheduled_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Note {
	pub fn status(&self) -> Result<Option<TranslationStatus>> {
		Ok(translation::parse_stored(self.translation_status.as_deref())?)
	}

	pub fn tag_list(&self) -> Vec<String> {
		tags::split_stored(self.tags.as_deref())
	}
}

#[derive(Debug, Clone)]
pub struct NewNote {
	pub title: String,
	pub content: String,
	pub language: Option<String>,
	pub tags: Option<String>,
	pub scheduled_at: Option<OffsetDateTime>,
	/// Insert straight into `pending` when a translation is requested with the note.
	pub request_translation: bool,
}

/// Partial update. The outer `Option` means "leave unchanged", the inner one clears the column.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
	pub title: Option<String>,
	pub content: Option<String>,
	pub language: Option<Option<String>>,
	pub tags: Option<Option<String>>,
	pub scheduled_at: Option<Option<OffsetDateTime>>,
	/// Moves the note to `pending` and clears previous translated fields in the same statement.
	pub request_translation: bool,
}
