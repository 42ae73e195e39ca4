use time::OffsetDateTime;

use jot_domain::TranslationStatus;
use jot_storage::{models::Note, queries};

use crate::{Error, NoteService, ServiceResult};

/// Public representation of a note. Tags are served as a list.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NoteResponse {
	pub id: i64,
	pub title: String,
	pub content: String,
	pub language: Option<String>,
	pub translated_title: Option<String>,
	pub translated_content: Option<String>,
	pub translation_status: Option<TranslationStatus>,
	pub tags: Vec<String>,
	#[serde(with = "crate::time_serde::option")]
	pub scheduled_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl TryFrom<Note> for NoteResponse {
	type Error = Error;

	fn try_from(note: Note) -> ServiceResult<Self> {
		let translation_status = note.status()?;
		let tags = note.tag_list();

		Ok(Self {
			id: note.id,
			title: note.title,
			content: note.content,
			language: note.language,
			translated_title: note.translated_title,
			translated_content: note.translated_content,
			translation_status,
			tags,
			scheduled_at: note.scheduled_at,
			created_at: note.created_at,
			updated_at: note.updated_at,
		})
	}
}

impl NoteService {
	pub async fn get_note(&self, id: i64) -> ServiceResult<NoteResponse> {
		let Some(note) = queries::get_note(&self.db, id).await? else {
			return Err(Error::NotFound { message: format!("Note {id} does not exist.") });
		};

		note.try_into()
	}
}

pub(crate) fn to_responses(notes: Vec<Note>) -> ServiceResult<Vec<NoteResponse>> {
	notes.into_iter().map(NoteResponse::try_from).collect()
}
