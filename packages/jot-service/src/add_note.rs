use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use jot_domain::tags;
use jot_storage::{models::NewNote, queries};

use crate::{Error, NoteResponse, NoteService, ServiceResult};

/// Tags arrive either as one comma-separated string or as a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
	Text(String),
	List(Vec<String>),
}
impl TagsInput {
	pub fn normalize(&self) -> Vec<String> {
		match self {
			Self::Text(raw) => tags::parse(raw),
			Self::List(items) => tags::normalize(items),
		}
	}

	/// Storage form; `None` when nothing survives normalization.
	pub fn to_stored(&self) -> Option<String> {
		tags::join(&self.normalize())
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
	pub title: Option<String>,
	pub content: Option<String>,
	#[serde(default)]
	pub language: Option<String>,
	#[serde(default)]
	pub tags: Option<TagsInput>,
	#[serde(default)]
	pub scheduled_at: Option<String>,
	#[serde(default)]
	pub translate: bool,
	/// Overrides the note language as translation target.
	#[serde(default)]
	pub target_language: Option<String>,
}

impl NoteService {
	pub async fn create_note(&self, req: CreateNoteRequest) -> ServiceResult<NoteResponse> {
		let (Some(title), Some(content)) = (req.title, req.content) else {
			return Err(Error::InvalidRequest {
				message: "title and content are required.".to_string(),
			});
		};

		crate::require_title(&title)?;

		let draft = NewNote {
			title,
			content,
			language: crate::non_blank(req.language),
			tags: req.tags.as_ref().and_then(TagsInput::to_stored),
			scheduled_at: crate::parse_schedule(req.scheduled_at.as_deref())?,
			request_translation: req.translate,
		};
		let note = queries::insert_note(&self.db, &draft, OffsetDateTime::now_utc()).await?;

		tracing::info!(note_id = note.id, translate = req.translate, "Note created.");

		if !req.translate {
			return note.try_into();
		}

		let enqueued = self
			.queue
			.reserve(note.id)
			.map_err(Error::from)
			.and_then(|reservation| {
				self.submit_translation(reservation, &note, req.target_language.as_deref())
			});

		match enqueued {
			Ok(()) => note.try_into(),
			Err(err) => self.abandon_translation(note.id, &err).await?.try_into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tags_accept_string_or_list() {
		let text: TagsInput = serde_json::from_str("\"a, b ,  c\"").expect("string form");
		let list: TagsInput = serde_json::from_str("[\"a\", \" b \", \"\", \"a\"]").expect("list form");

		assert_eq!(text.normalize(), vec!["a", "b", "c"]);
		assert_eq!(list.normalize(), vec!["a", "b"]);
		assert_eq!(TagsInput::Text(" , ".to_string()).to_stored(), None);
	}
}
