use serde::{Deserialize, Serialize};

use jot_domain::tags;

use crate::{Error, NoteService, ServiceResult};

const DEFAULT_GENERATE_LANGUAGE: &str = "en";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateNoteRequest {
	pub prompt: Option<String>,
	#[serde(default)]
	pub language: Option<String>,
}

/// A drafted note. Nothing is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateNoteResponse {
	pub title: Option<String>,
	pub content: String,
	pub tags: Vec<String>,
	pub scheduled_at: Option<String>,
}

impl NoteService {
	pub async fn generate_note(&self, req: GenerateNoteRequest) -> ServiceResult<GenerateNoteResponse> {
		let Some(prompt) = crate::non_blank(req.prompt) else {
			return Err(Error::InvalidRequest { message: "prompt is required.".to_string() });
		};
		let language = crate::non_blank(req.language)
			.unwrap_or_else(|| DEFAULT_GENERATE_LANGUAGE.to_string());
		let generated = self.adapter()?.generate_note(&prompt, &language).await?;

		Ok(GenerateNoteResponse {
			title: generated.title,
			content: generated.content,
			tags: tags::normalize(&generated.tags),
			scheduled_at: generated.scheduled_at,
		})
	}
}
