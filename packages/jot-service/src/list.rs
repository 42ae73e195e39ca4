use jot_storage::queries;

use crate::{NoteResponse, NoteService, ServiceResult, notes};

impl NoteService {
	pub async fn list_notes(&self) -> ServiceResult<Vec<NoteResponse>> {
		notes::to_responses(queries::list_notes(&self.db).await?)
	}

	/// An empty query matches nothing.
	pub async fn search_notes(&self, query: &str) -> ServiceResult<Vec<NoteResponse>> {
		if query.is_empty() {
			return Ok(Vec::new());
		}

		notes::to_responses(queries::search_notes(&self.db, query).await?)
	}
}
