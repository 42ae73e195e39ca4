use jot_storage::queries;

use crate::{Error, NoteService, ServiceResult};

impl NoteService {
	/// Hard delete. A task still queued for the note is dropped by the worker.
	pub async fn delete_note(&self, id: i64) -> ServiceResult<()> {
		if !queries::delete_note(&self.db, id).await? {
			return Err(Error::NotFound { message: format!("Note {id} does not exist.") });
		}

		tracing::info!(note_id = id, "Note deleted.");

		Ok(())
	}
}
