use time::OffsetDateTime;

use jot_domain::Transition;

use crate::{
	Error, Result,
	db::Db,
	models::{NewNote, Note, NoteChanges},
};

const ORDER_BY_RECENT: &str = "ORDER BY julianday(updated_at) DESC, id DESC";

pub async fn insert_note(db: &Db, note: &NewNote, now: OffsetDateTime) -> Result<Note> {
	let status = note.request_translation.then(|| Transition::Request.target().as_str());
	let row = sqlx::query_as::<_, Note>(
		"\
INSERT INTO notes (
	title,
	content,
	language,
	tags,
	translation_status,
	scheduled_at,
	created_at,
	updated_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
RETURNING *",
	)
	.bind(note.title.as_str())
	.bind(note.content.as_str())
	.bind(note.language.as_deref())
	.bind(note.tags.as_deref())
	.bind(status)
	.bind(note.scheduled_at)
	.bind(now)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

pub async fn get_note(db: &Db, id: i64) -> Result<Option<Note>> {
	let row = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ?1")
		.bind(id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

/// Most recently updated first; ties resolve to the newest id.
pub async fn list_notes(db: &Db) -> Result<Vec<Note>> {
	let sql = format!("SELECT * FROM notes {ORDER_BY_RECENT}");
	let rows = sqlx::query_as::<_, Note>(&sql).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Case-sensitive substring match on title or content.
pub async fn search_notes(db: &Db, needle: &str) -> Result<Vec<Note>> {
	let sql = format!(
		"SELECT * FROM notes WHERE instr(title, ?1) > 0 OR instr(content, ?1) > 0 {ORDER_BY_RECENT}"
	);
	let rows = sqlx::query_as::<_, Note>(&sql).bind(needle).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Applies `changes` in one statement. With `request_translation` set, the update only happens
/// while no translation is pending or in progress, otherwise [`Error::Conflict`].
pub async fn update_note(
	db: &Db,
	id: i64,
	changes: &NoteChanges,
	now: OffsetDateTime,
) -> Result<Note> {
	let sql = format!(
		"\
UPDATE notes
SET
	title = COALESCE(?1, title),
	content = COALESCE(?2, content),
	language = CASE WHEN ?3 THEN ?4 ELSE language END,
	tags = CASE WHEN ?5 THEN ?6 ELSE tags END,
	scheduled_at = CASE WHEN ?7 THEN ?8 ELSE scheduled_at END,
	translation_status = CASE WHEN ?9 THEN '{pending}' ELSE translation_status END,
	translated_title = CASE WHEN ?9 THEN NULL ELSE translated_title END,
	translated_content = CASE WHEN ?9 THEN NULL ELSE translated_content END,
	updated_at = ?10
WHERE id = ?11 AND (NOT ?9 OR {allowed})
RETURNING *",
		pending = Transition::Request.target().as_str(),
		allowed = status_condition(Transition::Request),
	);
	let row = sqlx::query_as::<_, Note>(&sql)
		.bind(changes.title.as_deref())
		.bind(changes.content.as_deref())
		.bind(changes.language.is_some())
		.bind(changes.language.clone().flatten())
		.bind(changes.tags.is_some())
		.bind(changes.tags.clone().flatten())
		.bind(changes.scheduled_at.is_some())
		.bind(changes.scheduled_at.flatten())
		.bind(changes.request_translation)
		.bind(now)
		.bind(id)
		.fetch_optional(&db.pool)
		.await?;

	if let Some(note) = row {
		return Ok(note);
	}

	match get_note(db, id).await? {
		Some(_) => Err(Error::Conflict(format!("Note {id} already has a translation in flight."))),
		None => Err(Error::NotFound(format!("Note {id} does not exist."))),
	}
}

pub async fn delete_note(db: &Db, id: i64) -> Result<bool> {
	let result = sqlx::query("DELETE FROM notes WHERE id = ?1").bind(id).execute(&db.pool).await?;

	Ok(result.rows_affected() > 0)
}

/// `pending` to `in_progress`. `None` when the note is gone or no longer pending.
pub async fn claim_translation(db: &Db, id: i64, now: OffsetDateTime) -> Result<Option<Note>> {
	let sql = format!(
		"\
UPDATE notes
SET translation_status = ?1, updated_at = ?2
WHERE id = ?3 AND {}
RETURNING *",
		status_condition(Transition::Claim),
	);
	let row = sqlx::query_as::<_, Note>(&sql)
		.bind(Transition::Claim.target().as_str())
		.bind(now)
		.bind(id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(row)
}

/// Stores the translated fields together with `completed`. `false` when the note moved on.
pub async fn complete_translation(
	db: &Db,
	id: i64,
	translated_title: &str,
	translated_content: &str,
	now: OffsetDateTime,
) -> Result<bool> {
	let sql = format!(
		"\
UPDATE notes
SET
	translation_status = ?1,
	translated_title = ?2,
	translated_content = ?3,
	updated_at = ?4
WHERE id = ?5 AND {}",
		status_condition(Transition::Complete),
	);
	let result = sqlx::query(&sql)
		.bind(Transition::Complete.target().as_str())
		.bind(translated_title)
		.bind(translated_content)
		.bind(now)
		.bind(id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn fail_translation(db: &Db, id: i64, now: OffsetDateTime) -> Result<bool> {
	apply_status(db, id, Transition::Fail, now).await
}

/// Forced failure for a task whose claim never went through.
pub async fn abandon_translation(db: &Db, id: i64, now: OffsetDateTime) -> Result<bool> {
	apply_status(db, id, Transition::Abandon, now).await
}

/// Fails every attempt a previous process left `pending` or `in_progress`. Returns the count.
pub async fn fail_stranded_translations(db: &Db, now: OffsetDateTime) -> Result<u64> {
	let sql = format!(
		"UPDATE notes SET translation_status = ?1, updated_at = ?2 WHERE {}",
		status_condition(Transition::Recover),
	);
	let result = sqlx::query(&sql)
		.bind(Transition::Recover.target().as_str())
		.bind(now)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected())
}

async fn apply_status(
	db: &Db,
	id: i64,
	transition: Transition,
	now: OffsetDateTime,
) -> Result<bool> {
	let sql = format!(
		"UPDATE notes SET translation_status = ?1, updated_at = ?2 WHERE id = ?3 AND {}",
		status_condition(transition),
	);
	let result = sqlx::query(&sql)
		.bind(transition.target().as_str())
		.bind(now)
		.bind(id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() == 1)
}

/// SQL predicate matching the statuses `transition` may start from.
fn status_condition(transition: Transition) -> String {
	let mut absent = false;
	let mut allowed = Vec::new();

	for source in transition.sources() {
		match source {
			None => absent = true,
			Some(status) => allowed.push(format!("'{}'", status.as_str())),
		}
	}

	let mut clauses = Vec::new();

	if absent {
		clauses.push("translation_status IS NULL".to_string());
	}
	if !allowed.is_empty() {
		clauses.push(format!("translation_status IN ({})", allowed.join(", ")));
	}

	format!("({})", clauses.join(" OR "))
}
