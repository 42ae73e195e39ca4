pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Note {note_id} already has a translation in flight.")]
	AlreadyInFlight { note_id: i64 },
	#[error("Reservation for note {reserved} cannot carry a task for note {task}.")]
	ReservationMismatch { reserved: i64, task: i64 },
	#[error("Translation queue is closed.")]
	QueueClosed,
	#[error("Translation provider is not configured.")]
	AdapterUnavailable,
	#[error(transparent)]
	Storage(#[from] jot_storage::Error),
	#[error(transparent)]
	Provider(#[from] jot_providers::Error),
}
