pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<jot_storage::Error> for Error {
	fn from(err: jot_storage::Error) -> Self {
		match err {
			jot_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			jot_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			jot_storage::Error::NotFound(message) => Self::NotFound { message },
			jot_storage::Error::Conflict(message) => Self::Conflict { message },
			jot_storage::Error::Domain(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}
impl From<jot_providers::Error> for Error {
	fn from(err: jot_providers::Error) -> Self {
		match err {
			jot_providers::Error::MissingCredential | jot_providers::Error::InvalidConfig { .. } =>
				Self::Configuration { message: err.to_string() },
			_ => Self::Provider { message: err.to_string() },
		}
	}
}
impl From<jot_worker::Error> for Error {
	fn from(err: jot_worker::Error) -> Self {
		match err {
			jot_worker::Error::AlreadyInFlight { .. } => Self::Conflict { message: err.to_string() },
			jot_worker::Error::Storage(inner) => inner.into(),
			jot_worker::Error::Provider(inner) => inner.into(),
			jot_worker::Error::ReservationMismatch { .. }
			| jot_worker::Error::QueueClosed
			| jot_worker::Error::AdapterUnavailable => Self::Configuration { message: err.to_string() },
		}
	}
}
impl From<jot_domain::Error> for Error {
	fn from(err: jot_domain::Error) -> Self {
		match err {
			jot_domain::Error::InvalidTimestamp { .. } =>
				Self::InvalidRequest { message: err.to_string() },
			jot_domain::Error::UnknownStatus { .. } => Self::Storage { message: err.to_string() },
		}
	}
}
