pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("LLM provider api_key is not configured.")]
	MissingCredential,
	#[error("{message}")]
	InvalidConfig { message: String },
	/// Timeouts, connection failures, 429/5xx and unusable response envelopes.
	#[error("{message}")]
	Transient { message: String },
	#[error("{message}")]
	Rejected { message: String },
	#[error("{operation} failed after {attempts} attempts: {last_error}")]
	Exhausted { operation: &'static str, attempts: u32, last_error: String },
}
impl Error {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient { .. })
	}
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_builder() {
			return Self::InvalidConfig { message: err.to_string() };
		}

		let transient = match err.status() {
			Some(status) => status.is_server_error() || status.as_u16() == 429,
			None => true,
		};

		if transient {
			Self::Transient { message: err.to_string() }
		} else {
			Self::Rejected { message: err.to_string() }
		}
	}
}
impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}
impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}
