pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Unknown translation status {value:?}.")]
	UnknownStatus { value: String },
	#[error("Timestamp {value:?} is not ISO-8601.")]
	InvalidTimestamp { value: String },
}
