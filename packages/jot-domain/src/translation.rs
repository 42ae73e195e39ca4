use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Translation sub-state of a note. "Absent" is modelled as `Option::None` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
	Pending,
	InProgress,
	Completed,
	Failed,
}
impl TranslationStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::InProgress => "in_progress",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}
}
impl fmt::Display for TranslationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for TranslationStatus {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value {
			"pending" => Ok(Self::Pending),
			"in_progress" => Ok(Self::InProgress),
			"completed" => Ok(Self::Completed),
			"failed" => Ok(Self::Failed),
			other => Err(Error::UnknownStatus { value: other.to_string() }),
		}
	}
}

/// The only status moves a translation attempt may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	/// A new request starts an attempt.
	Request,
	/// The worker picked the task up.
	Claim,
	Complete,
	Fail,
	/// Forced failure when the worker could not even claim the task.
	Abandon,
	/// Startup sweep of attempts whose task was lost with the previous process.
	Recover,
}
impl Transition {
	pub const fn target(self) -> TranslationStatus {
		match self {
			Self::Request => TranslationStatus::Pending,
			Self::Claim => TranslationStatus::InProgress,
			Self::Complete => TranslationStatus::Completed,
			Self::Fail | Self::Abandon | Self::Recover => TranslationStatus::Failed,
		}
	}

	/// Statuses this transition may start from. `None` stands for "absent".
	pub const fn sources(self) -> &'static [Option<TranslationStatus>] {
		match self {
			Self::Request => &[
				None,
				Some(TranslationStatus::Failed),
				Some(TranslationStatus::Completed),
			],
			Self::Claim | Self::Abandon => &[Some(TranslationStatus::Pending)],
			Self::Complete | Self::Fail => &[Some(TranslationStatus::InProgress)],
			Self::Recover =>
				&[Some(TranslationStatus::Pending), Some(TranslationStatus::InProgress)],
		}
	}
}

pub fn parse_stored(value: Option<&str>) -> Result<Option<TranslationStatus>> {
	value.map(str::parse).transpose()
}
