use time::{
	Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
	macros::format_description,
};

use crate::{Error, Result};

/// Parses a `scheduled_at` value. Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
	let value = raw.trim();

	if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
		return Ok(ts);
	}

	let naive_formats = [
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
		format_description!("[year]-[month]-[day]T[hour]:[minute]"),
		format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
		format_description!("[year]-[month]-[day] [hour]:[minute]"),
	];

	for format in naive_formats {
		if let Ok(ts) = PrimitiveDateTime::parse(value, format) {
			return Ok(ts.assume_utc());
		}
	}

	if let Ok(date) = Date::parse(value, format_description!("[year]-[month]-[day]")) {
		return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
	}

	Err(Error::InvalidTimestamp { value: raw.to_string() })
}
