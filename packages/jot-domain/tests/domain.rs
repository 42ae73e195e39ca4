use jot_domain::{
	TranslationStatus, Transition, schedule,
	tags::{self, join, split_stored},
	translation,
};

#[test]
fn tags_survive_storage_round_trip() {
	let stored = join(&tags::parse("a, b ,  c")).expect("Expected stored tags.");

	assert_eq!(stored, "a,b,c");
	assert_eq!(split_stored(Some(stored.as_str())), vec!["a", "b", "c"]);
	assert!(split_stored(None).is_empty());
}

#[test]
fn list_entries_with_commas_are_split() {
	assert_eq!(tags::normalize(["work, urgent", "home", "work"]), vec!["work", "urgent", "home"]);
}

#[test]
fn stored_status_parses_absent_and_known_values() {
	assert_eq!(translation::parse_stored(None), Ok(None));
	assert_eq!(
		translation::parse_stored(Some("in_progress")),
		Ok(Some(TranslationStatus::InProgress))
	);
	assert!(translation::parse_stored(Some("queued")).is_err());
}

#[test]
fn in_flight_statuses_block_new_requests() {
	for status in [TranslationStatus::Pending, TranslationStatus::InProgress] {
		assert!(!Transition::Request.sources().contains(&Some(status)));
		assert!(Transition::Recover.sources().contains(&Some(status)));
	}
	for status in [TranslationStatus::Completed, TranslationStatus::Failed] {
		assert!(Transition::Request.sources().contains(&Some(status)));
		assert!(!Transition::Recover.sources().contains(&Some(status)));
	}
}

#[test]
fn forced_failures_only_touch_unsettled_attempts() {
	assert_eq!(Transition::Abandon.sources(), &[Some(TranslationStatus::Pending)]);
	assert_eq!(Transition::Abandon.target(), TranslationStatus::Failed);
	assert_eq!(Transition::Recover.target(), TranslationStatus::Failed);
	assert!(!Transition::Recover.sources().contains(&None));
}

#[test]
fn status_serializes_as_snake_case() {
	let json = serde_json::to_value(TranslationStatus::InProgress).expect("serialize");

	assert_eq!(json, serde_json::json!("in_progress"));
}

#[test]
fn schedule_rejects_unparseable_values() {
	let err = schedule::parse_timestamp("next tuesday").expect_err("Expected parse error.");

	assert!(err.to_string().contains("next tuesday"));
}
