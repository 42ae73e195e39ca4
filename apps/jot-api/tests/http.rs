use std::{sync::Arc, time::Duration};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::util::ServiceExt;

use jot_api::{routes, state::AppState};
use jot_config::{Config, Providers, Service};
use jot_providers::LlmAdapter;
use jot_storage::{db::Db, models::NewNote, queries};
use jot_testkit::{Reply, ScriptedCompletion, TestDatabase};

const WAIT: Duration = Duration::from_secs(10);

struct TestApp {
	_test_db: TestDatabase,
	state: AppState,
	app: Router,
}
impl TestApp {
	async fn new(provider: Arc<ScriptedCompletion>) -> Self {
		let test_db = TestDatabase::new().expect("Failed to create test database.");
		let db =
			Db::connect(&test_db.storage_config()).await.expect("Failed to connect to SQLite.");

		db.ensure_schema().await.expect("Failed to ensure schema.");

		let adapter = LlmAdapter::with_provider(
			jot_testkit::llm_config(),
			provider,
			jot_testkit::retry_policy(),
		)
		.expect("Failed to build adapter.");
		let state =
			AppState::from_parts(jot_testkit::translation_config(), db, Some(Arc::new(adapter)));

		Self::serve(test_db, state)
	}

	/// Goes through `AppState::new` with no API key configured.
	async fn without_credential() -> Self {
		Self::boot(TestDatabase::new().expect("Failed to create test database.")).await
	}

	/// Process startup against an existing database, without an API key.
	async fn boot(test_db: TestDatabase) -> Self {
		let mut llm = jot_testkit::llm_config();

		llm.api_key = String::new();

		let config = Config {
			service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
			storage: test_db.storage_config(),
			providers: Providers { llm },
			translation: jot_testkit::translation_config(),
		};
		let state = AppState::new(config).await.expect("Failed to initialize app state.");

		Self::serve(test_db, state)
	}

	fn serve(test_db: TestDatabase, state: AppState) -> Self {
		state.worker.start();

		let app = routes::router(state.clone());

		Self { _test_db: test_db, state, app }
	}

	async fn call(&self, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match payload {
			Some(payload) => builder
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string())),
			None => builder.body(Body::empty()),
		}
		.expect("Failed to build request.");
		let response =
			self.app.clone().oneshot(request).await.expect("Failed to call the router.");
		let status = response.status();
		let body = body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Failed to read response body.");
		let json = if body.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&body).expect("Failed to parse response.")
		};

		(status, json)
	}

	async fn create(&self, payload: Value) -> Value {
		let (status, json) = self.call("POST", "/api/notes", Some(payload)).await;

		assert_eq!(status, StatusCode::CREATED, "unexpected body: {json}");

		json
	}

	async fn drain(&self) {
		tokio::time::timeout(WAIT, self.state.service.queue.wait_idle())
			.await
			.expect("Worker did not drain the queue.");
	}
}

fn french() -> Arc<ScriptedCompletion> {
	Arc::new(ScriptedCompletion::new(Reply::json(json!({ "title": "T-fr", "content": "C-fr" }))))
}

#[tokio::test]
async fn health_ok() {
	let app = TestApp::new(french()).await;
	let (status, _) = app.call("GET", "/health", None).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn created_note_is_translated_in_the_background() {
	let app = TestApp::new(french()).await;
	let created = app
		.create(json!({
			"title": "T",
			"content": "C",
			"language": "en",
			"translate": true,
			"tags": "x,y"
		}))
		.await;

	assert_eq!(created["translation_status"], "pending");
	assert_eq!(created["translated_title"], Value::Null);
	assert_eq!(created["tags"], json!(["x", "y"]));

	app.drain().await;

	let (status, note) = app.call("GET", &format!("/api/notes/{}", created["id"]), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(note["translation_status"], "completed");
	assert_eq!(note["translated_title"], "T-fr");
	assert_eq!(note["translated_content"], "C-fr");
	assert_eq!(note["title"], "T");
	assert_eq!(note["tags"], json!(["x", "y"]));
}

#[tokio::test]
async fn missing_notes_are_404() {
	let app = TestApp::new(french()).await;

	for method in ["GET", "DELETE"] {
		let (status, body) = app.call(method, "/api/notes/4242", None).await;

		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error_code"], "not_found");
	}

	let (status, _) =
		app.call("PUT", "/api/notes/4242", Some(json!({ "content": "nothing" }))).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_input_is_400() {
	let app = TestApp::new(french()).await;
	let (status, body) = app.call("POST", "/api/notes", Some(json!({ "content": "C" }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error_code"], "invalid_request");

	let (status, _) = app
		.call(
			"POST",
			"/api/notes",
			Some(json!({ "title": "T", "content": "C", "scheduled_at": "next tuesday" })),
		)
		.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) =
		app.call("POST", "/api/notes/generate", Some(json!({ "language": "fr" }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn naive_schedule_is_served_as_utc() {
	let app = TestApp::new(french()).await;
	let created = app
		.create(json!({ "title": "Dentist", "content": "Bring card", "scheduled_at": "2025-05-01T08:00" }))
		.await;

	assert_eq!(created["scheduled_at"], "2025-05-01T08:00:00Z");
	assert_eq!(created["translation_status"], Value::Null);
}

#[tokio::test]
async fn update_and_delete() {
	let app = TestApp::new(french()).await;
	let created =
		app.create(json!({ "title": "Draft", "content": "v1", "language": "en", "tags": ["a"] })).await;
	let uri = format!("/api/notes/{}", created["id"]);
	let (status, updated) =
		app.call("PUT", &uri, Some(json!({ "content": "v2", "language": null }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(updated["title"], "Draft");
	assert_eq!(updated["content"], "v2");
	assert_eq!(updated["language"], Value::Null);
	assert_eq!(updated["tags"], json!(["a"]));

	let (status, body) = app.call("DELETE", &uri, None).await;

	assert_eq!(status, StatusCode::NO_CONTENT);
	assert_eq!(body, Value::Null);

	let (status, _) = app.call("GET", &uri, None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retranslation_while_in_flight_is_409() {
	let (provider, gate) =
		ScriptedCompletion::new(Reply::json(json!({ "title": "T-fr", "content": "C-fr" })))
			.with_gate();
	let provider = Arc::new(provider);
	let app = TestApp::new(provider.clone()).await;
	let created = app.create(json!({ "title": "T", "content": "C", "translate": true })).await;
	let uri = format!("/api/notes/{}", created["id"]);

	provider.wait_for_calls(1, WAIT).await.expect("Model was never called.");

	let (status, body) = app.call("PUT", &uri, Some(json!({ "translate": true }))).await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error_code"], "conflict");

	gate.open(2);
	app.drain().await;

	let (status, note) = app
		.call("PUT", &uri, Some(json!({ "title": "T2", "translate": true, "target_language": "de" })))
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(note["translation_status"], "pending");
	assert_eq!(note["translated_title"], Value::Null);

	app.drain().await;

	let (_, note) = app.call("GET", &uri, None).await;

	assert_eq!(note["translation_status"], "completed");
	assert!(provider.prompts().last().expect("Expected a second call.").contains("de"));
}

#[tokio::test]
async fn list_and_search() {
	let app = TestApp::new(french()).await;

	app.create(json!({ "title": "Alpha", "content": "first" })).await;
	app.create(json!({ "title": "Beta", "content": "mentions Alpha" })).await;
	app.create(json!({ "title": "Gamma", "content": "unrelated" })).await;

	let (status, all) = app.call("GET", "/api/notes", None).await;

	assert_eq!(status, StatusCode::OK);

	let titles = all
		.as_array()
		.expect("Expected a list.")
		.iter()
		.map(|note| note["title"].as_str().expect("title").to_string())
		.collect::<Vec<_>>();

	assert_eq!(titles, vec!["Gamma", "Beta", "Alpha"]);

	let (_, hits) = app.call("GET", "/api/notes/search?q=Alpha", None).await;

	assert_eq!(hits.as_array().map(Vec::len), Some(2));

	let (_, hits) = app.call("GET", "/api/notes/search?q=alpha", None).await;

	assert_eq!(hits, json!([]));

	let (status, hits) = app.call("GET", "/api/notes/search?q=", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn generate_returns_structured_note() {
	let provider = Arc::new(ScriptedCompletion::new(Reply::json(json!({
		"title": "Standup",
		"content": "Daily sync with the team.",
		"tags": ["Work", "work", " meetings "],
		"scheduled_at": "2025-05-02T09:30:00Z"
	}))));
	let app = TestApp::new(provider).await;
	let (status, body) = app
		.call("POST", "/api/notes/generate", Some(json!({ "prompt": "standup tomorrow 9:30" })))
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["title"], "Standup");
	assert_eq!(body["tags"], json!(["Work", "work", "meetings"]));
	assert_eq!(body["scheduled_at"], "2025-05-02T09:30:00Z");
}

#[tokio::test]
async fn translate_reports_tag_failure_as_null() {
	let provider = Arc::new(
		ScriptedCompletion::new(Reply::Rejected)
			.with_script([Reply::json(json!({ "title": "Bonjour", "content": "Le monde" }))]),
	);
	let app = TestApp::new(provider).await;
	let (status, body) = app
		.call(
			"POST",
			"/api/translate",
			Some(json!({ "title": "Hello", "content": "World", "tags": "a,b", "language": "fr" })),
		)
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["title"], "Bonjour");
	assert_eq!(body["content"], "Le monde");
	assert_eq!(body["tags"], Value::Null);
}

#[tokio::test]
async fn translate_text_failure_is_500() {
	let app = TestApp::new(Arc::new(ScriptedCompletion::new(Reply::Rejected))).await;
	let (status, body) =
		app.call("POST", "/api/translate", Some(json!({ "title": "Hello", "content": "World" }))).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error_code"], "provider_error");
}

#[tokio::test]
async fn missing_credential_disables_llm_features() {
	let app = TestApp::without_credential().await;
	let (status, body) =
		app.call("POST", "/api/translate", Some(json!({ "title": "Hello", "content": "World" }))).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error_code"], "configuration_error");

	let created = app.create(json!({ "title": "T", "content": "C", "translate": true })).await;

	app.drain().await;

	let (_, note) = app.call("GET", &format!("/api/notes/{}", created["id"]), None).await;

	assert_eq!(note["translation_status"], "failed");
}

#[tokio::test]
async fn non_numeric_id_is_a_json_400() {
	let app = TestApp::new(french()).await;

	for method in ["GET", "DELETE"] {
		let (status, body) = app.call(method, "/api/notes/abc", None).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error_code"], "invalid_request");
		assert!(body.get("fields").is_none());
	}
}

#[tokio::test]
async fn startup_fails_translations_left_by_a_previous_run() {
	let test_db = TestDatabase::new().expect("Failed to create test database.");
	let db = Db::connect(&test_db.storage_config()).await.expect("Failed to connect to SQLite.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let draft = NewNote {
		title: "Queued".to_string(),
		content: "Lost on exit".to_string(),
		language: None,
		tags: None,
		scheduled_at: None,
		request_translation: true,
	};
	let queued = queries::insert_note(&db, &draft, OffsetDateTime::now_utc())
		.await
		.expect("Insert failed.");
	let running = queries::insert_note(&db, &draft, OffsetDateTime::now_utc())
		.await
		.expect("Insert failed.");

	queries::claim_translation(&db, running.id, OffsetDateTime::now_utc())
		.await
		.expect("Claim failed.")
		.expect("Expected claimed note.");
	db.pool.close().await;

	let app = TestApp::boot(test_db).await;

	for id in [queued.id, running.id] {
		let (_, note) = app.call("GET", &format!("/api/notes/{id}"), None).await;

		assert_eq!(note["translation_status"], "failed");
	}

	let (status, note) = app
		.call("PUT", &format!("/api/notes/{}", queued.id), Some(json!({ "translate": true })))
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(note["translation_status"], "pending");

	app.drain().await;
}
