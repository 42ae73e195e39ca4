use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, PathRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use jot_service::{
	CreateNoteRequest, Error as ServiceError, GenerateNoteRequest, GenerateNoteResponse,
	NoteResponse, TranslateRequest, TranslateResponse, UpdateNoteRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/notes", get(list_notes).post(create_note))
		.route("/api/notes/search", get(search_notes))
		.route("/api/notes/generate", post(generate_note))
		.route("/api/notes/{id}", get(get_note).put(update_note).delete(delete_note))
		.route("/api/translate", post(translate))
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
	#[serde(default)]
	q: String,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteResponse>>, ApiError> {
	let response = state.service.list_notes().await?;
	Ok(Json(response))
}

async fn search_notes(
	State(state): State<AppState>,
	Query(params): Query<SearchParams>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
	let response = state.service.search_notes(&params.q).await?;
	Ok(Json(response))
}

async fn create_note(
	State(state): State<AppState>,
	payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
	let Json(payload) = payload?;
	let response = state.service.create_note(payload).await?;
	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_note(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> Result<Json<NoteResponse>, ApiError> {
	let Path(id) = id?;
	let response = state.service.get_note(id).await?;
	Ok(Json(response))
}

async fn update_note(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<NoteResponse>, ApiError> {
	let Path(id) = id?;
	let Json(payload) = payload?;
	let response = state.service.update_note(id, payload).await?;
	Ok(Json(response))
}

async fn delete_note(
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
	let Path(id) = id?;
	state.service.delete_note(id).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn generate_note(
	State(state): State<AppState>,
	payload: Result<Json<GenerateNoteRequest>, JsonRejection>,
) -> Result<Json<GenerateNoteResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.generate_note(payload).await?;
	Ok(Json(response))
}

async fn translate(
	State(state): State<AppState>,
	payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.translate(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message),
			ServiceError::Configuration { message } => {
				tracing::error!(error = %message, "Request failed on configuration.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", message)
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Request failed in the LLM provider.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "provider_error", message)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Request failed in storage.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(rejection.status(), "invalid_request", rejection.body_text())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		json_error(rejection.status(), "invalid_request", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
