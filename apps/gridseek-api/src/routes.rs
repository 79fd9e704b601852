use std::{
	io::Write,
	path::{Path, PathBuf},
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::{
		DefaultBodyLimit, Multipart, State,
		multipart::{MultipartError, MultipartRejection},
	},
	http::{HeaderValue, Method, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tempfile::NamedTempFile;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use gridseek_service::{SearchResponse, ServiceError};
use gridseek_sheets::SpreadsheetKind;

use crate::state::AppState;

/// Room for multipart framing and the `query` field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1_024;

pub fn router(state: AppState) -> Router {
	let body_limit = state.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD_BYTES);
	let cors = cors_layer(&state.service.cfg.service.cors_allowed_origins);

	Router::new()
		.route("/api/v1/health", get(health))
		.route("/api/v1/search", post(search))
		.layer(DefaultBodyLimit::max(body_limit))
		.layer(cors)
		.with_state(state)
}

/// Credentialed CORS for the configured browser origins. Wildcards are not allowed together with
/// credentials, so request headers are mirrored instead.
fn cors_layer(origins: &[String]) -> CorsLayer {
	let origins: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(%origin, "Skipping invalid CORS origin.");

				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers(AllowHeaders::mirror_request())
		.allow_credentials(true)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let form = SearchForm::read(multipart?).await?;
	let Some((file_name, bytes)) = form.file else {
		return Err(json_error(StatusCode::BAD_REQUEST, "invalid_request", "file field is required."));
	};

	if SpreadsheetKind::from_file_name(&file_name).is_none() {
		tracing::info!(file = %file_name, "Rejected unsupported upload.");

		return Err(ServiceError::UnsupportedFile { name: file_name }.into());
	}

	let query = form.query.unwrap_or_default();

	if query.trim().is_empty() {
		return Err(json_error(StatusCode::BAD_REQUEST, "invalid_request", "query must be non-empty."));
	}
	if bytes.len() > state.max_upload_bytes() {
		return Err(json_error(
			StatusCode::PAYLOAD_TOO_LARGE,
			"payload_too_large",
			format!("Upload exceeds {} bytes.", state.max_upload_bytes()),
		));
	}

	let path = store_upload(&state.upload_dir(), &file_name, bytes).await?;
	let response = state.service.search_file(&query, &path).await?;

	Ok(Json(response))
}

#[derive(Default)]
struct SearchForm {
	query: Option<String>,
	file: Option<(String, Bytes)>,
}
impl SearchForm {
	async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let name = field.name().map(str::to_string);

			match name.as_deref() {
				Some("query") => form.query = Some(field.text().await?),
				Some("file") => {
					let file_name = field.file_name().unwrap_or_default().to_string();
					let bytes = field.bytes().await?;

					form.file = Some((file_name, bytes));
				},
				_ => {},
			}
		}

		Ok(form)
	}
}

/// Stores the upload under `upload_dir` named by the BLAKE3 digest of its bytes, keeping the
/// uploaded file's extension so the normalizer can pick a reader.
///
/// Identical uploads map to the same file, which is written once and never rewritten in
/// place; new content is staged under a unique name and renamed into position.
async fn store_upload(upload_dir: &Path, file_name: &str, bytes: Bytes) -> Result<PathBuf, ApiError> {
	let digest = blake3::hash(&bytes).to_hex();
	let extension = Path::new(file_name)
		.extension()
		.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
		.unwrap_or_default();
	let path = upload_dir.join(format!("{digest}.{extension}"));
	let io_error = |source| ServiceError::Io { path: path.clone(), source };

	if tokio::fs::try_exists(&path).await.map_err(io_error)? {
		tracing::info!(file = %file_name, %digest, "Upload already stored.");

		return Ok(path);
	}

	tokio::fs::create_dir_all(upload_dir).await.map_err(io_error)?;

	let dir = upload_dir.to_path_buf();
	let target = path.clone();
	let size = bytes.len();

	tokio::task::spawn_blocking(move || -> std::io::Result<()> {
		let mut staged = NamedTempFile::new_in(&dir)?;

		staged.write_all(&bytes)?;
		staged.persist(&target).map_err(|err| err.error)?;

		Ok(())
	})
	.await
	.map_err(|err| ServiceError::Internal { message: err.to_string() })?
	.map_err(io_error)?;

	tracing::info!(file = %file_name, %digest, bytes = size, "Upload stored.");

	Ok(path)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	error_code: String,
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

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::UnsupportedFile { .. } =>
				json_error(StatusCode::BAD_REQUEST, "unsupported_file", "Unsupported file type"),
			ServiceError::Sheets(err) => {
				tracing::warn!(error = %err, "Spreadsheet normalization failed.");

				json_error(StatusCode::UNPROCESSABLE_ENTITY, "normalization_failed", err.to_string())
			},
			err @ ServiceError::Validation { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "llm_validation_failed", err.to_string()),
			err @ ServiceError::ChunkAborted { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "chunk_aborted", err.to_string()),
			err @ (ServiceError::Io { .. }
			| ServiceError::Provider(_)
			| ServiceError::Internal { .. }) => {
				tracing::error!(error = %err, "Search request failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal error.")
			},
		}
	}
}

impl From<MultipartError> for ApiError {
	fn from(err: MultipartError) -> Self {
		let status = err.status();
		let code =
			if status == StatusCode::PAYLOAD_TOO_LARGE { "payload_too_large" } else { "invalid_multipart" };

		json_error(status, code, err.body_text())
	}
}

impl From<MultipartRejection> for ApiError {
	fn from(rejection: MultipartRejection) -> Self {
		json_error(rejection.status(), "invalid_multipart", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.message, error_code: self.error_code };

		(self.status, Json(body)).into_response()
	}
}
