use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("{0}")]
	UnprocessableEntity(String),
}

impl ApiError {
	const fn status_code(&self) -> StatusCode {
		match self {
			Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		#[derive(Serialize)]
		struct ErrorBody {
			error: String,
		}

		tracing::debug!(error = %self, "Rejected request");
		(self.status_code(), Json(ErrorBody { error: self.to_string() })).into_response()
	}
}
