use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use task_queue::{TaskId, TaskStatus};
use tower_http::trace::TraceLayer;
use tracing::instrument;
use transcription::{parse_recipients, TranscriptionRequest, TranscriptionService};

#[derive(Debug, Serialize)]
pub struct JobAccepted {
	pub id: TaskId,
}

#[derive(Debug, Serialize)]
pub struct JobStatus {
	pub id: TaskId,
	pub status: TaskStatus,
	pub message: &'static str,
}

pub fn router(service: TranscriptionService, registry: Registry) -> Router {
	let metrics_routes = Router::new().route("/metrics", get(metrics_handler)).with_state(registry);

	Router::new()
		.route("/add_job_json", post(add_job))
		.route("/job_status/:id", get(job_status))
		.route("/health", get(health))
		.with_state(service)
		.merge(metrics_routes)
		.layer(TraceLayer::new_for_http())
}

#[instrument(name = "add_job", skip_all)]
async fn add_job(State(service): State<TranscriptionService>, Json(request): Json<TranscriptionRequest>) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
	if request.audio_url.trim().is_empty() {
		return Err(ApiError::UnprocessableEntity("audioURL must not be empty".to_string()));
	}
	// A single bad address would make every notification of the job fail.
	parse_recipients(&request.email_addresses).map_err(|e| ApiError::UnprocessableEntity(format!("emailAddresses: {e}")))?;

	let id = service.submit(request).await;
	Ok((StatusCode::ACCEPTED, Json(JobAccepted { id })))
}

#[instrument(name = "job_status", skip(service))]
async fn job_status(State(service): State<TranscriptionService>, Path(id): Path<String>) -> Json<JobStatus> {
	let id = TaskId::from(id);
	let status = service.status(&id).await;

	Json(JobStatus {
		id,
		status,
		message: status.description(),
	})
}

async fn health() -> &'static str {
	"OK"
}

async fn metrics_handler(State(registry): State<Registry>) -> Result<String, StatusCode> {
	let mut buffer = Vec::new();
	if TextEncoder::new().encode(&registry.gather(), &mut buffer).is_err() {
		return Err(StatusCode::INTERNAL_SERVER_ERROR);
	}

	String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
