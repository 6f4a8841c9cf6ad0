use crate::job::{Collaborators, TranscriptionJob, TranscriptionRequest};
use task_queue::{TaskExecutor, TaskId, TaskStatus};
use tracing::info;

/// Accepts transcription requests and answers status queries.
#[derive(Clone)]
pub struct TranscriptionService {
	executor: TaskExecutor,
	collaborators: Collaborators,
}

impl TranscriptionService {
	pub fn new(executor: TaskExecutor, collaborators: Collaborators) -> Self {
		Self { executor, collaborators }
	}

	/// Starts a background job for `request` and returns its id immediately.
	pub async fn submit(&self, request: TranscriptionRequest) -> TaskId {
		let url = request.audio_url.clone();
		let recipients = request.email_addresses.len();
		let id = self.executor.submit(TranscriptionJob::new(request, self.collaborators.clone())).await;

		info!(task = %id, url, recipients, "Transcription requested");
		id
	}

	pub async fn status(&self, id: &TaskId) -> TaskStatus {
		self.executor.status(id).await
	}

	pub const fn executor(&self) -> &TaskExecutor {
		&self.executor
	}
}
