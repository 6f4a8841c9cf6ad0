use thiserror::Error;

/// Why a task ended in [`crate::TaskStatus::Failure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFault {
	#[error("{0}")]
	Failed(String),

	#[error("panic occurred: {0}")]
	Panicked(String),

	#[error("task was cancelled before completing")]
	Cancelled,
}

impl TaskFault {
	/// Renders an error together with its whole `source()` chain.
	pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
		let mut message = err.to_string();
		let mut source = err.source();
		while let Some(cause) = source {
			message.push_str("\ncaused by: ");
			message.push_str(&cause.to_string());
			source = cause.source();
		}
		Self::Failed(message)
	}

	pub(crate) fn from_join_error(err: tokio::task::JoinError) -> Self {
		if err.is_cancelled() {
			return Self::Cancelled;
		}

		let payload = err.into_panic();
		let detail = if let Some(s) = payload.downcast_ref::<&str>() {
			(*s).to_string()
		} else if let Some(s) = payload.downcast_ref::<String>() {
			s.clone()
		} else {
			"non-string panic payload".to_string()
		};
		Self::Panicked(detail)
	}

	/// Body sent to the requester when a task fails.
	pub fn diagnostic(&self) -> String {
		format!("The error message is below. Please check logs for more details.\n\n{self}")
	}
}
