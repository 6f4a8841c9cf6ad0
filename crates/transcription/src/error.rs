use speech_stream::StreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptionError {
	#[error("Failed to fetch {url}: {message}")]
	Fetch { url: String, message: String },

	#[error("Audio conversion failed: {message}\nCommand Output:{output}")]
	Conversion { message: String, output: String },

	#[error("Failed to split audio file: {0}")]
	Segmentation(String),

	#[error("Transcription failed")]
	Transcription(#[from] StreamError),

	#[error("Invalid recipients: {0}")]
	InvalidRecipients(String),

	#[error("Failed to send notification: {0}")]
	Notification(String),

	#[error("Local file operation failed")]
	Io(#[from] std::io::Error),
}

impl TranscriptionError {
	pub(crate) fn fetch(url: &str, message: impl std::fmt::Display) -> Self {
		Self::Fetch {
			url: url.to_string(),
			message: message.to_string(),
		}
	}

	pub(crate) fn notification(message: impl std::fmt::Display) -> Self {
		Self::Notification(message.to_string())
	}
}
