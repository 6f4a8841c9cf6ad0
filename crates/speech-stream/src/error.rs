use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum StreamError {
	#[error("Failed to connect to speech service: {0}")]
	Connect(#[source] tungstenite::Error),

	#[error("Invalid connection request: {0}")]
	Request(String),

	#[error("Failed to send message: {0}")]
	Send(#[source] tungstenite::Error),

	#[error("Failed to read audio file: {0}")]
	Upload(#[source] std::io::Error),

	#[error("Failed to receive message: {0}")]
	Receive(#[source] tungstenite::Error),

	#[error("Connection closed before a result arrived: {0}")]
	Closed(String),

	#[error("Malformed message from speech service: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("Speech service reported an error: {0}")]
	Service(String),
}

impl StreamError {
	/// Whether the failure happened while waiting for the result.
	pub const fn is_read_failure(&self) -> bool {
		matches!(self, Self::Receive(_) | Self::Closed(_))
	}
}
