use async_trait::async_trait;
use speech_stream::{SpeechClient, StreamError, TranscriptionResult};
use std::path::Path;

/// Turns one audio file into a transcription result.
#[async_trait]
pub trait Transcriber: Send + Sync {
	async fn transcribe(&self, path: &Path, keywords: &[String]) -> Result<TranscriptionResult, StreamError>;
}

#[async_trait]
impl Transcriber for SpeechClient {
	async fn transcribe(&self, path: &Path, keywords: &[String]) -> Result<TranscriptionResult, StreamError> {
		Self::transcribe(self, path, keywords).await
	}
}
