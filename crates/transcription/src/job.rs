use crate::convert::FormatConverter;
use crate::error::TranscriptionError;
use crate::fetch::FileFetcher;
use crate::notify::{self, Notifier};
use crate::scratch::ScratchFile;
use crate::segment::{self, AudioSegment};
use crate::transcriber::Transcriber;
use crate::transcript::Transcript;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use task_queue::{Task, TaskFault, TaskId};
use tracing::{debug, info, warn};

/// Body of a transcription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
	#[serde(rename = "audioURL")]
	pub audio_url: String,
	#[serde(rename = "emailAddresses")]
	pub email_addresses: Vec<String>,
	#[serde(rename = "searchWords", default)]
	pub search_words: Vec<String>,
}

/// External services a job talks to. Shared by every job of a service.
#[derive(Clone)]
pub struct Collaborators {
	pub fetcher: Arc<dyn FileFetcher>,
	pub converter: Arc<dyn FormatConverter>,
	pub transcriber: Arc<dyn Transcriber>,
	pub notifier: Arc<dyn Notifier>,
}

pub struct TranscriptionJob {
	request: TranscriptionRequest,
	collaborators: Collaborators,
}

impl TranscriptionJob {
	pub fn new(request: TranscriptionRequest, collaborators: Collaborators) -> Self {
		Self { request, collaborators }
	}

	pub fn request(&self) -> &TranscriptionRequest {
		&self.request
	}

	/// Downloads the source and converts it to canonical wav.
	async fn acquire(&self, id: &TaskId) -> Result<ScratchFile, TranscriptionError> {
		let downloaded = ScratchFile::new(self.collaborators.fetcher.fetch(&self.request.audio_url).await?);
		debug!(task = %id, path = %downloaded.path().display(), "Fetched audio");

		let wav = ScratchFile::new(self.collaborators.converter.convert(downloaded.path(), "wav").await?);
		debug!(task = %id, path = %wav.path().display(), "Converted audio to wav");
		Ok(wav)
	}

	/// Splits `wav` into upload sized flac files, or converts it whole when it
	/// already fits.
	async fn prepare_segments(&self, id: &TaskId, wav: &Path) -> Result<Vec<(AudioSegment, ScratchFile)>, TranscriptionError> {
		let size = tokio::fs::metadata(wav).await.map_err(|e| TranscriptionError::Segmentation(format!("cannot stat {}: {e}", wav.display())))?.len();
		let converter = &self.collaborators.converter;

		if !segment::needs_split(size) {
			let flac = ScratchFile::new(converter.convert(wav, "flac").await?);
			return Ok(vec![(AudioSegment::whole(), flac)]);
		}

		let plan = segment::plan(size);
		debug!(task = %id, bytes = size, segments = plan.len(), "Splitting audio");

		let mut prepared = Vec::with_capacity(plan.len());
		for segment in plan {
			let piece = ScratchFile::new(converter.extract(wav, &segment).await?);
			let flac = ScratchFile::new(converter.convert(piece.path(), "flac").await?);
			prepared.push((segment, flac));
		}
		Ok(prepared)
	}

	async fn transcribe_segments(&self, id: &TaskId, segments: Vec<(AudioSegment, ScratchFile)>) -> Result<Transcript, TranscriptionError> {
		let mut transcript = Transcript::new();

		// One connection at a time; the provider rate limits by connection.
		for (segment, file) in segments {
			let result = self.collaborators.transcriber.transcribe(file.path(), &self.request.search_words).await?;
			debug!(task = %id, segment = segment.index, start_secs = segment.start_secs, "Segment transcribed");
			transcript.push(&segment, result);
		}

		Ok(transcript)
	}
}

#[async_trait]
impl Task for TranscriptionJob {
	type Error = TranscriptionError;

	async fn run(&self, id: &TaskId) -> Result<(), Self::Error> {
		let wav = self.acquire(id).await?;
		let segments = self.prepare_segments(id, wav.path()).await?;
		drop(wav);

		let transcript = self.transcribe_segments(id, segments).await?;
		info!(task = %id, segments = transcript.segments, chars = transcript.text.len(), "Transcription assembled");

		self.collaborators
			.notifier
			.notify(&self.request.email_addresses, &notify::success_subject(id), &notify::success_body(&transcript.text))
			.await
	}

	async fn on_failure(&self, id: &TaskId, fault: &TaskFault) {
		let result = self.collaborators.notifier.notify(&self.request.email_addresses, &notify::failure_subject(id), &fault.diagnostic()).await;

		if let Err(e) = result {
			warn!(task = %id, error = %e, "Failed to send failure notification");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_request_uses_wire_names() {
		let request: TranscriptionRequest = serde_json::from_str(r#"{"audioURL":"https://example.com/a.mp3","emailAddresses":["a@example.com"],"searchWords":["rust"]}"#).unwrap();

		assert_eq!(request.audio_url, "https://example.com/a.mp3");
		assert_eq!(request.email_addresses, vec!["a@example.com"]);
		assert_eq!(request.search_words, vec!["rust"]);
	}

	#[test]
	fn test_search_words_optional() {
		let request: TranscriptionRequest = serde_json::from_str(r#"{"audioURL":"u","emailAddresses":["a@example.com"]}"#).unwrap();
		assert!(request.search_words.is_empty());
	}
}
