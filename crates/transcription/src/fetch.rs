use crate::error::TranscriptionError;
use crate::scratch::ScratchFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Retrieves a remote file to local disk.
#[async_trait]
pub trait FileFetcher: Send + Sync {
	async fn fetch(&self, url: &str) -> Result<PathBuf, TranscriptionError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: reqwest::Client,
	work_dir: PathBuf,
}

impl HttpFetcher {
	pub fn new(client: reqwest::Client, work_dir: impl Into<PathBuf>) -> Self {
		Self {
			client,
			work_dir: work_dir.into(),
		}
	}
}

#[async_trait]
impl FileFetcher for HttpFetcher {
	async fn fetch(&self, url: &str) -> Result<PathBuf, TranscriptionError> {
		let mut response = self
			.client
			.get(url)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(|e| TranscriptionError::fetch(url, e))?;

		let path = unique_path(&self.work_dir, url);
		// Removes a partial download if anything below fails.
		let guard = ScratchFile::new(&path);
		let mut file = tokio::fs::File::create(guard.path()).await.map_err(|e| TranscriptionError::fetch(url, e))?;

		let mut written = 0usize;
		while let Some(chunk) = response.chunk().await.map_err(|e| TranscriptionError::fetch(url, e))? {
			file.write_all(&chunk).await.map_err(|e| TranscriptionError::fetch(url, e))?;
			written += chunk.len();
		}
		file.flush().await.map_err(|e| TranscriptionError::fetch(url, e))?;

		debug!(url, path = %path.display(), bytes = written, "Downloaded file");
		Ok(guard.keep())
	}
}

/// Local path for a download of `url`: the last path segment plus a
/// nanosecond timestamp, so concurrent downloads of one URL do not clash.
pub fn unique_path(work_dir: &Path, url: &str) -> PathBuf {
	let without_query = url.split(['?', '#']).next().unwrap_or_default();
	let name = without_query.rsplit('/').next().filter(|segment| !segment.is_empty()).unwrap_or("audio");
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
	work_dir.join(format!("{name}{nanos}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn file_name(path: &Path) -> String {
		path.file_name().unwrap().to_string_lossy().into_owned()
	}

	#[test]
	fn test_unique_path_uses_last_segment() {
		let path = unique_path(Path::new("/work"), "https://cdn.example.com/shows/episode-12.mp3?sig=abc");
		assert_eq!(path.parent(), Some(Path::new("/work")));

		let name = file_name(&path);
		assert!(name.starts_with("episode-12.mp3"));
		assert!(name["episode-12.mp3".len()..].chars().all(|c| c.is_ascii_digit()));
	}

	#[test]
	fn test_unique_path_falls_back_for_bare_host() {
		let name = file_name(&unique_path(Path::new("."), "https://example.com/"));
		assert!(name.starts_with("audio"));
	}

	#[test]
	fn test_unique_paths_differ() {
		let a = unique_path(Path::new("."), "https://example.com/a.wav");
		std::thread::sleep(std::time::Duration::from_millis(1));
		let b = unique_path(Path::new("."), "https://example.com/a.wav");
		assert_ne!(a, b);
	}

	#[tokio::test]
	async fn test_unreachable_host_is_fetch_error() {
		let dir = tempfile::tempdir().unwrap();
		let fetcher = HttpFetcher::new(reqwest::Client::new(), dir.path());

		let err = fetcher.fetch("http://127.0.0.1:1/audio.mp3").await.unwrap_err();
		assert!(matches!(err, TranscriptionError::Fetch { ref url, .. } if url == "http://127.0.0.1:1/audio.mp3"));
		assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
	}
}
