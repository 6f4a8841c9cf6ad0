use crate::error::TranscriptionError;
use crate::scratch::append_extension;
use crate::segment::{AudioSegment, CHANNELS, SAMPLE_RATE};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Transcodes local audio files. Outputs are new files next to the input.
#[async_trait]
pub trait FormatConverter: Send + Sync {
	/// Re-encodes `path` as mono 16 kHz audio in the container named by
	/// `extension` and returns the new path.
	async fn convert(&self, path: &Path, extension: &str) -> Result<PathBuf, TranscriptionError>;

	/// Cuts `segment` out of `path` into a new wav file.
	async fn extract(&self, path: &Path, segment: &AudioSegment) -> Result<PathBuf, TranscriptionError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegConverter {
	program: PathBuf,
}

impl FfmpegConverter {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}

	async fn run(&self, args: Vec<OsString>) -> Result<(), TranscriptionError> {
		debug!(program = %self.program.display(), ?args, "Running converter");

		let output = Command::new(&self.program).args(&args).output().await.map_err(|e| TranscriptionError::Conversion {
			message: format!("failed to start {}: {e}", self.program.display()),
			output: String::new(),
		})?;

		if !output.status.success() {
			let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
			combined.push_str(&String::from_utf8_lossy(&output.stderr));
			return Err(TranscriptionError::Conversion {
				message: format!("{} exited with {}", self.program.display(), output.status),
				output: combined,
			});
		}

		Ok(())
	}
}

impl Default for FfmpegConverter {
	fn default() -> Self {
		Self::new("ffmpeg")
	}
}

#[async_trait]
impl FormatConverter for FfmpegConverter {
	async fn convert(&self, path: &Path, extension: &str) -> Result<PathBuf, TranscriptionError> {
		let new_path = append_extension(path, extension);
		remove_stale(&new_path).await?;

		let args = vec![
			OsString::from("-y"),
			OsString::from("-i"),
			path.as_os_str().to_owned(),
			OsString::from("-ar"),
			OsString::from(SAMPLE_RATE.to_string()),
			OsString::from("-ac"),
			OsString::from(CHANNELS.to_string()),
			new_path.as_os_str().to_owned(),
		];
		self.run(args).await?;
		Ok(new_path)
	}

	async fn extract(&self, path: &Path, segment: &AudioSegment) -> Result<PathBuf, TranscriptionError> {
		let new_path = append_extension(path, &format!("{}.wav", segment.index));
		remove_stale(&new_path).await?;

		let mut args = vec![
			OsString::from("-y"),
			OsString::from("-i"),
			path.as_os_str().to_owned(),
			OsString::from("-ss"),
			OsString::from(segment.start_secs.to_string()),
		];
		if let Some(duration) = segment.duration_secs {
			args.push(OsString::from("-t"));
			args.push(OsString::from(duration.to_string()));
		}
		args.push(new_path.as_os_str().to_owned());

		self.run(args).await?;
		Ok(new_path)
	}
}

/// ffmpeg refuses to overwrite an existing output without prompting.
async fn remove_stale(path: &Path) -> Result<(), TranscriptionError> {
	match tokio::fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e.into()),
	}
}
