use std::path::{Path, PathBuf};
use tracing::debug;

/// Temporary file owned by one pipeline stage, removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
	path: PathBuf,
	armed: bool,
}

impl ScratchFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), armed: true }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Hands the file over to the caller without removing it.
	pub fn keep(mut self) -> PathBuf {
		self.armed = false;
		std::mem::take(&mut self.path)
	}
}

impl Drop for ScratchFile {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		match std::fs::remove_file(&self.path) {
			Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => debug!(path = %self.path.display(), error = %e, "Could not remove scratch file"),
		}
	}
}

/// `path` with `.extension` appended, keeping any existing extension.
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
	let mut name = path.as_os_str().to_owned();
	name.push(".");
	name.push(extension);
	PathBuf::from(name)
}
