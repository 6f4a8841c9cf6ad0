//! Splitting of audio that is too large for a single upload.
//!
//! The number of segments comes from the file size alone. Every segment but
//! the first starts a few seconds before the previous one ends so words cut
//! at a boundary appear whole in at least one segment.

/// Largest file the speech service accepts in one session, with headroom.
pub const MAX_UPLOAD_BYTES: u64 = 95_000_000;
/// Overlap between consecutive segments after the first.
pub const REDUNDANCY_SECS: u64 = 5;

/// Encoding every file is normalized to before its size is measured.
pub const SAMPLE_RATE: u64 = 16_000;
pub const BIT_DEPTH: u64 = 16;
pub const CHANNELS: u64 = 1;

/// Seconds of canonical audio that fit in `MAX_UPLOAD_BYTES` (2968).
pub const CHUNK_LENGTH_SECS: u64 = chunk_length_secs(MAX_UPLOAD_BYTES, SAMPLE_RATE, BIT_DEPTH, CHANNELS);

/// Seconds of PCM audio that fit in `byte_budget` bytes.
pub const fn chunk_length_secs(byte_budget: u64, sample_rate: u64, bit_depth: u64, channels: u64) -> u64 {
	byte_budget * 8 / (sample_rate * bit_depth * channels)
}

pub const fn needs_split(file_size: u64) -> bool {
	file_size > MAX_UPLOAD_BYTES
}

/// `floor(size / MAX_UPLOAD_BYTES) + 1`. Over-provisions by one segment so
/// the remainder never needs its own calculation.
pub const fn chunk_count(file_size: u64) -> u64 {
	file_size / MAX_UPLOAD_BYTES + 1
}

/// Start of segment `index`: `index * L - (index - 1) * R`, with the first
/// segment pinned to the beginning of the file.
pub const fn segment_start(index: u64) -> u64 {
	if index == 0 {
		0
	} else {
		index * CHUNK_LENGTH_SECS - (index - 1) * REDUNDANCY_SECS
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSegment {
	pub index: usize,
	pub start_secs: u64,
	/// `None` runs to the end of the file.
	pub duration_secs: Option<u64>,
}

impl AudioSegment {
	/// The whole file as a single segment.
	pub const fn whole() -> Self {
		Self {
			index: 0,
			start_secs: 0,
			duration_secs: None,
		}
	}

	/// Nominal end in seconds; the last segment may in practice end earlier.
	pub fn nominal_end(&self) -> Option<u64> {
		self.duration_secs.map(|duration| self.start_secs + duration)
	}
}

/// Segments covering a canonical file of `file_size` bytes, in order.
pub fn plan(file_size: u64) -> Vec<AudioSegment> {
	(0..chunk_count(file_size))
		.zip(0_usize..)
		.map(|(i, index)| AudioSegment {
			index,
			start_secs: segment_start(i),
			duration_secs: Some(CHUNK_LENGTH_SECS),
		})
		.collect()
}
