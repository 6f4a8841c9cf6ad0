use crate::segment::AudioSegment;
use speech_stream::{KeywordHit, TranscriptionResult, WordConfidence, WordTimestamp};

/// Results of every segment of one source file, merged in segment order.
///
/// Word and keyword times are relative to the start of the source file, not
/// the segment they were recognized in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
	pub text: String,
	pub segments: usize,
	pub confidences: Vec<WordConfidence>,
	pub timestamps: Vec<WordTimestamp>,
	pub keywords: Vec<KeywordHit>,
}

impl Transcript {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends the result of `segment`. Callers push segments in index order.
	#[allow(clippy::cast_precision_loss)]
	pub fn push(&mut self, segment: &AudioSegment, result: TranscriptionResult) {
		debug_assert_eq!(segment.index, self.segments, "segments pushed out of order");

		let result = if segment.start_secs == 0 { result } else { result.shifted(segment.start_secs as f64) };
		self.text.push_str(&result.transcript);
		self.confidences.extend(result.confidences);
		self.timestamps.extend(result.timestamps);
		self.keywords.extend(result.keywords);
		self.segments += 1;
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}
}
