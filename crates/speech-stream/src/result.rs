use crate::messages::RecognizeResponse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordConfidence {
	pub word: String,
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
	pub word: String,
	pub start_time: f64,
	pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
	/// Keyword as it was requested.
	pub keyword: String,
	/// Text that matched it.
	pub word: String,
	pub start_time: f64,
	pub end_time: f64,
	pub confidence: f64,
}

/// Recognized text of one audio file, with word level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
	pub transcript: String,
	pub confidences: Vec<WordConfidence>,
	pub timestamps: Vec<WordTimestamp>,
	pub keywords: Vec<KeywordHit>,
}

impl TranscriptionResult {
	/// Keeps only the best alternative of every result in the frame.
	pub fn from_response(response: &RecognizeResponse) -> Self {
		let mut merged = Self::default();

		for result in &response.results {
			if let Some(best) = result.best() {
				merged.transcript.push_str(&best.transcript);
				merged
					.confidences
					.extend(best.word_confidence.iter().map(|(word, score)| WordConfidence { word: word.clone(), score: *score }));
				merged.timestamps.extend(best.timestamps.iter().map(|(word, start_time, end_time)| WordTimestamp {
					word: word.clone(),
					start_time: *start_time,
					end_time: *end_time,
				}));
			}

			for (keyword, matches) in &result.keywords_result {
				merged.keywords.extend(matches.iter().map(|m| KeywordHit {
					keyword: keyword.clone(),
					word: m.normalized_text.clone(),
					start_time: m.start_time,
					end_time: m.end_time,
					confidence: m.confidence,
				}));
			}
		}

		merged
	}

	pub fn is_empty(&self) -> bool {
		self.transcript.is_empty() && self.timestamps.is_empty() && self.keywords.is_empty()
	}

	/// Copy with every time moved by `offset_secs`, for results of an audio
	/// segment that starts later in the source file.
	pub fn shifted(&self, offset_secs: f64) -> Self {
		let mut shifted = self.clone();
		for ts in &mut shifted.timestamps {
			ts.start_time += offset_secs;
			ts.end_time += offset_secs;
		}
		for hit in &mut shifted.keywords {
			hit.start_time += offset_secs;
			hit.end_time += offset_secs;
		}
		shifted
	}
}
