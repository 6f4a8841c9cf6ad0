//! Wire format of the recognize websocket.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum confidence for a keyword to be reported back.
pub const KEYWORDS_THRESHOLD: f64 = 0.5;

/// Opening control message of a recognition session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StartRequest<'a> {
	pub action: &'static str,
	#[serde(rename = "content-type")]
	pub content_type: &'a str,
	pub continuous: bool,
	pub word_confidence: bool,
	pub timestamps: bool,
	pub profanity_filter: bool,
	pub interim_results: bool,
	/// `-1` disables the server side inactivity timeout.
	pub inactivity_timeout: i32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub keywords: Option<&'a [String]>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub keywords_threshold: Option<f64>,
}

impl<'a> StartRequest<'a> {
	pub fn new(content_type: &'a str, keywords: &'a [String]) -> Self {
		let spotting = !keywords.is_empty();
		Self {
			action: "start",
			content_type,
			continuous: true,
			word_confidence: true,
			timestamps: true,
			profanity_filter: false,
			interim_results: false,
			inactivity_timeout: -1,
			keywords: spotting.then_some(keywords),
			keywords_threshold: spotting.then_some(KEYWORDS_THRESHOLD),
		}
	}
}

/// Keepalive action; the service ignores it but counts it as traffic.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct NoOp {
	pub action: &'static str,
}

impl Default for NoOp {
	fn default() -> Self {
		Self { action: "no-op" }
	}
}

/// Any text frame sent by the service. Acknowledgements such as
/// `{"state": "listening"}` decode with an empty `results`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecognizeResponse {
	#[serde(default)]
	pub result_index: usize,
	#[serde(default)]
	pub results: Vec<SpeechResult>,
	#[serde(default)]
	pub error: Option<String>,
}

impl RecognizeResponse {
	pub fn has_results(&self) -> bool {
		!self.results.is_empty()
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpeechResult {
	/// Ranked hypotheses, best first.
	#[serde(default)]
	pub alternatives: Vec<Alternative>,
	#[serde(default)]
	pub keywords_result: BTreeMap<String, Vec<KeywordMatch>>,
	#[serde(default, rename = "final")]
	pub is_final: bool,
}

impl SpeechResult {
	pub fn best(&self) -> Option<&Alternative> {
		self.alternatives.first()
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Alternative {
	#[serde(default)]
	pub transcript: String,
	#[serde(default)]
	pub confidence: Option<f64>,
	/// `[word, score]` pairs.
	#[serde(default)]
	pub word_confidence: Vec<(String, f64)>,
	/// `[word, start, end]` triples, in seconds.
	#[serde(default)]
	pub timestamps: Vec<(String, f64, f64)>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KeywordMatch {
	pub normalized_text: String,
	pub start_time: f64,
	pub end_time: f64,
	pub confidence: f64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::{json, Value};

	#[test]
	fn test_start_request_with_keywords() {
		let keywords = vec!["budget".to_string()];
		let value = serde_json::to_value(StartRequest::new("audio/flac", &keywords)).unwrap();

		assert_eq!(
			value,
			json!({
				"action": "start",
				"content-type": "audio/flac",
				"continuous": true,
				"word_confidence": true,
				"timestamps": true,
				"profanity_filter": false,
				"interim_results": false,
				"inactivity_timeout": -1,
				"keywords": ["budget"],
				"keywords_threshold": 0.5
			})
		);
	}

	#[test]
	fn test_start_request_without_keywords() {
		let value: Value = serde_json::to_value(StartRequest::new("audio/wav", &[])).unwrap();
		assert!(value.get("keywords").is_none());
		assert!(value.get("keywords_threshold").is_none());
		assert_eq!(value["content-type"], "audio/wav");
	}

	#[test]
	fn test_no_op_shape() {
		assert_eq!(serde_json::to_string(&NoOp::default()).unwrap(), r#"{"action":"no-op"}"#);
	}

	#[test]
	fn test_acknowledgement_has_no_results() {
		let response: RecognizeResponse = serde_json::from_str(r#"{"state": "listening"}"#).unwrap();
		assert!(!response.has_results());
		assert!(response.error.is_none());
	}

	#[test]
	fn test_decode_full_result() {
		let raw = r#"{
			"result_index": 0,
			"results": [{
				"final": true,
				"alternatives": [
					{
						"transcript": "the budget is approved ",
						"confidence": 0.91,
						"word_confidence": [["the", 0.99], ["budget", 0.87]],
						"timestamps": [["the", 0.0, 0.2], ["budget", 0.2, 0.7]]
					},
					{ "transcript": "the budge it is approved " }
				],
				"keywords_result": {
					"budget": [{"normalized_text": "budget", "start_time": 0.2, "end_time": 0.7, "confidence": 0.87}]
				}
			}]
		}"#;

		let response: RecognizeResponse = serde_json::from_str(raw).unwrap();
		assert!(response.has_results());

		let result = &response.results[0];
		assert!(result.is_final);
		let best = result.best().unwrap();
		assert_eq!(best.transcript, "the budget is approved ");
		assert_eq!(best.word_confidence[1], ("budget".to_string(), 0.87));
		assert_eq!(best.timestamps[1], ("budget".to_string(), 0.2, 0.7));
		assert_eq!(result.keywords_result["budget"][0].confidence, 0.87);
	}
}
