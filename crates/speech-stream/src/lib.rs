//! Streaming client for a websocket speech-to-text service.
//!
//! One [`SpeechClient::transcribe`] call owns one connection: it sends the
//! `start` action, uploads the audio file as fixed size binary frames, keeps
//! the socket alive with `no-op` actions and returns the first frame that
//! carries recognition results.

pub mod client;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod result;

pub use client::{ClientConfig, SpeechClient};
pub use credentials::Credentials;
pub use error::StreamError;
pub use result::{KeywordHit, TranscriptionResult, WordConfidence, WordTimestamp};
