//! Audio transcription jobs.
//!
//! A [`TranscriptionJob`] downloads an audio file, normalizes it with ffmpeg,
//! splits it when it is too large for a single upload, streams every segment
//! through the speech service and mails the assembled transcript.
//! [`TranscriptionService`] is the entry point used by the HTTP layer.

pub mod convert;
pub mod error;
pub mod fetch;
pub mod job;
pub mod notify;
pub mod scratch;
pub mod segment;
pub mod service;
pub mod transcriber;
pub mod transcript;

pub use convert::{FfmpegConverter, FormatConverter};
pub use error::TranscriptionError;
pub use fetch::{FileFetcher, HttpFetcher};
pub use job::{Collaborators, TranscriptionJob, TranscriptionRequest};
pub use notify::{parse_recipients, Notifier, SmtpConfig, SmtpNotifier};
pub use segment::AudioSegment;
pub use service::TranscriptionService;
pub use transcriber::Transcriber;
pub use transcript::Transcript;
