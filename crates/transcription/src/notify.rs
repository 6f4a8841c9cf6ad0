use crate::error::TranscriptionError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use task_queue::TaskId;
use tracing::debug;

/// Sends plain text messages to a list of recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
	async fn notify(&self, to: &[String], subject: &str, body: &str) -> Result<(), TranscriptionError>;
}

#[derive(Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
}

impl fmt::Debug for SmtpConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SmtpConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &"[REDACTED]")
			.finish()
	}
}

/// Mails through an authenticated STARTTLS relay, sending as the login user.
pub struct SmtpNotifier {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	sender: Mailbox,
}

impl SmtpNotifier {
	pub fn new(config: &SmtpConfig) -> Result<Self, TranscriptionError> {
		let sender: Mailbox = config.username.parse().map_err(|e| TranscriptionError::notification(format!("invalid sender {:?}: {e}", config.username)))?;

		let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
			.map_err(TranscriptionError::notification)?
			.port(config.port)
			.credentials(Credentials::new(config.username.clone(), config.password.clone()))
			.build();

		Ok(Self { transport, sender })
	}
}

#[async_trait]
impl Notifier for SmtpNotifier {
	async fn notify(&self, to: &[String], subject: &str, body: &str) -> Result<(), TranscriptionError> {
		let message = build_message(&self.sender, to, subject, body)?;
		self.transport.send(message).await.map_err(TranscriptionError::notification)?;

		debug!(recipients = to.len(), subject, "Notification sent");
		Ok(())
	}
}

fn build_message(sender: &Mailbox, to: &[String], subject: &str, body: &str) -> Result<Message, TranscriptionError> {
	let mut builder = Message::builder().from(sender.clone()).subject(subject).header(ContentType::TEXT_PLAIN);
	for mailbox in parse_recipients(to)? {
		builder = builder.to(mailbox);
	}

	builder.body(body.to_string()).map_err(TranscriptionError::notification)
}

/// Parses every address, rejecting an empty list or any blank or malformed entry.
pub fn parse_recipients(to: &[String]) -> Result<Vec<Mailbox>, TranscriptionError> {
	if to.is_empty() {
		return Err(TranscriptionError::InvalidRecipients("no recipients".to_string()));
	}

	to.iter()
		.map(|address| {
			address
				.trim()
				.parse::<Mailbox>()
				.map_err(|e| TranscriptionError::InvalidRecipients(format!("{address:?}: {e}")))
		})
		.collect()
}

pub fn success_subject(id: &TaskId) -> String {
	format!("Transcription {id} Complete")
}

pub fn success_body(transcript: &str) -> String {
	format!("The transcript is below.\n\n{transcript}")
}

pub fn failure_subject(id: &TaskId) -> String {
	format!("Transcription {id} Failed")
}
