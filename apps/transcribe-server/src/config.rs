use clap::Parser;
use speech_stream::{client, ClientConfig, Credentials};
use std::path::PathBuf;
use std::time::Duration;
use transcription::SmtpConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "transcribe-server")]
#[command(about = "Transcribes remote audio files and emails the result", long_about = None)]
pub struct Config {
	/// Address to bind the HTTP server to
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: String,

	#[arg(long, env = "PORT", default_value = "8080")]
	pub port: u16,

	/// Log filter directives, e.g. `info,transcription=debug`
	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,

	/// Emit logs as flattened JSON instead of the pretty format
	#[arg(long, env = "LOG_JSON", default_value_t = false)]
	pub log_json: bool,

	/// Websocket recognize endpoint of the speech service
	#[arg(long, env = "SPEECH_URL", default_value = client::DEFAULT_URL)]
	pub speech_url: String,

	#[arg(long, env = "SPEECH_USERNAME")]
	pub speech_username: String,

	#[arg(long, env = "SPEECH_PASSWORD", hide_env_values = true)]
	pub speech_password: String,

	/// Content type announced for uploaded segments
	#[arg(long, env = "SPEECH_CONTENT_TYPE", default_value = client::DEFAULT_CONTENT_TYPE)]
	pub speech_content_type: String,

	/// Seconds between keepalive messages while a segment is being recognized
	#[arg(long, env = "KEEPALIVE_INTERVAL_SECS", default_value = "5")]
	pub keepalive_interval_secs: u64,

	#[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
	pub smtp_host: String,

	#[arg(long, env = "SMTP_PORT", default_value = "587")]
	pub smtp_port: u16,

	/// Login of the mail relay, also used as the sender address
	#[arg(long, env = "EMAIL_USERNAME")]
	pub email_username: String,

	#[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
	pub email_password: String,

	/// Directory for downloads and intermediate audio files
	#[arg(long, env = "WORK_DIR", default_value = ".")]
	pub work_dir: PathBuf,

	#[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
	pub ffmpeg_path: PathBuf,

	#[command(flatten)]
	pub tasks: task_queue::Config,
}

impl Config {
	pub fn validate(&self) -> Result<(), String> {
		if self.speech_username.trim().is_empty() {
			return Err("speech username must not be empty".to_string());
		}

		if self.keepalive_interval_secs == 0 {
			return Err("keepalive interval must be greater than 0".to_string());
		}

		self.tasks.validate()
	}

	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	pub fn speech_client(&self) -> (ClientConfig, Credentials) {
		let config = ClientConfig {
			url: self.speech_url.clone(),
			content_type: self.speech_content_type.clone(),
			keepalive_interval: Duration::from_secs(self.keepalive_interval_secs),
			..ClientConfig::default()
		};
		(config, Credentials::new(self.speech_username.clone(), self.speech_password.clone()))
	}

	pub fn smtp(&self) -> SmtpConfig {
		SmtpConfig {
			host: self.smtp_host.clone(),
			port: self.smtp_port,
			username: self.email_username.clone(),
			password: self.email_password.clone(),
		}
	}
}
