use base64::engine::{general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::fmt;

/// Username/password pair for the speech service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	/// Value for the `Authorization` header.
	pub fn basic_auth(&self) -> String {
		let auth = format!("{}:{}", self.username, self.password);
		format!("Basic {}", BASE64_STANDARD.encode(auth))
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials").field("username", &self.username).field("password", &"[REDACTED]").finish()
	}
}
