use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated task ids.
pub const TASK_ID_LEN: usize = 20;

/// Opaque identifier handed back to whoever submitted a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
	/// Draws a fresh random alphanumeric id. Uniqueness is probabilistic only.
	pub fn generate() -> Self {
		let id = rand::rng().sample_iter(&Alphanumeric).take(TASK_ID_LEN).map(char::from).collect();
		Self(id)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for TaskId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for TaskId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Task lifecycle state. `NotFound` is only ever produced by lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
	InProgress,
	Success,
	Failure,
	NotFound,
}

impl TaskStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InProgress => "IN_PROGRESS",
			Self::Success => "SUCCESS",
			Self::Failure => "FAILURE",
			Self::NotFound => "NOT_FOUND",
		}
	}

	pub const fn description(self) -> &'static str {
		match self {
			Self::InProgress => "The task is in progress.",
			Self::Success => "The task completed successfully.",
			Self::Failure => "The task failed.",
			Self::NotFound => "Error: task not found.",
		}
	}

	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Success | Self::Failure)
	}
}

impl fmt::Display for TaskStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
