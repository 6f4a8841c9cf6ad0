use prometheus::{Counter, Gauge, Registry};
use std::fmt;

/// Task lifecycle counters. Clones share the same underlying metrics.
#[derive(Clone)]
pub struct TaskMetrics {
	pub submitted: Counter,
	pub succeeded: Counter,
	pub failed: Counter,
	pub panicked: Counter,
	pub in_progress: Gauge,
}

impl TaskMetrics {
	/// Creates the metrics and registers them with `registry`.
	pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
		let metrics = Self::unregistered()?;

		registry.register(Box::new(metrics.submitted.clone()))?;
		registry.register(Box::new(metrics.succeeded.clone()))?;
		registry.register(Box::new(metrics.failed.clone()))?;
		registry.register(Box::new(metrics.panicked.clone()))?;
		registry.register(Box::new(metrics.in_progress.clone()))?;

		Ok(metrics)
	}

	/// Metrics that count but are not exported anywhere.
	pub fn unregistered() -> Result<Self, prometheus::Error> {
		Ok(Self {
			submitted: Counter::new("tasks_submitted_total", "Total tasks submitted")?,
			succeeded: Counter::new("tasks_succeeded_total", "Total tasks that completed successfully")?,
			failed: Counter::new("tasks_failed_total", "Total tasks that returned an error")?,
			panicked: Counter::new("tasks_panicked_total", "Total tasks that panicked or were cancelled")?,
			in_progress: Gauge::new("tasks_in_progress", "Tasks currently running")?,
		})
	}
}

impl fmt::Debug for TaskMetrics {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TaskMetrics")
			.field("submitted", &self.submitted.get())
			.field("succeeded", &self.succeeded.get())
			.field("failed", &self.failed.get())
			.field("panicked", &self.panicked.get())
			.field("in_progress", &self.in_progress.get())
			.finish()
	}
}
