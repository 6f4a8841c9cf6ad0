use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[group(id = "TaskQueueConfig")]
pub struct Config {
	#[arg(
        long = "task-retention-secs",
        env = "TASK_RETENTION_SECS",
        default_value = "86400",
        value_parser = parse_duration,
        help = "How long a finished or running task's status is kept, in seconds"
    )]
	pub retention: Duration,

	#[arg(
        long = "sweep-interval-secs",
        env = "SWEEP_INTERVAL_SECS",
        default_value = "1800",
        value_parser = parse_duration,
        help = "Interval between expiry sweeps, in seconds"
    )]
	pub sweep_interval: Duration,
}

impl Config {
	pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
	pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

	pub fn validate(&self) -> Result<(), String> {
		if self.retention.is_zero() {
			return Err("task retention must be greater than 0".to_string());
		}

		if self.sweep_interval.is_zero() {
			return Err("sweep interval must be greater than 0".to_string());
		}

		Ok(())
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			retention: Self::DEFAULT_RETENTION,
			sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
		}
	}
}

fn parse_duration(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}
