//! In-memory task executor.
//!
//! Tasks are handed to [`TaskExecutor::submit`], which registers them under a
//! freshly generated [`TaskId`], runs them on their own tokio task and records
//! the outcome. Status entries are kept until they outlive the configured
//! retention window and are then dropped by the expiry sweeper. Lifecycle
//! counts are kept in [`TaskMetrics`] for export through a prometheus registry.

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod status;

pub use config::Config;
pub use error::TaskFault;
pub use executor::{Task, TaskExecutor};
pub use metrics::TaskMetrics;
pub use status::{TaskId, TaskStatus};
