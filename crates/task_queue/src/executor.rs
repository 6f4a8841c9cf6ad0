use crate::config::Config;
use crate::error::TaskFault;
use crate::metrics::TaskMetrics;
use crate::status::{TaskId, TaskStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A unit of work the executor can run in the background.
///
/// `run` is executed on its own tokio task, so a panic inside it is contained
/// and reported as a [`TaskFault::Panicked`]. Work that `run` itself spawns
/// with `tokio::spawn` is outside that boundary and must contain its own
/// faults.
#[async_trait]
pub trait Task: Send + Sync + 'static {
	type Error: std::error::Error + Send + Sync + 'static;

	async fn run(&self, id: &TaskId) -> Result<(), Self::Error>;

	/// Invoked exactly once when `run` errors or panics. Best effort: the
	/// executor logs a failing handler and moves on.
	async fn on_failure(&self, id: &TaskId, fault: &TaskFault);
}

#[derive(Debug, Clone, Copy)]
struct TaskInfo {
	status: TaskStatus,
	started: Instant,
}

impl TaskInfo {
	fn started_now() -> Self {
		Self {
			status: TaskStatus::InProgress,
			started: Instant::now(),
		}
	}

	fn is_expired(&self, now: Instant, retention: Duration) -> bool {
		now.saturating_duration_since(self.started) > retention
	}
}

#[derive(Debug, Default)]
struct TaskInfoMap {
	inner: RwLock<HashMap<TaskId, TaskInfo>>,
}

impl TaskInfoMap {
	async fn put(&self, id: TaskId, info: TaskInfo) -> Option<TaskInfo> {
		self.inner.write().await.insert(id, info)
	}

	async fn get(&self, id: &TaskId) -> Option<TaskInfo> {
		self.inner.read().await.get(id).copied()
	}

	/// Moves an in-progress entry to a terminal status. Entries that already
	/// finished, or were swept away, are left alone.
	async fn complete(&self, id: &TaskId, status: TaskStatus) -> bool {
		let mut tasks = self.inner.write().await;
		match tasks.get_mut(id) {
			Some(info) if info.status == TaskStatus::InProgress => {
				info.status = status;
				true
			}
			_ => false,
		}
	}

	async fn expired(&self, now: Instant, retention: Duration) -> Vec<TaskId> {
		let tasks = self.inner.read().await;
		tasks.iter().filter(|(_, info)| info.is_expired(now, retention)).map(|(id, _)| id.clone()).collect()
	}

	async fn remove_expired(&self, ids: &[TaskId], now: Instant, retention: Duration) -> usize {
		let mut tasks = self.inner.write().await;
		let mut removed = 0;
		for id in ids {
			// An id may have been reused by a fresh submission since the read pass.
			if tasks.get(id).is_some_and(|info| info.is_expired(now, retention)) {
				tasks.remove(id);
				debug!(task = %id, "Expired from task info map");
				removed += 1;
			}
		}
		removed
	}

	async fn len(&self) -> usize {
		self.inner.read().await.len()
	}
}

/// Runs submitted tasks in the background and tracks their status.
///
/// Cheap to clone; clones share the same status map.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
	tasks: Arc<TaskInfoMap>,
	config: Config,
	metrics: TaskMetrics,
}

impl TaskExecutor {
	/// Executor whose metrics are not registered anywhere.
	pub fn new(config: Config) -> Self {
		let metrics = TaskMetrics::unregistered().expect("static task metric definitions are valid");
		Self::with_metrics(config, metrics)
	}

	pub fn with_metrics(config: Config, metrics: TaskMetrics) -> Self {
		Self {
			tasks: Arc::new(TaskInfoMap::default()),
			config,
			metrics,
		}
	}

	pub const fn config(&self) -> &Config {
		&self.config
	}

	pub const fn metrics(&self) -> &TaskMetrics {
		&self.metrics
	}

	/// Registers `task` as in progress, starts it and returns its id without
	/// waiting for it to finish.
	pub async fn submit<T: Task>(&self, task: T) -> TaskId {
		let id = TaskId::generate();

		// Ids are random and not checked for uniqueness up front; a clash only gets logged.
		if self.tasks.put(id.clone(), TaskInfo::started_now()).await.is_some() {
			warn!(task = %id, "Task id collided with a live entry, previous status overwritten");
		}
		info!(task = %id, "Task started");
		self.metrics.submitted.inc();
		self.metrics.in_progress.inc();

		tokio::spawn(complete_task(Arc::clone(&self.tasks), self.metrics.clone(), id.clone(), Arc::new(task)));
		id
	}

	/// Latest committed status of `id`, or [`TaskStatus::NotFound`].
	pub async fn status(&self, id: &TaskId) -> TaskStatus {
		self.tasks.get(id).await.map_or(TaskStatus::NotFound, |info| info.status)
	}

	pub async fn len(&self) -> usize {
		self.tasks.len().await
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// Drops every entry older than the retention window. Victims are picked
	/// under the read lock and removed under a separate, short write lock.
	pub async fn sweep_expired(&self) -> usize {
		let now = Instant::now();
		let expired = self.tasks.expired(now, self.config.retention).await;
		if expired.is_empty() {
			return 0;
		}
		self.tasks.remove_expired(&expired, now, self.config.retention).await
	}

	/// Spawns the periodic expiry sweep. The loop ends when `cancel` fires.
	pub fn spawn_expiry_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
		let executor = self.clone();

		tokio::spawn(async move {
			let period = executor.config.sweep_interval;
			let mut ticker = time::interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				tokio::select! {
					() = cancel.cancelled() => {
						debug!("Expiry sweeper cancelled");
						break;
					}
					_ = ticker.tick() => {
						let removed = executor.sweep_expired().await;
						if removed > 0 {
							debug!(removed, "Swept expired task entries");
						}
					}
				}
			}
		})
	}
}

impl Default for TaskExecutor {
	fn default() -> Self {
		Self::new(Config::default())
	}
}

async fn complete_task<T: Task>(tasks: Arc<TaskInfoMap>, metrics: TaskMetrics, id: TaskId, task: Arc<T>) {
	let runner = Arc::clone(&task);
	let run_id = id.clone();
	let outcome = tokio::spawn(async move { runner.run(&run_id).await }).await;
	metrics.in_progress.dec();

	let fault = match outcome {
		Ok(Ok(())) => {
			info!(task = %id, "Task succeeded");
			metrics.succeeded.inc();
			tasks.complete(&id, TaskStatus::Success).await;
			return;
		}
		Ok(Err(e)) => {
			let fault = TaskFault::from_error(&e);
			error!(task = %id, error = %fault, "Task failed");
			metrics.failed.inc();
			fault
		}
		Err(e) => {
			let fault = TaskFault::from_join_error(e);
			error!(task = %id, error = %fault, "Task failed with an internal fault");
			metrics.panicked.inc();
			fault
		}
	};

	let handler_id = id.clone();
	let handler_fault = fault.clone();
	if let Err(e) = tokio::spawn(async move { task.on_failure(&handler_id, &handler_fault).await }).await {
		warn!(task = %id, error = %e, "Failure handler did not run to completion");
	}

	tasks.complete(&id, TaskStatus::Failure).await;
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use tokio::sync::Notify;

	#[derive(Debug, thiserror::Error)]
	#[error("This is the error text.")]
	struct ScriptedError;

	#[derive(Debug, Clone, Copy)]
	enum Outcome {
		Succeed,
		Fail,
		Panic,
	}

	#[derive(Clone)]
	struct ScriptedTask {
		outcome: Outcome,
		gate: Option<Arc<Notify>>,
		failures: Arc<AtomicUsize>,
		last_fault: Arc<Mutex<Option<TaskFault>>>,
	}

	impl ScriptedTask {
		fn new(outcome: Outcome) -> Self {
			Self {
				outcome,
				gate: None,
				failures: Arc::new(AtomicUsize::new(0)),
				last_fault: Arc::new(Mutex::new(None)),
			}
		}

		fn gated(outcome: Outcome) -> (Self, Arc<Notify>) {
			let gate = Arc::new(Notify::new());
			let mut task = Self::new(outcome);
			task.gate = Some(Arc::clone(&gate));
			(task, gate)
		}
	}

	#[async_trait]
	impl Task for ScriptedTask {
		type Error = ScriptedError;

		async fn run(&self, _id: &TaskId) -> Result<(), Self::Error> {
			if let Some(gate) = &self.gate {
				gate.notified().await;
			}
			match self.outcome {
				Outcome::Succeed => Ok(()),
				Outcome::Fail => Err(ScriptedError),
				Outcome::Panic => panic!("AHHH!!!"),
			}
		}

		async fn on_failure(&self, _id: &TaskId, fault: &TaskFault) {
			self.failures.fetch_add(1, Ordering::SeqCst);
			*self.last_fault.lock().unwrap() = Some(fault.clone());
		}
	}

	async fn wait_for_terminal(executor: &TaskExecutor, id: &TaskId) -> TaskStatus {
		time::timeout(Duration::from_secs(5), async {
			loop {
				let status = executor.status(id).await;
				if status.is_terminal() {
					return status;
				}
				time::sleep(Duration::from_millis(1)).await;
			}
		})
		.await
		.expect("task did not finish in time")
	}

	#[tokio::test]
	async fn test_unknown_id_is_not_found() {
		let executor = TaskExecutor::default();
		assert_eq!(executor.status(&TaskId::from("does-not-exist")).await, TaskStatus::NotFound);
	}

	#[tokio::test]
	async fn test_status_in_progress_until_task_finishes() {
		let executor = TaskExecutor::default();
		let (task, gate) = ScriptedTask::gated(Outcome::Succeed);

		let id = executor.submit(task).await;
		assert_eq!(executor.status(&id).await, TaskStatus::InProgress);

		gate.notify_one();
		assert_eq!(wait_for_terminal(&executor, &id).await, TaskStatus::Success);
	}

	#[tokio::test]
	async fn test_task_error_leads_to_failure_status() {
		let executor = TaskExecutor::default();
		let task = ScriptedTask::new(Outcome::Fail);
		let failures = Arc::clone(&task.failures);
		let last_fault = Arc::clone(&task.last_fault);

		let id = executor.submit(task).await;
		assert_eq!(wait_for_terminal(&executor, &id).await, TaskStatus::Failure);
		assert_eq!(failures.load(Ordering::SeqCst), 1);
		assert_eq!(*last_fault.lock().unwrap(), Some(TaskFault::Failed("This is the error text.".into())));
	}

	#[tokio::test]
	async fn test_task_panic_leads_to_failure_status() {
		let executor = TaskExecutor::default();
		let task = ScriptedTask::new(Outcome::Panic);
		let failures = Arc::clone(&task.failures);
		let last_fault = Arc::clone(&task.last_fault);

		let id = executor.submit(task).await;
		assert_eq!(wait_for_terminal(&executor, &id).await, TaskStatus::Failure);
		assert_eq!(failures.load(Ordering::SeqCst), 1);
		assert_eq!(*last_fault.lock().unwrap(), Some(TaskFault::Panicked("AHHH!!!".into())));

		// The executor keeps working after a contained panic.
		let id = executor.submit(ScriptedTask::new(Outcome::Succeed)).await;
		assert_eq!(wait_for_terminal(&executor, &id).await, TaskStatus::Success);
	}

	#[tokio::test]
	async fn test_task_ok_leads_to_success_status() {
		let executor = TaskExecutor::default();
		let task = ScriptedTask::new(Outcome::Succeed);
		let failures = Arc::clone(&task.failures);

		let id = executor.submit(task).await;
		assert_eq!(wait_for_terminal(&executor, &id).await, TaskStatus::Success);
		assert_eq!(failures.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_metrics_track_each_outcome() {
		let executor = TaskExecutor::default();
		let (gated, gate) = ScriptedTask::gated(Outcome::Succeed);
		let running = executor.submit(gated).await;
		assert_eq!(executor.metrics().in_progress.get(), 1.0);

		for outcome in [Outcome::Succeed, Outcome::Fail, Outcome::Panic] {
			let id = executor.submit(ScriptedTask::new(outcome)).await;
			wait_for_terminal(&executor, &id).await;
		}
		gate.notify_one();
		wait_for_terminal(&executor, &running).await;

		let metrics = executor.metrics();
		assert_eq!(metrics.submitted.get(), 4.0);
		assert_eq!(metrics.succeeded.get(), 2.0);
		assert_eq!(metrics.failed.get(), 1.0);
		assert_eq!(metrics.panicked.get(), 1.0);
		assert_eq!(metrics.in_progress.get(), 0.0);
	}

	#[tokio::test]
	async fn test_terminal_status_is_never_overwritten() {
		let map = TaskInfoMap::default();
		let id = TaskId::from("fixed");
		map.put(id.clone(), TaskInfo::started_now()).await;

		assert!(map.complete(&id, TaskStatus::Success).await);
		assert!(!map.complete(&id, TaskStatus::Failure).await);
		assert_eq!(map.get(&id).await.map(|info| info.status), Some(TaskStatus::Success));
		assert!(!map.complete(&TaskId::from("missing"), TaskStatus::Failure).await);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_submissions_get_distinct_ids() {
		let executor = TaskExecutor::default();

		let handles: Vec<_> = (0..64)
			.map(|i| {
				let executor = executor.clone();
				let outcome = if i % 2 == 0 { Outcome::Succeed } else { Outcome::Fail };
				tokio::spawn(async move { (executor.submit(ScriptedTask::new(outcome)).await, outcome) })
			})
			.collect();

		let mut ids = HashSet::new();
		for handle in handles {
			let (id, outcome) = handle.await.unwrap();
			let expected = match outcome {
				Outcome::Succeed => TaskStatus::Success,
				_ => TaskStatus::Failure,
			};
			assert_eq!(wait_for_terminal(&executor, &id).await, expected);
			ids.insert(id);
		}

		assert_eq!(ids.len(), 64);
		assert_eq!(executor.len().await, 64);
	}

	#[tokio::test(start_paused = true)]
	async fn test_sweep_keeps_entries_within_retention() {
		let executor = TaskExecutor::new(Config {
			retention: Duration::from_secs(10),
			sweep_interval: Duration::from_secs(3),
		});
		let (task, _gate) = ScriptedTask::gated(Outcome::Succeed);
		let id = executor.submit(task).await;

		time::advance(Duration::from_secs(9)).await;
		assert_eq!(executor.sweep_expired().await, 0);
		assert_eq!(executor.status(&id).await, TaskStatus::InProgress);

		time::advance(Duration::from_secs(2)).await;
		assert_eq!(executor.sweep_expired().await, 1);
		assert_eq!(executor.status(&id).await, TaskStatus::NotFound);
		assert!(executor.is_empty().await);
	}

	#[tokio::test(start_paused = true)]
	async fn test_background_sweeper_expires_entries() {
		let config = Config {
			retention: Duration::from_secs(10),
			sweep_interval: Duration::from_secs(3),
		};
		let executor = TaskExecutor::new(config.clone());
		let cancel = CancellationToken::new();
		let sweeper = executor.spawn_expiry_sweeper(cancel.clone());

		let done = executor.submit(ScriptedTask::new(Outcome::Succeed)).await;
		let (task, gate) = ScriptedTask::gated(Outcome::Succeed);
		let running = executor.submit(task).await;
		assert_eq!(wait_for_terminal(&executor, &done).await, TaskStatus::Success);

		time::sleep(config.retention - Duration::from_secs(1)).await;
		assert_eq!(executor.status(&done).await, TaskStatus::Success);
		assert_eq!(executor.status(&running).await, TaskStatus::InProgress);

		time::sleep(config.sweep_interval + Duration::from_secs(2)).await;
		assert_eq!(executor.status(&done).await, TaskStatus::NotFound);
		assert_eq!(executor.status(&running).await, TaskStatus::NotFound);

		// Sweeping only forgets the status; the task itself keeps running and
		// finishing it must not resurrect the entry.
		gate.notify_one();
		time::sleep(Duration::from_millis(10)).await;
		assert_eq!(executor.status(&running).await, TaskStatus::NotFound);

		cancel.cancel();
		sweeper.await.unwrap();
	}
}
