//! Fixed-interval task scheduler for recurring tasks
//!
//! Backs [`SchedulerPort`] with `tokio-cron-scheduler` repeated jobs. A
//! tick that fires while the previous run of the same task is still in
//! progress is skipped, so runs never overlap and missed ticks are never
//! fired in a burst.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use application::{
    error::ApplicationError,
    ports::{PeriodicTask, ScheduledTask, SchedulerPort},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::{runtime::Handle, sync::Mutex as AsyncMutex};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Shortest interval a repeated job supports
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Interval below [`MIN_INTERVAL`]
    #[error("Invalid interval for task '{0}': must be at least one second")]
    InvalidInterval(String),

    /// A task with this name is already scheduled
    #[error("Task already scheduled: {0}")]
    DuplicateTask(String),

    /// Scheduler failed to start
    #[error("Scheduler failed to start: {0}")]
    StartupFailed(String),

    /// Internal scheduler error
    #[error("Internal scheduler error: {0}")]
    Internal(String),
}

impl From<JobSchedulerError> for SchedulerError {
    fn from(err: JobSchedulerError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SchedulerError> for ApplicationError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidInterval(_) | SchedulerError::DuplicateTask(_) => {
                Self::InvalidOperation(err.to_string())
            },
            SchedulerError::StartupFailed(_) | SchedulerError::Internal(_) => {
                Self::Internal(err.to_string())
            },
        }
    }
}

/// Task status for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for the next tick
    Scheduled,
    /// A run is in progress
    Running,
    /// Cancelled; no further runs
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Running => write!(f, "running"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Statistics for a scheduled task
#[derive(Debug, Clone)]
pub struct TaskStats {
    /// Task name
    pub name: String,
    /// Time between runs
    pub interval: Duration,
    /// Current status
    pub status: TaskStatus,
    /// Number of successful executions
    pub success_count: u64,
    /// Number of failed executions
    pub failure_count: u64,
    /// Ticks dropped because the previous run was still in progress
    pub skipped_count: u64,
    /// Last execution time
    pub last_run: Option<DateTime<Utc>>,
    /// Last error message
    pub last_error: Option<String>,
    /// Average execution duration in milliseconds
    pub avg_duration_ms: u64,
}

struct TaskMetadata {
    name: String,
    interval: Duration,
    running: AtomicBool,
    cancelled: AtomicBool,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    skipped_count: AtomicU64,
    total_duration_ms: AtomicU64,
    last_run: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl TaskMetadata {
    fn new(name: String, interval: Duration) -> Self {
        Self {
            name,
            interval,
            running: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            skipped_count: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            last_run: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    fn status(&self) -> TaskStatus {
        if self.cancelled.load(Ordering::Relaxed) {
            TaskStatus::Cancelled
        } else if self.running.load(Ordering::Relaxed) {
            TaskStatus::Running
        } else {
            TaskStatus::Scheduled
        }
    }

    fn to_stats(&self) -> TaskStats {
        let success = self.success_count.load(Ordering::Relaxed);
        let failure = self.failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        let avg_duration = if total > 0 {
            self.total_duration_ms.load(Ordering::Relaxed) / total
        } else {
            0
        };

        TaskStats {
            name: self.name.clone(),
            interval: self.interval,
            status: self.status(),
            success_count: success,
            failure_count: failure,
            skipped_count: self.skipped_count.load(Ordering::Relaxed),
            last_run: *self.last_run.read(),
            last_error: self.last_error.read().clone(),
            avg_duration_ms: avg_duration,
        }
    }

    fn record(&self, result: &Result<(), String>, duration_ms: u64) {
        self.total_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
        *self.last_run.write() = Some(Utc::now());
        match result {
            Ok(()) => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                *self.last_error.write() = Some(e.clone());
            },
        }
    }
}

/// One tick of a repeated job
async fn run_tick(metadata: &TaskMetadata, task: &PeriodicTask) {
    let name = &metadata.name;
    if metadata.cancelled.load(Ordering::Acquire) {
        return;
    }
    if metadata.running.swap(true, Ordering::AcqRel) {
        metadata.skipped_count.fetch_add(1, Ordering::Relaxed);
        debug!(task = %name, "Previous run still in progress, skipping tick");
        return;
    }

    debug!(task = %name, "Starting scheduled task");
    let started = Instant::now();
    let result = task().await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    metadata.record(&result, duration_ms);
    metadata.running.store(false, Ordering::Release);

    match result {
        Ok(()) => debug!(task = %name, duration_ms, "Task completed successfully"),
        Err(e) => warn!(task = %name, error = %e, duration_ms, "Task failed"),
    }
}

type TaskTable = Arc<RwLock<HashMap<String, Arc<TaskMetadata>>>>;

fn forget(tasks: &TaskTable, metadata: &Arc<TaskMetadata>) {
    let mut tasks = tasks.write();
    if tasks
        .get(&metadata.name)
        .is_some_and(|m| Arc::ptr_eq(m, metadata))
    {
        tasks.remove(&metadata.name);
    }
}

/// Periodic task scheduler backed by a running [`JobScheduler`]
#[derive(Clone)]
pub struct IntervalScheduler {
    scheduler: Arc<AsyncMutex<JobScheduler>>,
    tasks: TaskTable,
}

impl std::fmt::Debug for IntervalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalScheduler")
            .field("task_count", &self.task_count())
            .finish_non_exhaustive()
    }
}

impl IntervalScheduler {
    /// Create and start a scheduler with no tasks
    #[instrument]
    pub async fn new() -> Result<Self, SchedulerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;
        let scheduler = Arc::new(AsyncMutex::new(scheduler));
        scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        info!("Interval scheduler started");
        Ok(Self {
            scheduler,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Schedule `task` to run every `interval`, first one `interval` from now
    #[instrument(skip(self, task))]
    pub async fn spawn_periodic(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<IntervalTaskHandle, SchedulerError> {
        if interval < MIN_INTERVAL {
            return Err(SchedulerError::InvalidInterval(name.to_string()));
        }

        let metadata = Arc::new(TaskMetadata::new(name.to_string(), interval));
        {
            let mut tasks = self.tasks.write();
            if tasks.contains_key(name) {
                return Err(SchedulerError::DuplicateTask(name.to_string()));
            }
            tasks.insert(name.to_string(), Arc::clone(&metadata));
        }

        let job_id = match self.add_job(interval, Arc::clone(&metadata), task).await {
            Ok(job_id) => job_id,
            Err(e) => {
                forget(&self.tasks, &metadata);
                return Err(e);
            },
        };

        info!(task = %name, interval_secs = interval.as_secs(), "Task scheduled");
        Ok(IntervalTaskHandle {
            job_id,
            metadata,
            scheduler: Arc::clone(&self.scheduler),
            tasks: Arc::clone(&self.tasks),
        })
    }

    async fn add_job(
        &self,
        interval: Duration,
        metadata: Arc<TaskMetadata>,
        task: PeriodicTask,
    ) -> Result<Uuid, SchedulerError> {
        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let metadata = Arc::clone(&metadata);
            let task = Arc::clone(&task);
            Box::pin(async move { run_tick(&metadata, &task).await })
        })?;
        Ok(self.scheduler.lock().await.add(job).await?)
    }

    /// Statistics for all tasks, sorted by name
    #[must_use]
    pub fn get_all_stats(&self) -> Vec<TaskStats> {
        let mut stats: Vec<TaskStats> = self.tasks.read().values().map(|m| m.to_stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Get the number of scheduled tasks
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    /// Stop the underlying job scheduler; no task runs afterwards
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        for metadata in self.tasks.write().drain().map(|(_, m)| m) {
            metadata.cancelled.store(true, Ordering::Release);
        }
        self.scheduler.lock().await.shutdown().await?;
        info!("Interval scheduler stopped");
        Ok(())
    }
}

#[async_trait]
impl SchedulerPort for IntervalScheduler {
    async fn schedule_periodic(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<Box<dyn ScheduledTask>, ApplicationError> {
        let handle = self.spawn_periodic(name, interval, task).await?;
        Ok(Box::new(handle))
    }
}

/// Handle to a task scheduled by [`IntervalScheduler`]
///
/// Dropping the handle cancels the task.
pub struct IntervalTaskHandle {
    job_id: Uuid,
    metadata: Arc<TaskMetadata>,
    scheduler: Arc<AsyncMutex<JobScheduler>>,
    tasks: TaskTable,
}

impl std::fmt::Debug for IntervalTaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTaskHandle")
            .field("name", &self.metadata.name)
            .field("job_id", &self.job_id)
            .field("status", &self.metadata.status())
            .finish_non_exhaustive()
    }
}

impl IntervalTaskHandle {
    /// Snapshot of this task's statistics
    pub fn stats(&self) -> TaskStats {
        self.metadata.to_stats()
    }
}

impl ScheduledTask for IntervalTaskHandle {
    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn cancel(&self) {
        if self.metadata.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        forget(&self.tasks, &self.metadata);

        // Ticks already check the cancelled flag; removing the job only
        // frees it inside the job scheduler.
        if let Ok(runtime) = Handle::try_current() {
            let scheduler = Arc::clone(&self.scheduler);
            let job_id = self.job_id;
            let name = self.metadata.name.clone();
            runtime.spawn(async move {
                if let Err(e) = scheduler.lock().await.remove(&job_id).await {
                    warn!(task = %name, error = %e, "Failed to remove cancelled job");
                }
            });
        }
        info!(task = %self.metadata.name, "Task cancelled");
    }

    fn is_active(&self) -> bool {
        !self.metadata.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for IntervalTaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
