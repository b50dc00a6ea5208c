//! Scheduler port
//!
//! Injected "run this periodically" capability. The refresh coordinator
//! registers itself here instead of owning a timer.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ApplicationError;

/// Future produced by one run of a periodic task
pub type TaskFuture = BoxFuture<'static, Result<(), String>>;

/// Factory invoked on every tick
pub type PeriodicTask = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Handle to a scheduled periodic task
pub trait ScheduledTask: Send + Sync + fmt::Debug {
    /// Task name as registered
    fn name(&self) -> &str;

    /// Stop future runs. A run already in progress is left to finish.
    fn cancel(&self);

    /// Whether the task will still run
    fn is_active(&self) -> bool;
}

/// Port for periodic task scheduling
///
/// Implementations must run the first tick one `interval` after
/// scheduling and must never start a run while the previous one of the
/// same task is still in progress; such a tick is skipped, not queued.
#[async_trait]
pub trait SchedulerPort: Send + Sync {
    /// Schedule `task` to run every `interval`
    async fn schedule_periodic(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<Box<dyn ScheduledTask>, ApplicationError>;
}
