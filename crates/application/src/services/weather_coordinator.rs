//! Weather refresh coordinator
//!
//! Polls one location: fetches current conditions and a forecast under a
//! single time bound and keeps the latest successful pair.

use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use domain::value_objects::{GeoLocation, PollingOffset};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ApplicationError, UpdateFailed},
    ports::{
        CurrentWeather, Forecast, PeriodicTask, ScheduledTask, SchedulerPort, TaskFuture,
        WeatherPort,
    },
};

/// Default time between scheduled refreshes
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default bound on one refresh (both provider calls together)
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// The latest successfully fetched pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    /// Current conditions as returned by the provider
    pub current: CurrentWeather,
    /// Forecast as returned by the provider
    pub forecast: Forecast,
    /// When the refresh that produced this snapshot finished
    pub fetched_at: DateTime<Utc>,
}

/// Outcome bookkeeping across refresh cycles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    /// Whether the most recent refresh succeeded (false before the first one)
    pub last_update_success: bool,
    /// Time of the last successful refresh
    pub last_success_at: Option<DateTime<Utc>>,
    /// Time of the last failed refresh
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Message of the last failure
    pub last_error: Option<String>,
    /// Number of successful refreshes
    pub success_count: u64,
    /// Number of failed refreshes
    pub failure_count: u64,
}

/// Keeps the latest weather for one location fresh
///
/// Created once per registered location and discarded on unload. Stored
/// conditions and forecast start empty and are only ever replaced together,
/// after both provider calls of a cycle succeed.
pub struct WeatherCoordinator {
    name: String,
    location: GeoLocation,
    offset: PollingOffset,
    unique_id: String,
    update_interval: Duration,
    refresh_timeout: Duration,
    weather: Arc<dyn WeatherPort>,
    status: RwLock<RefreshStatus>,
    refresh_lock: AsyncMutex<()>,
    snapshot_tx: watch::Sender<Option<Arc<WeatherSnapshot>>>,
}

impl fmt::Debug for WeatherCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherCoordinator")
            .field("name", &self.name)
            .field("unique_id", &self.unique_id)
            .field("offset", &self.offset)
            .field("update_interval", &self.update_interval)
            .field("refresh_timeout", &self.refresh_timeout)
            .field("last_update_success", &self.status.read().last_update_success)
            .finish_non_exhaustive()
    }
}

impl WeatherCoordinator {
    /// Create a coordinator for `location`
    ///
    /// The unique id is derived from the coordinates; interval and timeout
    /// take their defaults until overridden with the `with_*` builders.
    pub fn new(
        name: impl Into<String>,
        location: GeoLocation,
        offset: PollingOffset,
        weather: Arc<dyn WeatherPort>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let coordinator = Self {
            name: name.into(),
            unique_id: location.unique_id(),
            location,
            offset,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            weather,
            status: RwLock::new(RefreshStatus::default()),
            refresh_lock: AsyncMutex::new(()),
            snapshot_tx,
        };
        debug!(
            unique_id = %coordinator.unique_id,
            lat = location.latitude(),
            lon = location.longitude(),
            "Weather coordinator created"
        );
        coordinator
    }

    /// Set the scheduling interval
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the bound on one refresh
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Display name of the location
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Polled location
    pub const fn location(&self) -> GeoLocation {
        self.location
    }

    /// Offset passed to the forecast call
    pub const fn offset(&self) -> PollingOffset {
        self.offset
    }

    /// Identifier derived from the coordinates (`{lat}_{lon}`)
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Time between scheduled refreshes
    pub const fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Bound on one refresh
    pub const fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    /// Latest snapshot, if any refresh has succeeded
    pub fn snapshot(&self) -> Option<Arc<WeatherSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    /// Latest current conditions
    pub fn current(&self) -> Option<CurrentWeather> {
        self.snapshot_tx
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.current.clone())
    }

    /// Latest forecast
    pub fn forecast(&self) -> Option<Forecast> {
        self.snapshot_tx
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.forecast.clone())
    }

    /// Whether the most recent refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.status.read().last_update_success
    }

    /// Refresh bookkeeping
    pub fn status(&self) -> RefreshStatus {
        self.status.read().clone()
    }

    /// Receive every new snapshot; the current value is visible immediately
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<WeatherSnapshot>>> {
        self.snapshot_tx.subscribe()
    }

    /// Run one refresh cycle
    ///
    /// Fetches current conditions, then the forecast, both inside one
    /// `refresh_timeout`. Concurrent callers are serialized. On any error
    /// or timeout the stored snapshot is left as it was.
    #[instrument(skip(self), fields(unique_id = %self.unique_id))]
    pub async fn refresh(&self) -> Result<Arc<WeatherSnapshot>, UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;

        let outcome = match tokio::time::timeout(self.refresh_timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(ApplicationError::Timeout(self.refresh_timeout)),
        };

        match outcome {
            Ok((current, forecast)) => {
                let now = Utc::now();
                let snapshot = Arc::new(WeatherSnapshot {
                    current,
                    forecast,
                    fetched_at: now,
                });
                self.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
                {
                    let mut status = self.status.write();
                    status.last_update_success = true;
                    status.last_success_at = Some(now);
                    status.success_count += 1;
                }
                debug!(
                    entries = snapshot.forecast.entries.len(),
                    "Weather data refreshed"
                );
                Ok(snapshot)
            },
            Err(e) => {
                {
                    let mut status = self.status.write();
                    status.last_update_success = false;
                    status.last_failure_at = Some(Utc::now());
                    status.last_error = Some(e.to_string());
                    status.failure_count += 1;
                }
                warn!(error = %e, retryable = e.is_retryable(), "Weather refresh failed");
                Err(UpdateFailed::new(e))
            },
        }
    }

    async fn fetch(&self) -> Result<(CurrentWeather, Forecast), ApplicationError> {
        let current = self.weather.get_current_weather(&self.location).await?;
        let forecast = self.weather.get_forecast(&self.location, self.offset).await?;
        Ok((current, forecast))
    }

    /// Register periodic refreshes with `scheduler`
    ///
    /// The scheduled task only holds a weak reference, so dropping the last
    /// `Arc` turns remaining ticks into no-ops.
    pub async fn start(
        self: &Arc<Self>,
        scheduler: &dyn SchedulerPort,
    ) -> Result<Box<dyn ScheduledTask>, ApplicationError> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let task: PeriodicTask = Arc::new(move || -> TaskFuture {
            let coordinator = weak.upgrade();
            Box::pin(async move {
                match coordinator {
                    Some(coordinator) => coordinator
                        .refresh()
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string()),
                    None => Ok(()),
                }
            })
        });

        let handle = scheduler
            .schedule_periodic(
                &format!("weather-refresh:{}", self.unique_id),
                self.update_interval,
                task,
            )
            .await?;
        info!(
            unique_id = %self.unique_id,
            interval_secs = self.update_interval.as_secs(),
            "Weather refresh scheduled"
        );
        Ok(handle)
    }
}
