//! Location registry
//!
//! Owns one refresh coordinator per configured location entry, keyed by
//! entry id. Setup runs the first refresh before anything is registered;
//! unload cancels the schedule and drops the coordinator.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use domain::value_objects::{GeoLocation, PollingOffset};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ApplicationError, UpdateFailed},
    ports::{ScheduledTask, SchedulerPort, WeatherPort},
    services::weather_coordinator::{
        DEFAULT_REFRESH_TIMEOUT, DEFAULT_UPDATE_INTERVAL, WeatherCoordinator,
    },
};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The initial refresh failed; nothing was registered
    #[error("Location entry '{entry_id}' is not ready: {source}")]
    NotReady {
        /// Entry that failed to set up
        entry_id: String,
        /// Why the initial refresh failed
        source: UpdateFailed,
    },

    /// Entry id or location already registered
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    /// No entry with this id
    #[error("Location entry not found: {0}")]
    NotFound(String),

    /// The periodic refresh could not be scheduled
    #[error("Failed to schedule refresh for '{entry_id}': {source}")]
    Scheduling {
        /// Entry that failed to set up
        entry_id: String,
        /// Scheduler error
        source: ApplicationError,
    },
}

/// One configured location
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntry {
    /// Registration key
    pub entry_id: String,
    /// Display name
    pub name: String,
    /// Coordinates to poll
    pub location: GeoLocation,
    /// Offset passed to the forecast call
    pub offset: PollingOffset,
}

impl LocationEntry {
    /// Create an entry whose id is the location's unique id
    pub fn new(name: impl Into<String>, location: GeoLocation, offset: PollingOffset) -> Self {
        Self {
            entry_id: location.unique_id(),
            name: name.into(),
            location,
            offset,
        }
    }

    /// Override the registration key
    #[must_use]
    pub fn with_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = entry_id.into();
        self
    }
}

/// Settings applied to every coordinator the registry creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Time between scheduled refreshes
    pub update_interval: Duration,
    /// Bound on one refresh
    pub refresh_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

struct Registration {
    entry: LocationEntry,
    coordinator: Arc<WeatherCoordinator>,
    schedule: Box<dyn ScheduledTask>,
}

/// Host-side owner of all location coordinators
pub struct LocationRegistry {
    weather: Arc<dyn WeatherPort>,
    scheduler: Arc<dyn SchedulerPort>,
    settings: CoordinatorSettings,
    entries: RwLock<HashMap<String, Registration>>,
}

impl fmt::Debug for LocationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationRegistry")
            .field("settings", &self.settings)
            .field("entry_count", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

impl LocationRegistry {
    /// Create an empty registry
    pub fn new(
        weather: Arc<dyn WeatherPort>,
        scheduler: Arc<dyn SchedulerPort>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            weather,
            scheduler,
            settings,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Set up a location: create its coordinator, run the initial refresh,
    /// then schedule periodic refreshes and register it
    ///
    /// Fails with [`RegistryError::NotReady`] if the initial refresh fails,
    /// leaving the registry unchanged.
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    pub async fn setup(
        &self,
        entry: LocationEntry,
    ) -> Result<Arc<WeatherCoordinator>, RegistryError> {
        self.ensure_vacant(&entry)?;

        debug!(
            lat = entry.location.latitude(),
            lon = entry.location.longitude(),
            offset = entry.offset.hours(),
            "Using location"
        );

        let coordinator = Arc::new(
            WeatherCoordinator::new(
                entry.name.clone(),
                entry.location,
                entry.offset,
                Arc::clone(&self.weather),
            )
            .with_update_interval(self.settings.update_interval)
            .with_refresh_timeout(self.settings.refresh_timeout),
        );

        if let Err(source) = coordinator.refresh().await {
            warn!(error = %source, "Initial refresh failed, location not ready");
            return Err(RegistryError::NotReady {
                entry_id: entry.entry_id,
                source,
            });
        }

        let schedule = coordinator
            .start(self.scheduler.as_ref())
            .await
            .map_err(|source| RegistryError::Scheduling {
                entry_id: entry.entry_id.clone(),
                source,
            })?;

        let entry_id = entry.entry_id.clone();
        {
            let mut entries = self.entries.write();
            if entries.contains_key(&entry_id) {
                // Lost a race with a concurrent setup of the same entry
                schedule.cancel();
                return Err(RegistryError::AlreadyRegistered(entry_id));
            }
            entries.insert(
                entry_id.clone(),
                Registration {
                    entry,
                    coordinator: Arc::clone(&coordinator),
                    schedule,
                },
            );
        }

        info!(unique_id = %coordinator.unique_id(), "Location set up");
        Ok(coordinator)
    }

    /// Unload a location: deregister it and cancel its schedule
    #[instrument(skip(self))]
    pub fn unload(&self, entry_id: &str) -> Result<(), RegistryError> {
        let registration = self
            .entries
            .write()
            .remove(entry_id)
            .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;

        registration.schedule.cancel();
        info!(name = %registration.entry.name, "Location unloaded");
        Ok(())
    }

    /// Apply a changed configuration: unload the entry if present, then set
    /// it up again
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    pub async fn reload(
        &self,
        entry: LocationEntry,
    ) -> Result<Arc<WeatherCoordinator>, RegistryError> {
        match self.unload(&entry.entry_id) {
            Ok(()) | Err(RegistryError::NotFound(_)) => {},
            Err(e) => return Err(e),
        }
        self.setup(entry).await
    }

    /// Unload every entry, returning how many were removed
    pub fn unload_all(&self) -> usize {
        let drained: Vec<Registration> = self.entries.write().drain().map(|(_, r)| r).collect();
        for registration in &drained {
            registration.schedule.cancel();
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "All locations unloaded");
        }
        drained.len()
    }

    /// Coordinator registered under `entry_id`
    pub fn get(&self, entry_id: &str) -> Option<Arc<WeatherCoordinator>> {
        self.entries
            .read()
            .get(entry_id)
            .map(|r| Arc::clone(&r.coordinator))
    }

    /// Configuration registered under `entry_id`
    pub fn entry(&self, entry_id: &str) -> Option<LocationEntry> {
        self.entries.read().get(entry_id).map(|r| r.entry.clone())
    }

    /// Registered entry ids, sorted
    pub fn entry_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no entry is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_vacant(&self, entry: &LocationEntry) -> Result<(), RegistryError> {
        let entries = self.entries.read();
        if entries.contains_key(&entry.entry_id) {
            return Err(RegistryError::AlreadyRegistered(entry.entry_id.clone()));
        }
        let unique_id = entry.location.unique_id();
        if entries
            .values()
            .any(|r| r.coordinator.unique_id() == unique_id)
        {
            return Err(RegistryError::AlreadyRegistered(unique_id));
        }
        Ok(())
    }
}
