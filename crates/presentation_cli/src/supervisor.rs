//! Location supervision for `weather-poller run`
//!
//! One background task per configured location sets the location up,
//! retrying while the provider is not ready, and then logs every snapshot
//! it publishes. A reloaded configuration is applied as a diff against
//! the supervised entries.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use application::{LocationEntry, LocationRegistry, RegistryError, WeatherCoordinator, WeatherView};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Delay before retrying a location whose initial refresh failed
pub const SETUP_RETRY_DELAY: Duration = Duration::from_secs(60);

/// First registry call made for a supervised entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Setup,
    Reload,
}

/// Difference between supervised and configured locations
#[derive(Debug, Default, PartialEq)]
pub struct LocationPlan {
    /// Entries not supervised yet
    pub added: Vec<LocationEntry>,
    /// Supervised entries whose configuration differs
    pub changed: Vec<LocationEntry>,
    /// Supervised entry ids no longer configured, sorted
    pub removed: Vec<String>,
}

impl LocationPlan {
    /// Compare `current` (by entry id) with the `wanted` configuration
    ///
    /// A repeated entry id in `wanted` keeps its first occurrence.
    pub fn between(current: &HashMap<String, LocationEntry>, wanted: Vec<LocationEntry>) -> Self {
        let mut plan = Self::default();
        let mut seen = HashSet::new();

        for entry in wanted {
            if !seen.insert(entry.entry_id.clone()) {
                warn!(entry_id = %entry.entry_id, "Duplicate location entry ignored");
                continue;
            }
            match current.get(&entry.entry_id) {
                None => plan.added.push(entry),
                Some(existing) if *existing != entry => plan.changed.push(entry),
                Some(_) => {},
            }
        }

        plan.removed = current
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        plan.removed.sort();
        plan
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Owns the background task of every configured location
pub struct LocationSupervisor {
    registry: Arc<LocationRegistry>,
    retry_delay: Duration,
    tasks: HashMap<String, (LocationEntry, JoinHandle<()>)>,
}

impl std::fmt::Debug for LocationSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSupervisor")
            .field("retry_delay", &self.retry_delay)
            .field("supervised", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl LocationSupervisor {
    /// Create a supervisor with no locations
    pub fn new(registry: Arc<LocationRegistry>, retry_delay: Duration) -> Self {
        Self {
            registry,
            retry_delay,
            tasks: HashMap::new(),
        }
    }

    /// Number of supervised entries, ready or not
    pub fn supervised_count(&self) -> usize {
        self.tasks.len()
    }

    /// Bring the supervised set in line with `wanted`
    ///
    /// Removed entries are unloaded, changed entries go through
    /// [`LocationRegistry::reload`], added entries through
    /// [`LocationRegistry::setup`]. Either path retries a not-ready entry.
    pub async fn apply(&mut self, wanted: Vec<LocationEntry>) -> LocationPlan {
        let current: HashMap<String, LocationEntry> = self
            .tasks
            .iter()
            .map(|(id, (entry, _))| (id.clone(), entry.clone()))
            .collect();
        let plan = LocationPlan::between(&current, wanted);

        for entry_id in &plan.removed {
            self.stop(entry_id).await;
            match self.registry.unload(entry_id) {
                Ok(()) | Err(RegistryError::NotFound(_)) => {},
                Err(e) => warn!(entry_id = %entry_id, error = %e, "Failed to unload location"),
            }
        }
        for entry in &plan.changed {
            self.stop(&entry.entry_id).await;
            self.spawn(entry.clone(), Lifecycle::Reload);
        }
        for entry in &plan.added {
            self.spawn(entry.clone(), Lifecycle::Setup);
        }
        plan
    }

    /// Stop every background task and unload all locations
    pub async fn shutdown(&mut self) -> usize {
        let entry_ids: Vec<String> = self.tasks.keys().cloned().collect();
        for entry_id in &entry_ids {
            self.stop(entry_id).await;
        }
        self.registry.unload_all()
    }

    fn spawn(&mut self, entry: LocationEntry, lifecycle: Lifecycle) {
        let task = tokio::spawn(supervise(
            Arc::clone(&self.registry),
            entry.clone(),
            lifecycle,
            self.retry_delay,
        ));
        self.tasks.insert(entry.entry_id.clone(), (entry, task));
    }

    async fn stop(&mut self, entry_id: &str) {
        if let Some((_, task)) = self.tasks.remove(entry_id) {
            task.abort();
            // Wait so an in-flight setup cannot register after this returns
            let _ = task.await;
        }
    }
}

async fn supervise(
    registry: Arc<LocationRegistry>,
    entry: LocationEntry,
    lifecycle: Lifecycle,
    retry_delay: Duration,
) {
    let mut attempt = lifecycle;
    let coordinator = loop {
        let result = match attempt {
            Lifecycle::Setup => registry.setup(entry.clone()).await,
            Lifecycle::Reload => registry.reload(entry.clone()).await,
        };
        match result {
            Ok(coordinator) => break coordinator,
            Err(e @ RegistryError::NotReady { .. }) => {
                warn!(
                    entry_id = %entry.entry_id,
                    error = %e,
                    retry_in_secs = retry_delay.as_secs(),
                    "Location not ready, retrying"
                );
                // A reload has already dropped the previous registration
                attempt = Lifecycle::Setup;
                tokio::time::sleep(retry_delay).await;
            },
            Err(e) => {
                error!(entry_id = %entry.entry_id, error = %e, "Location setup failed");
                return;
            },
        }
    };

    match lifecycle {
        Lifecycle::Setup => info!(entry_id = %entry.entry_id, "Location active"),
        Lifecycle::Reload => info!(
            entry_id = %entry.entry_id,
            offset = entry.offset.hours(),
            "Location reloaded"
        ),
    }

    let mut updates = coordinator.subscribe();
    log_snapshot(&coordinator);
    while updates.changed().await.is_ok() {
        log_snapshot(&coordinator);
    }
}

fn log_snapshot(coordinator: &WeatherCoordinator) {
    let view = WeatherView::of(coordinator);
    info!(
        name = %view.name,
        unique_id = %view.unique_id,
        offset = coordinator.offset().hours(),
        temperature = ?view.temperature,
        humidity = ?view.humidity,
        wind_speed = ?view.wind_speed,
        condition = ?view.condition.map(|c| c.description()),
        forecast_entries = view.forecast.as_ref().map_or(0, Vec::len),
        "Weather updated"
    );
}

#[cfg(test)]
mod tests {
    use domain::{GeoLocation, PollingOffset};

    use super::*;

    fn entry(name: &str, lat: f64, offset: u8) -> LocationEntry {
        LocationEntry::new(
            name,
            GeoLocation::new(lat, 24.94).unwrap(),
            PollingOffset::new(offset).unwrap(),
        )
    }

    fn supervised(entries: &[LocationEntry]) -> HashMap<String, LocationEntry> {
        entries
            .iter()
            .map(|e| (e.entry_id.clone(), e.clone()))
            .collect()
    }

    #[test]
    fn plan_from_nothing_adds_everything() {
        let wanted = vec![entry("Helsinki", 60.17, 1), entry("Espoo", 60.21, 1)];

        let plan = LocationPlan::between(&HashMap::new(), wanted.clone());

        assert_eq!(plan.added, wanted);
        assert!(plan.changed.is_empty());
        assert!(plan.removed.is_empty());
    }

    #[test]
    fn unchanged_configuration_is_empty_plan() {
        let current = vec![entry("Helsinki", 60.17, 1)];

        let plan = LocationPlan::between(&supervised(&current), current.clone());

        assert!(plan.is_empty());
    }

    #[test]
    fn new_offset_is_a_change() {
        let current = vec![entry("Helsinki", 60.17, 1)];

        let plan = LocationPlan::between(&supervised(&current), vec![entry("Helsinki", 60.17, 3)]);

        assert!(plan.added.is_empty());
        assert!(plan.removed.is_empty());
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].offset.hours(), 3);
    }

    #[test]
    fn renamed_location_is_a_change() {
        let current = vec![entry("Helsinki", 60.17, 1)];

        let plan = LocationPlan::between(&supervised(&current), vec![entry("Stadi", 60.17, 1)]);

        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.changed[0].name, "Stadi");
    }

    #[test]
    fn moved_coordinates_replace_the_entry() {
        let current = vec![entry("Helsinki", 60.17, 1), entry("Espoo", 60.21, 1)];

        let plan = LocationPlan::between(
            &supervised(&current),
            vec![entry("Helsinki", 60.17, 1), entry("Vantaa", 60.29, 1)],
        );

        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].entry_id, "60.29_24.94");
        assert_eq!(plan.removed, vec!["60.21_24.94".to_string()]);
        assert!(plan.changed.is_empty());
    }

    #[test]
    fn repeated_entry_id_keeps_first() {
        let wanted = vec![entry("Helsinki", 60.17, 1), entry("Helsinki again", 60.17, 2)];

        let plan = LocationPlan::between(&HashMap::new(), wanted);

        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].name, "Helsinki");
    }

    #[test]
    fn emptied_configuration_removes_everything_sorted() {
        let current = vec![entry("Vantaa", 60.29, 1), entry("Helsinki", 60.17, 1)];

        let plan = LocationPlan::between(&supervised(&current), Vec::new());

        assert_eq!(
            plan.removed,
            vec!["60.17_24.94".to_string(), "60.29_24.94".to_string()]
        );
    }
}
