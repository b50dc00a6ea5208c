//! Weather poller CLI
//!
//! Host binary: polls every configured location on a fixed interval, or
//! performs one-off fetches for ad-hoc coordinates.

#![allow(clippy::print_stdout)]

mod supervisor;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use application::{LocationRegistry, SchedulerPort, WeatherCoordinator, WeatherPort, WeatherView};
use clap::{Parser, Subcommand};
use domain::{GeoLocation, PollingOffset};
use infrastructure::{AppConfig, IntervalScheduler, WeatherAdapter, init_telemetry};
use integration_weather::WeatherConfig;
use supervisor::{LocationSupervisor, SETUP_RETRY_DELAY};
use tracing::{error, info};

/// Weather poller
#[derive(Parser)]
#[command(name = "weather-poller")]
#[command(author, version, about = "Periodic weather polling for configured locations", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./config.toml if present)
    #[arg(short, long, env = "WEATHER_POLLER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every configured location until interrupted
    Run,

    /// Fetch weather once for the given coordinates and print it as JSON
    ///
    /// Example: weather-poller fetch --latitude 60.17 --longitude 24.94 --offset 3
    Fetch {
        /// Latitude (-90.0 to 90.0)
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        /// Longitude (-180.0 to 180.0)
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Forecast offset in hours
        #[arg(long, default_value_t = PollingOffset::DEFAULT.hours())]
        offset: u8,

        /// Display name
        #[arg(long, default_value = "Weather")]
        name: String,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Check that the weather provider is reachable
    Health,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        filter.clone_into(&mut config.telemetry.log_filter);
    }
    Ok(config)
}

fn weather_adapter(config: &AppConfig) -> anyhow::Result<Arc<WeatherAdapter>> {
    let adapter = WeatherAdapter::with_config(WeatherConfig::from(&config.weather))
        .context("creating weather client")?;
    Ok(Arc::new(adapter))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run => run(cli.config.as_deref(), &config).await,
        Commands::Fetch {
            latitude,
            longitude,
            offset,
            name,
        } => fetch(&config, &name, latitude, longitude, offset).await,
        Commands::Config => {
            println!("{}", config.to_toml()?);
            Ok(())
        },
        Commands::Health => {
            let adapter = weather_adapter(&config)?;
            if adapter.is_available().await {
                println!("ok");
                Ok(())
            } else {
                bail!("weather provider at {} is not reachable", config.weather.base_url)
            }
        },
    }
}

async fn fetch(
    config: &AppConfig,
    name: &str,
    latitude: f64,
    longitude: f64,
    offset: u8,
) -> anyhow::Result<()> {
    let location = GeoLocation::new(latitude, longitude)?;
    let offset = PollingOffset::new(offset)?;
    let coordinator = WeatherCoordinator::new(name, location, offset, weather_adapter(config)?)
        .with_refresh_timeout(config.coordinator.to_settings().refresh_timeout);

    coordinator.refresh().await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&WeatherView::of(&coordinator))?
    );
    Ok(())
}

async fn run(config_path: Option<&Path>, config: &AppConfig) -> anyhow::Result<()> {
    let entries = config.location_entries()?;
    if entries.is_empty() {
        bail!("no locations configured; add [[locations]] to the configuration file");
    }

    let scheduler = Arc::new(
        IntervalScheduler::new()
            .await
            .context("starting scheduler")?,
    );
    let scheduler_port: Arc<dyn SchedulerPort> = scheduler.clone();
    let registry = Arc::new(LocationRegistry::new(
        weather_adapter(config)?,
        scheduler_port,
        config.coordinator.to_settings(),
    ));
    let mut hangups = Hangup::install().context("installing SIGHUP handler")?;

    let mut supervisor = LocationSupervisor::new(registry, SETUP_RETRY_DELAY);
    supervisor.apply(entries).await;
    info!(
        locations = supervisor.supervised_count(),
        "Weather poller running"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.context("waiting for shutdown signal")?;
                break;
            },
            () = hangups.recv() => reload_locations(config_path, &mut supervisor).await,
        }
    }

    info!("Shutting down");
    for stats in scheduler.get_all_stats() {
        info!(
            task = %stats.name,
            success_count = stats.success_count,
            failure_count = stats.failure_count,
            skipped_count = stats.skipped_count,
            avg_duration_ms = stats.avg_duration_ms,
            "Refresh task summary"
        );
    }
    let unloaded = supervisor.shutdown().await;
    scheduler.shutdown().await.context("stopping scheduler")?;
    info!(unloaded, "Weather poller stopped");
    Ok(())
}

/// Re-read the configuration and apply its `[[locations]]`
///
/// Other sections only take effect on restart. An unreadable file keeps
/// the running locations untouched.
async fn reload_locations(config_path: Option<&Path>, supervisor: &mut LocationSupervisor) {
    info!("Received SIGHUP, reloading configuration");
    let entries = match AppConfig::load_from(config_path).and_then(|c| c.location_entries()) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "Configuration reload failed, keeping previous locations");
            return;
        },
    };

    let plan = supervisor.apply(entries).await;
    if plan.is_empty() {
        info!("Configuration reloaded, locations unchanged");
        return;
    }
    info!(
        added = plan.added.len(),
        changed = plan.changed.len(),
        removed = plan.removed.len(),
        "Configuration reloaded"
    );
}

/// SIGHUP listener; never fires where the signal does not exist
struct Hangup {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Hangup {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            signal: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        tracing::warn!("SIGHUP config reload not supported on this platform");
        Ok(Self {})
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        if self.signal.recv().await.is_some() {
            return;
        }
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_verbosity_zero_keeps_config() {
        assert_eq!(log_filter_from_verbosity(0), None);
    }

    #[test]
    fn log_filter_verbosity_levels() {
        assert_eq!(log_filter_from_verbosity(1), Some("info"));
        assert_eq!(log_filter_from_verbosity(2), Some("debug"));
        assert_eq!(log_filter_from_verbosity(3), Some("trace"));
        assert_eq!(log_filter_from_verbosity(10), Some("trace"));
    }

    #[test]
    fn fetch_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "weather-poller",
            "fetch",
            "--latitude",
            "-33.87",
            "--longitude",
            "151.21",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch {
                latitude,
                longitude,
                offset,
                ..
            } => {
                assert!((latitude + 33.87).abs() < f64::EPSILON);
                assert!((longitude - 151.21).abs() < f64::EPSILON);
                assert_eq!(offset, 1);
            },
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["weather-poller", "run", "--config", "/etc/poller.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/poller.toml")));
        assert!(matches!(cli.command, Commands::Run));
    }
}
