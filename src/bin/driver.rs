use anyhow::{Context, Result};
use driver_sim::geo::Point;
use driver_sim::{SimulatorConfig, SimulatorEvent, SimulatorRunner, Station};
use futures::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let station_id = std::env::var("STATION_ID").unwrap_or_else(|_| "station-1".to_string());
    let lat = env_f64("STATION_LAT", 37.7749)?;
    let lon = env_f64("STATION_LON", -122.4194)?;
    let seed = std::env::var("SIM_SEED")
        .ok()
        .map(|s| s.parse::<u64>())
        .transpose()
        .context("SIM_SEED must be an unsigned integer")?;

    let station = Station::new(station_id, Point::new(lat, lon)?);
    let runner = SimulatorRunner::new(SimulatorConfig::builder().maybe_seed(seed).build())?;

    info!(station_id = %station.id, location = %station.location, "Driver heading to station");

    let mut events = BroadcastStream::new(runner.subscribe_events());
    let mut telemetry = WatchStream::from_changes(runner.subscribe_state());
    runner.start(Some(station));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(state) = telemetry.next() => {
                if let Some(t) = state.telemetry() {
                    info!(
                        position = %t.position,
                        distance_m = t.distance_to_target_m,
                        eta_min = t.eta_minutes,
                        inside_geofence = state.inside_geofence(),
                        "Telemetry"
                    );
                }
            }

            Some(event) = events.next() => match event {
                Ok(SimulatorEvent::GeofenceEntered { run_id }) => {
                    info!(run_id = %run_id, "Approaching station: within the geofence");
                }
                Ok(SimulatorEvent::Arrived { run_id }) => {
                    info!(run_id = %run_id, "Arrived at station");
                    break;
                }
                Err(e) => warn!(error = %e, "Missed simulator events"),
            },

            result = &mut shutdown => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Shutting down");
                runner.stop();
                break;
            }

            else => break,
        }
    }

    Ok(())
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number, got {value:?}")),
        Err(_) => Ok(default),
    }
}
