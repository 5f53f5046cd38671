//! Simulates a single driver closing in on a station, with geofence entry detection and live
//! distance/ETA telemetry.
//!
//! ```ignore
//! use driver_sim::{SimulatorConfig, SimulatorRunner, Station, geo::Point};
//!
//! let runner = SimulatorRunner::new(SimulatorConfig::default())?;
//! let mut events = runner.subscribe_events();
//!
//! runner.start(Some(Station::new("station-1", Point::new(37.7749, -122.4194)?)));
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod config;
pub mod geo;
pub mod run;
pub mod runner;
pub mod simulator;
pub mod state_machine;
pub mod station;

pub use config::{ConfigError, SimulatorConfig};
pub use run::RunId;
pub use runner::SimulatorRunner;
pub use simulator::state::{SimulationState, Telemetry};
pub use simulator::{DriverSimulator, Phase, SimulatorEvent, SimulatorInput};
pub use station::{Station, StationId};
