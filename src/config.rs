use std::time::Duration;

use bon::Builder;
use thiserror::Error;

/// Configuration for a simulated run.
///
/// Defaults model a driver on a bicycle: 5 m/s, one step per second, starting 1 km out from a
/// station with a 400 m geofence.
#[derive(Debug, Clone, Builder)]
pub struct SimulatorConfig {
    /// Constant ground speed of the driver.
    #[builder(default = 5.0)]
    pub speed_mps: f64,

    /// Wall-clock time between two ticks, which is also the simulated time each tick covers.
    #[builder(default = Duration::from_secs(1))]
    pub tick_interval: Duration,

    /// Distance from the station at which every run begins.
    #[builder(default = 1_000.0)]
    pub standoff_m: f64,

    /// Radius of the circular geofence around the station.
    #[builder(default = 400.0)]
    pub geofence_radius_m: f64,

    /// A run is complete once the driver is closer than this to the station.
    #[builder(default = 10.0)]
    pub arrival_tolerance_m: f64,

    /// Seed for the initial placement bearing. Drawn from OS entropy when unset.
    pub seed: Option<u64>,
}

/// Errors produced when validating a [`SimulatorConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A distance, speed or interval that must be strictly positive and finite is not.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// A single tick would travel at least the arrival tolerance, so arrival could be skipped.
    #[error("per-tick step of {step_m} m must be smaller than the arrival tolerance of {tolerance_m} m")]
    StepExceedsArrivalTolerance { step_m: f64, tolerance_m: f64 },

    /// Runs would begin already inside the geofence, so there is no entry to detect.
    #[error("standoff of {standoff_m} m must lie outside the {radius_m} m geofence")]
    StandoffInsideGeofence { standoff_m: f64, radius_m: f64 },

    /// Arrival would be declared before the driver ever crossed the geofence.
    #[error("arrival tolerance of {tolerance_m} m must not exceed the {radius_m} m geofence")]
    ArrivalToleranceExceedsGeofence { tolerance_m: f64, radius_m: f64 },
}

impl SimulatorConfig {
    /// Distance covered by one tick.
    pub fn step_m(&self) -> f64 {
        self.speed_mps * self.tick_interval.as_secs_f64()
    }

    /// Check that the configuration describes a run that always terminates by arrival.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("speed_mps", self.speed_mps),
            ("tick_interval", self.tick_interval.as_secs_f64()),
            ("standoff_m", self.standoff_m),
            ("geofence_radius_m", self.geofence_radius_m),
            ("arrival_tolerance_m", self.arrival_tolerance_m),
        ];

        if let Some((field, value)) = fields
            .into_iter()
            .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        {
            return Err(ConfigError::NotPositive { field, value });
        }

        let step_m = self.step_m();
        if step_m >= self.arrival_tolerance_m {
            return Err(ConfigError::StepExceedsArrivalTolerance {
                step_m,
                tolerance_m: self.arrival_tolerance_m,
            });
        }

        if self.standoff_m <= self.geofence_radius_m {
            return Err(ConfigError::StandoffInsideGeofence {
                standoff_m: self.standoff_m,
                radius_m: self.geofence_radius_m,
            });
        }

        if self.arrival_tolerance_m > self.geofence_radius_m {
            return Err(ConfigError::ArrivalToleranceExceedsGeofence {
                tolerance_m: self.arrival_tolerance_m,
                radius_m: self.geofence_radius_m,
            });
        }

        Ok(())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
