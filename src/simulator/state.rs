use crate::geo::Point;

/// Position-derived telemetry of a run. Present exactly when the driver has a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub position: Point,
    pub distance_to_target_m: f64,
    pub eta_minutes: u32,
}

/// Snapshot of the simulator, replaced wholesale on every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    running: bool,
    telemetry: Option<Telemetry>,
    inside_geofence: bool,
}

impl SimulationState {
    /// The snapshot of a simulator with no run: nothing known, not running.
    pub fn idle() -> Self {
        Self::default()
    }

    pub(crate) fn running(telemetry: Telemetry, inside_geofence: bool) -> Self {
        Self {
            running: true,
            telemetry: Some(telemetry),
            inside_geofence,
        }
    }

    pub(crate) fn arrived(position: Point) -> Self {
        Self {
            running: false,
            telemetry: Some(Telemetry {
                position,
                distance_to_target_m: 0.0,
                eta_minutes: 0,
            }),
            inside_geofence: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    pub fn position(&self) -> Option<Point> {
        self.telemetry.map(|t| t.position)
    }

    pub fn distance_to_target_m(&self) -> Option<f64> {
        self.telemetry.map(|t| t.distance_to_target_m)
    }

    pub fn eta_minutes(&self) -> Option<u32> {
        self.telemetry.map(|t| t.eta_minutes)
    }

    pub fn inside_geofence(&self) -> bool {
        self.inside_geofence
    }
}

/// Whole minutes needed to cover `distance_m` at `speed_mps`, rounded up.
///
/// Any positive distance reports at least one minute; zero distance reports zero.
pub fn eta_minutes(distance_m: f64, speed_mps: f64) -> u32 {
    if distance_m <= 0.0 {
        return 0;
    }
    (distance_m / speed_mps / 60.0).ceil() as u32
}
