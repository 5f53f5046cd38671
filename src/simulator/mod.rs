//! The driver simulator: a pure state machine moving a driver toward a station one tick at a
//! time.
//!
//! ```text
//!            start             arrival
//!   Idle ───────────► Running ─────────► Arrived
//!    ▲                 │  ▲ start           │
//!    └──── stop ───────┘  └─────────────────┘ start
//! ```
//!
//! `stop` returns to `Idle` from any phase. Ticks outside `Running` are ignored.

pub mod state;

use std::collections::VecDeque;

use tracing::debug;

use self::state::{SimulationState, Telemetry, eta_minutes};
use crate::config::SimulatorConfig;
use crate::geo;
use crate::run::RunId;
use crate::state_machine::StateMachine;
use crate::station::Station;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Arrived,
}

pub enum SimulatorInput {
    /// Begin a new run toward `target`, placing the driver at the standoff distance along
    /// `initial_bearing` (degrees) from the target. A missing target is ignored.
    Start {
        target: Option<Station>,
        initial_bearing: f64,
        run_id: RunId,
    },
    /// Advance the driver by one tick interval.
    Tick,
    /// End any run and clear all state.
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulatorEvent {
    /// The driver crossed into the geofence. Raised at most once per run.
    GeofenceEntered { run_id: RunId },
    /// The driver reached the station and the run is over.
    Arrived { run_id: RunId },
}

#[derive(Debug)]
struct ActiveRun {
    id: RunId,
    target: Station,
    geofence_notified: bool,
}

#[derive(Debug)]
pub struct DriverSimulator {
    config: SimulatorConfig,
    run: Option<ActiveRun>,
    state: SimulationState,
    pending: VecDeque<SimulatorEvent>,
}

impl DriverSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            run: None,
            state: SimulationState::idle(),
            pending: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        match (&self.run, self.state.is_running()) {
            (None, _) => Phase::Idle,
            (Some(_), true) => Phase::Running,
            (Some(_), false) => Phase::Arrived,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// The identifier of the current or just-completed run.
    pub fn run_id(&self) -> Option<&RunId> {
        self.run.as_ref().map(|run| &run.id)
    }

    pub fn target(&self) -> Option<&Station> {
        self.run.as_ref().map(|run| &run.target)
    }

    fn start(&mut self, target: Option<Station>, initial_bearing: f64, run_id: RunId) {
        let Some(target) = target else {
            debug!("start requested without a target, ignoring");
            return;
        };

        if self.run.is_some() {
            self.stop();
        }

        let position = geo::destination(target.location, initial_bearing, self.config.standoff_m);
        let distance = geo::distance(position, target.location);

        self.state = SimulationState::running(self.telemetry(position, distance), false);
        self.run = Some(ActiveRun {
            id: run_id,
            target,
            geofence_notified: false,
        });
    }

    fn tick(&mut self) {
        if !self.is_running() {
            return;
        }
        let (Some(run), Some(current)) = (self.run.as_mut(), self.state.position()) else {
            return;
        };

        let target = run.target.location;
        let heading = geo::bearing(current, target);
        let position = geo::destination(current, heading, self.config.step_m());
        let distance = geo::distance(position, target);

        debug!(run_id = %run.id, %position, distance_m = distance, heading, "tick");

        let arrived = distance < self.config.arrival_tolerance_m;
        let inside = arrived || distance <= self.config.geofence_radius_m;

        if inside && !run.geofence_notified {
            run.geofence_notified = true;
            self.pending
                .push_back(SimulatorEvent::GeofenceEntered { run_id: run.id });
        }

        if arrived {
            self.pending
                .push_back(SimulatorEvent::Arrived { run_id: run.id });
            self.state = SimulationState::arrived(position);
        } else {
            self.state = SimulationState::running(self.telemetry(position, distance), inside);
        }
    }

    fn stop(&mut self) {
        self.run = None;
        self.pending.clear();
        self.state = SimulationState::idle();
    }

    fn telemetry(&self, position: geo::Point, distance: f64) -> Telemetry {
        Telemetry {
            position,
            distance_to_target_m: distance,
            eta_minutes: eta_minutes(distance, self.config.speed_mps),
        }
    }
}

impl StateMachine for DriverSimulator {
    type Input = SimulatorInput;
    type Output = SimulatorEvent;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            SimulatorInput::Start {
                target,
                initial_bearing,
                run_id,
            } => self.start(target, initial_bearing, run_id),
            SimulatorInput::Tick => self.tick(),
            SimulatorInput::Stop => self.stop(),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;

    const MAX_TICKS: usize = 1_000;

    fn station() -> Station {
        Station::new("station-0", Point::new(0.0, 0.0).unwrap())
    }

    fn started(initial_bearing: f64) -> DriverSimulator {
        let mut sim = DriverSimulator::new(SimulatorConfig::default());
        sim.process_input(SimulatorInput::Start {
            target: Some(station()),
            initial_bearing,
            run_id: RunId::generate(),
        });
        sim
    }

    fn drain(sim: &mut DriverSimulator) -> Vec<SimulatorEvent> {
        std::iter::from_fn(|| sim.poll_output()).collect()
    }

    fn geofence_entries(events: &[SimulatorEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimulatorEvent::GeofenceEntered { .. }))
            .count()
    }

    #[test]
    fn test_initial_state() {
        let sim = DriverSimulator::new(SimulatorConfig::default());
        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.state(), &SimulationState::idle());
        assert!(sim.run_id().is_none());
    }

    #[test]
    fn test_start_without_target_is_noop() {
        let mut sim = DriverSimulator::new(SimulatorConfig::default());
        sim.process_input(SimulatorInput::Start {
            target: None,
            initial_bearing: 90.0,
            run_id: RunId::generate(),
        });

        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.state(), &SimulationState::idle());
        assert!(sim.poll_output().is_none());
    }

    #[test]
    fn test_start_places_driver_at_standoff() {
        let sim = started(137.0);
        let state = sim.state();

        assert_eq!(sim.phase(), Phase::Running);
        assert!(state.is_running());
        assert!(!state.inside_geofence());

        let distance = state.distance_to_target_m().unwrap();
        assert!((distance - 1_000.0).abs() < 1.0, "got {distance}");
        assert_eq!(state.eta_minutes(), Some(4));

        let position = state.position().unwrap();
        let placed_bearing = geo::bearing(station().location, position);
        assert!((placed_bearing - 137.0).abs() < 0.01, "got {placed_bearing}");
    }

    #[test]
    fn test_ticks_converge_monotonically() {
        let mut sim = started(250.0);
        let mut last = sim.state().distance_to_target_m().unwrap();

        for _ in 0..MAX_TICKS {
            sim.process_input(SimulatorInput::Tick);
            if !sim.is_running() {
                break;
            }
            let distance = sim.state().distance_to_target_m().unwrap();
            assert!(distance < last, "distance went from {last} to {distance}");
            assert!((last - distance - 5.0).abs() < 0.01, "step was {}", last - distance);
            last = distance;
        }

        assert_eq!(sim.phase(), Phase::Arrived);
    }

    #[test]
    fn test_geofence_entry_fires_once() {
        let mut sim = started(45.0);
        let mut events = Vec::new();

        while !sim.state().inside_geofence() {
            sim.process_input(SimulatorInput::Tick);
            events.extend(drain(&mut sim));
        }

        assert!(sim.state().distance_to_target_m().unwrap() <= 400.0);
        assert_eq!(geofence_entries(&events), 1);
        assert!(matches!(
            events.as_slice(),
            [SimulatorEvent::GeofenceEntered { run_id }] if Some(run_id) == sim.run_id()
        ));

        // Keep ticking while still inside the geofence.
        for _ in 0..20 {
            sim.process_input(SimulatorInput::Tick);
            assert!(sim.state().inside_geofence());
            assert!(drain(&mut sim).is_empty());
        }
    }

    #[test]
    fn test_inside_geofence_tracks_radius() {
        let mut sim = started(0.0);

        for _ in 0..MAX_TICKS {
            sim.process_input(SimulatorInput::Tick);
            if !sim.is_running() {
                break;
            }
            let state = sim.state();
            let distance = state.distance_to_target_m().unwrap();
            assert_eq!(state.inside_geofence(), distance <= 400.0);
        }
    }

    #[test]
    fn test_arrival() {
        let mut sim = started(300.0);
        let mut events = Vec::new();

        for _ in 0..MAX_TICKS {
            sim.process_input(SimulatorInput::Tick);
            events.extend(drain(&mut sim));
            if !sim.is_running() {
                break;
            }
        }

        let state = sim.state().clone();
        assert_eq!(sim.phase(), Phase::Arrived);
        assert!(!state.is_running());
        assert_eq!(state.distance_to_target_m(), Some(0.0));
        assert_eq!(state.eta_minutes(), Some(0));
        assert!(state.inside_geofence());

        let actual = geo::distance(state.position().unwrap(), station().location);
        assert!(actual < 10.0, "arrived {actual} m away");

        assert_eq!(geofence_entries(&events), 1);
        assert!(matches!(events.last(), Some(SimulatorEvent::Arrived { .. })));

        // Further ticks change nothing.
        sim.process_input(SimulatorInput::Tick);
        assert_eq!(sim.state(), &state);
        assert!(sim.poll_output().is_none());
    }

    #[test]
    fn test_tick_while_idle_is_noop() {
        let mut sim = DriverSimulator::new(SimulatorConfig::default());
        sim.process_input(SimulatorInput::Tick);
        assert_eq!(sim.state(), &SimulationState::idle());
        assert!(sim.poll_output().is_none());
    }

    #[test]
    fn test_stop_resets_to_idle() {
        let mut sim = started(10.0);
        for _ in 0..5 {
            sim.process_input(SimulatorInput::Tick);
        }

        sim.process_input(SimulatorInput::Stop);
        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.state(), &SimulationState::idle());
        assert!(sim.target().is_none());

        // Idempotent.
        sim.process_input(SimulatorInput::Stop);
        assert_eq!(sim.state(), &SimulationState::idle());

        sim.process_input(SimulatorInput::Tick);
        assert_eq!(sim.state(), &SimulationState::idle());
    }

    #[test]
    fn test_stop_discards_pending_events() {
        let mut sim = started(90.0);
        while !sim.state().inside_geofence() {
            sim.process_input(SimulatorInput::Tick);
        }

        sim.process_input(SimulatorInput::Stop);
        assert!(sim.poll_output().is_none());

        sim.process_input(SimulatorInput::Start {
            target: Some(station()),
            initial_bearing: 90.0,
            run_id: RunId::generate(),
        });
        assert!(sim.poll_output().is_none());
    }

    #[test]
    fn test_restart_discards_previous_run_events() {
        let mut sim = started(180.0);
        while !sim.state().inside_geofence() {
            sim.process_input(SimulatorInput::Tick);
        }

        sim.process_input(SimulatorInput::Start {
            target: Some(station()),
            initial_bearing: 180.0,
            run_id: RunId::generate(),
        });
        assert!(sim.poll_output().is_none());
        assert!(!sim.state().inside_geofence());
    }

    #[test]
    fn test_restart_resets_geofence_latch() {
        let mut sim = started(90.0);
        while !sim.state().inside_geofence() {
            sim.process_input(SimulatorInput::Tick);
        }
        let first = drain(&mut sim);
        assert_eq!(geofence_entries(&first), 1);
        let first_run = sim.run_id().cloned().unwrap();

        sim.process_input(SimulatorInput::Start {
            target: Some(station()),
            initial_bearing: 200.0,
            run_id: RunId::generate(),
        });
        assert!(sim.is_running());
        assert!(!sim.state().inside_geofence());
        assert_ne!(sim.run_id(), Some(&first_run));

        while !sim.state().inside_geofence() {
            sim.process_input(SimulatorInput::Tick);
        }
        let second = drain(&mut sim);
        assert!(matches!(
            second.as_slice(),
            [SimulatorEvent::GeofenceEntered { run_id }] if *run_id != first_run
        ));
    }

    #[test]
    fn test_start_after_arrival() {
        let mut sim = started(0.0);
        while sim.is_running() {
            sim.process_input(SimulatorInput::Tick);
        }
        assert_eq!(sim.phase(), Phase::Arrived);

        sim.process_input(SimulatorInput::Start {
            target: Some(station()),
            initial_bearing: 0.0,
            run_id: RunId::generate(),
        });
        assert_eq!(sim.phase(), Phase::Running);
        assert!(!sim.state().inside_geofence());
    }
}
