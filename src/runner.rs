//! Drives a [`DriverSimulator`] in real time.
//!
//! The runner owns everything impure: the tokio interval that produces ticks, the RNG that picks
//! the initial placement bearing, and the channels through which consumers observe the run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigError, SimulatorConfig};
use crate::run::RunId;
use crate::simulator::state::SimulationState;
use crate::simulator::{DriverSimulator, SimulatorEvent, SimulatorInput};
use crate::state_machine::StateMachine;
use crate::station::Station;

const EVENT_CAPACITY: usize = 16;

/// Consumer-facing handle to a single simulated driver.
///
/// Must be used from within a tokio runtime: [`start`](Self::start) spawns the tick task.
pub struct SimulatorRunner {
    shared: Arc<Shared>,
}

struct Shared {
    core: Mutex<Core>,
    state_tx: watch::Sender<SimulationState>,
    events_tx: broadcast::Sender<SimulatorEvent>,
}

struct Core {
    machine: DriverSimulator,
    rng: StdRng,
    /// Bumped on every transition out of `Running`; a tick task only acts while its generation
    /// is current.
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SimulatorRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatorRunner")
            .field("state", &*self.shared.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl SimulatorRunner {
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (state_tx, _) = watch::channel(SimulationState::idle());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    machine: DriverSimulator::new(config),
                    rng,
                    generation: 0,
                    ticker: None,
                }),
                state_tx,
                events_tx,
            }),
        })
    }

    /// Begin a run toward `target`, replacing any run in progress.
    ///
    /// The driver is placed at the configured standoff distance on a uniformly random bearing
    /// from the station. A missing target leaves the simulator untouched.
    pub fn start(&self, target: Option<Station>) {
        let Some(target) = target else {
            debug!("start requested without a target, ignoring");
            return;
        };

        let mut core = self.shared.lock();
        core.cancel_ticker();

        let run_id = RunId::generate();
        let initial_bearing = core.rng.random_range(0.0..360.0);
        let station_id = target.id.clone();

        core.machine.process_input(SimulatorInput::Start {
            target: Some(target),
            initial_bearing,
            run_id,
        });
        self.shared.publish(&mut core);

        let period = core.machine.config().tick_interval;
        let generation = core.generation;
        core.ticker = Some(tokio::spawn(run_ticker(
            Arc::downgrade(&self.shared),
            generation,
            period,
        )));

        info!(
            run_id = %run_id,
            station_id = %station_id,
            initial_bearing,
            distance_m = core.machine.state().distance_to_target_m(),
            "Simulation started"
        );
    }

    /// End any run and return to the idle snapshot. Calling this while idle does nothing.
    pub fn stop(&self) {
        let mut core = self.shared.lock();
        core.cancel_ticker();

        if let Some(run_id) = core.machine.run_id().copied() {
            info!(run_id = %run_id, "Simulation stopped");
        }

        core.machine.process_input(SimulatorInput::Stop);
        self.shared.publish(&mut core);
    }

    /// The current snapshot.
    pub fn state(&self) -> SimulationState {
        self.shared.state_tx.borrow().clone()
    }

    /// Subscribe to snapshots. The receiver is notified only when the snapshot changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SimulationState> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribe to geofence entry and arrival events raised after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SimulatorEvent> {
        self.shared.events_tx.subscribe()
    }
}

impl Drop for SimulatorRunner {
    fn drop(&mut self) {
        // A tick that panicked mid-update leaves nothing worth protecting.
        let mut core = self.shared.core.lock().unwrap_or_else(PoisonError::into_inner);
        core.cancel_ticker();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().expect("simulator lock poisoned")
    }

    /// Apply one tick for the run identified by `generation`.
    ///
    /// Returns whether the tick task should keep going.
    fn tick(&self, generation: u64) -> bool {
        let mut core = self.lock();
        if core.generation != generation {
            return false;
        }

        core.machine.process_input(SimulatorInput::Tick);
        self.publish(&mut core);

        let running = core.machine.is_running();
        if !running {
            // The run ended on its own; this task is about to return.
            core.ticker = None;
            core.generation += 1;
        }
        running
    }

    /// Forward pending machine output to subscribers and publish the new snapshot.
    fn publish(&self, core: &mut Core) {
        while let Some(event) = core.machine.poll_output() {
            match &event {
                SimulatorEvent::GeofenceEntered { run_id } => {
                    info!(run_id = %run_id, "Driver entered station geofence");
                }
                SimulatorEvent::Arrived { run_id } => {
                    info!(run_id = %run_id, "Driver arrived at station");
                }
            }
            // No subscribers is not an error.
            let _ = self.events_tx.send(event);
        }

        let next = core.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == *next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }
}

impl Core {
    fn cancel_ticker(&mut self) {
        self.generation += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

async fn run_ticker(shared: Weak<Shared>, generation: u64, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A late tick is not compensated for; the next one simply follows it.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.tick(generation) {
            break;
        }
    }
}
