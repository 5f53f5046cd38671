/// The [`StateMachine`] trait provides calling semantics and indicates the upholding of invariants
/// that guarantee deterministic behavior.
///
/// # Functionality
/// A state machine consumes typed [`Input`](StateMachine::Input) and produces typed
/// [`Output`](StateMachine::Output). With several kinds of input or output these are enums, and
/// the trait methods dispatch each variant to the inherent method that handles it. Keeping the
/// dispatch here lets the implementor's inherent impl stay focused on the actual logic.
///
/// Current state that is always available (rather than produced once) belongs on an inherent
/// accessor of the implementor, not in [`Output`](StateMachine::Output).
///
/// # Invariants
/// A [`StateMachine`] must be pure: its behavior depends on nothing but the inputs it has
/// processed. Implementors *must* uphold all of the following.
///
/// ## No Interior Mutability
/// State is mutated only through `&mut self`. No [`std::cell`] containers and no [`std::sync`]
/// locks. Sharing immutable values (such as an `Arc<str>` identifier) is fine.
///
/// ## No IO, System Time or System RNG
/// Reading the clock or drawing entropy makes two otherwise identical executions diverge. The
/// elapsed time a step covers and any random values must arrive deterministically, either as
/// input or as configuration fixed at construction.
///
/// ## No Concurrency, Async or Blocking
/// Threads and async tasks are driven by an external runtime whose scheduling would leak into
/// the outcome. Blocking is impossible without breaking one of the rules above.
///
/// # Side Effects
/// Logging is permitted as long as the logic of the state machine never depends on its outcome.
///
/// # Runners
/// A "runner" wraps the pure machine, owns the impure resources (timers, RNG, channels) and feeds
/// their results in as input. See [`SimulatorRunner`](crate::runner::SimulatorRunner).
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the first available output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;
}
