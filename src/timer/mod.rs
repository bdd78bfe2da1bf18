pub mod clock;
pub mod controller;
pub mod snapshot;
pub mod state;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{RunSummary, SequencerController, TransitionEvent};
pub use snapshot::{PlayheadSnapshot, Tick, Transition};
pub use state::{PlayheadState, PlayheadStatus, Scheduler};
