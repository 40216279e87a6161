//! Waiting for remote simulations to finish
//!
//! A simulation is finished once its status is one of the terminal statuses
//! (`CompletedSuccess`, `Failed`, `Cancelled`, `CompletedError`). Waiters
//! poll at a fixed interval and never change remote state.

pub mod clock;
pub mod policy;
pub mod progress;
pub mod summary;
pub mod waiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{PollConfig, PollConfigError, MAX_INTERVAL};
pub use progress::{
    render, ConsoleReporter, NullReporter, ProgressEvent, ProgressReporter, RecordingReporter,
};
pub use summary::WaitSummary;
pub use waiter::{reconcile, WaitError, WaitResult, Waiter};
