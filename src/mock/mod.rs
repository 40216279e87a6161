//! Mock Cloud Implementation
//!
//! In-process stand-in for the vendor cloud CLI, used by the unit and
//! integration tests.
//!
//! # Supported commands
//!
//! - `simulation list` by `SimulationId`: advances scripted status progressions
//! - `simulation list` by `ExecutionId`: returns visible members, including
//!   simulations that only appear on a later listing
//! - `datahub download` / `datahub upload` / `solution download`: acknowledged
//!   and recorded for assertions

mod cloud;
mod failure;
mod state;

pub use cloud::MockCloud;
pub use failure::{FailureConfig, FailureInjector, FailureKind};
pub use state::{MockSimulation, MockState};
