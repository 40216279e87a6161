//! Simulation Cloud Wire Types
//!
//! Defines the JSON documents exchanged with the vendor cloud CLI: the
//! command line a request is rendered to, the response envelope printed on
//! stdout, and the simulation records carried inside it.

pub mod command;
pub mod error;
pub mod response;
pub mod simulation;
pub mod status;

pub use command::{CloudCommand, CommandArg, SolutionType};
pub use error::WireError;
pub use response::{parse_responses, response_data, CommandResponse};
pub use simulation::{GuidValue, ListSimulationResponse, Simulation};
pub use status::{SimulationStatus, TERMINAL_STATUSES};

/// Flag appended to every command so the CLI prints machine-readable output.
pub const JSON_OUTPUT_FLAG: &str = "--JsonOutput";
