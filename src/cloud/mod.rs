//! Cloud-Side Components
//!
//! Client for the vendor simulation cloud, reached through its command-line
//! interface.

pub mod client;
pub mod transport;

pub use client::{CloudClient, CloudError, CloudResult};
pub use transport::{CliConfig, CliTransport, CloudTransport, MockTransport, TransportError};
