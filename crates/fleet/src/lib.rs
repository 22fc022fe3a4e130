//! Fleet-wide execution of devnet lifecycle commands.
//!
//! Layered on a [`devnet_transport::RemoteTransport`]:
//! - [`RemoteExecutor`] adds bounded retries to single remote operations
//! - [`dispatch`] maps a node's role and a stage to its ordered commands
//! - [`run_across_fleet`] fans work out to every node and collects outcomes
//! - [`Poller`] waits for remote state to converge
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod dispatch;
mod error;
mod executor;
mod orchestrator;
mod poll;

pub use dispatch::{DeployStage, RemoteCommand, StageKind};
pub use error::{Error, Result};
pub use executor::RemoteExecutor;
pub use orchestrator::{FleetReport, NodeOutcome, run_across_fleet, run_plan_across_fleet};
pub use poll::{PollOutcome, Poller};
