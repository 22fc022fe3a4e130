//! Error types for fleet execution.

use std::time::Duration;

use devnet_transport::TransportError;
use thiserror::Error;

/// Result type for fleet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while driving commands across the fleet.
#[derive(Debug, Error)]
pub enum Error {
    /// Every attempt of a remote operation failed.
    #[error("{operation} on {target} failed after {attempts} attempts")]
    RetriesExhausted {
        /// Host (or copy endpoints) the operation targeted.
        target: String,

        /// Command or copy description.
        operation: String,

        /// Attempts made.
        attempts: u32,

        /// Error of the last attempt.
        #[source]
        source: TransportError,
    },

    /// At least one node failed during a fleet-wide stage.
    #[error("{} of {total} nodes failed (indices {failed:?})", failed.len())]
    FleetFailed {
        /// Indices of the failed nodes.
        failed: Vec<usize>,

        /// Number of nodes in the stage.
        total: usize,

        /// First failure, in node order.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A condition was not met before the poll deadline.
    #[error("timed out after {elapsed:?} ({attempts} queries) waiting for {condition}")]
    ConvergenceTimeout {
        /// What was being waited for.
        condition: String,

        /// Queries made.
        attempts: u32,

        /// Time spent polling.
        elapsed: Duration,
    },

    /// A request was rejected before any attempt was made.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
