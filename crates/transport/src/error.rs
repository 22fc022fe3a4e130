//! Error types for remote transports.

use std::process::ExitStatus;

use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by a single remote attempt.
///
/// Every variant is treated as transient by the executor layer and retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A remote or copy endpoint could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Failed to launch the local transport binary (ssh, scp).
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// The remote command ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    NonZeroExit {
        /// The program that was invoked locally.
        program: &'static str,

        /// Exit status of the program.
        status: ExitStatus,

        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Output could not be decoded as UTF-8.
    #[error(transparent)]
    BadUtf8(#[from] std::string::FromUtf8Error),

    /// Generic failure, mostly raised by test transports.
    #[error("{0}")]
    Other(String),
}
