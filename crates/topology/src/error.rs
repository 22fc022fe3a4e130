//! Error types for configuration loading and topology resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Topology-related errors. All of them are configuration errors: they are
/// reported immediately and never retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The config file could not be read.
    #[error("failed to read devnet config {path:?}: {source}")]
    ReadConfig {
        /// Path that was attempted.
        path: PathBuf,

        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid.
    #[error("failed to parse devnet config: {0}")]
    ParseConfig(#[from] serde_yaml::Error),

    /// Host and user lists for one client kind are not the same length.
    #[error("{client} host list has {hosts} entries but user list has {users}")]
    MismatchedLists {
        /// Which execution client the lists belong to.
        client: &'static str,

        /// Number of hosts configured.
        hosts: usize,

        /// Number of users configured.
        users: usize,
    },

    /// A host/user pair does not form a usable address.
    #[error("invalid address for node {index}: {reason}")]
    InvalidAddress {
        /// Position of the node in the topology.
        index: usize,

        /// Why the address was rejected.
        reason: String,
    },
}
