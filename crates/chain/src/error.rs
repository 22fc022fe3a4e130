//! Error types for chain helpers.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for chain helpers.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from reading chain state and devnet artifacts.
#[derive(Debug, Error)]
pub enum Error {
    /// An artifact file could not be read.
    #[error("failed to read {path:?}: {source}")]
    ReadArtifact {
        /// File that was attempted.
        path: PathBuf,

        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A document was not valid JSON of the expected shape.
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded.
        what: &'static str,

        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The signer dump has no entry for a validator.
    #[error("signer dump has {available} entries, no signer for validator {validator_id}")]
    MissingSigner {
        /// Requested validator (1-based).
        validator_id: usize,

        /// Entries in the dump.
        available: usize,
    },

    /// A contract address is absent from the address book.
    #[error("contract address for {0} not found")]
    MissingContract(&'static str),

    /// A key could not be parsed or derived.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// HTTP transport error talking to a node.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,

        /// Error message.
        message: String,
    },

    /// The node answered with something unexpected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// An RPC endpoint URL is malformed.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
