//! Generic transport abstraction for reaching devnet machines.
//!
//! This crate provides a transport-agnostic interface for running a shell
//! command on a remote host and copying files to or from it. Concrete
//! transports (ssh, in-memory) are provided in separate crates.
//!
//! A transport performs exactly one attempt per call. Retrying is the job of
//! the executor sitting on top of it.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod address;
mod error;

pub use address::{CopyDirection, CopyEndpoint, RemoteAddress};
pub use error::{Result, TransportError};

use async_trait::async_trait;

/// Transport trait for executing work on remote machines.
#[async_trait]
pub trait RemoteTransport: Send + Sync + 'static {
    /// Run `command` on `address`, returning its standard output on success.
    ///
    /// A non-zero exit status must be reported as an error.
    async fn execute(&self, address: &RemoteAddress, command: &str) -> Result<String>;

    /// Copy a file between the local machine and a remote host.
    ///
    /// Exactly one of `src` and `dest` is remote; callers are expected to
    /// validate this with [`CopyDirection::infer`] first.
    async fn copy(&self, src: &CopyEndpoint, dest: &CopyEndpoint) -> Result<()>;
}
