//! Bounded-retry execution of remote commands and copies.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use devnet_transport::{CopyDirection, CopyEndpoint, RemoteAddress, RemoteTransport};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// Runs commands on remote hosts, retrying failed attempts.
///
/// Each operation is attempted `1 + max_retries` times. A non-zero exit and a
/// transport failure are treated the same way.
pub struct RemoteExecutor<T>
where
    T: RemoteTransport,
{
    transport: Arc<T>,
    retry_delay: Duration,
}

impl<T> Clone for RemoteExecutor<T>
where
    T: RemoteTransport,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            retry_delay: self.retry_delay,
        }
    }
}

impl<T> RemoteExecutor<T>
where
    T: RemoteTransport,
{
    /// Create an executor that retries immediately.
    pub const fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            retry_delay: Duration::ZERO,
        }
    }

    /// Sleep this long between attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Run `command` on `address`, discarding its output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once every attempt has failed.
    pub async fn run_command(
        &self,
        address: &RemoteAddress,
        command: &str,
        max_retries: u32,
    ) -> Result<()> {
        self.run_command_with_return(address, command, max_retries)
            .await
            .map(|_| ())
    }

    /// Run `command` on `address` and return its trimmed standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once every attempt has failed.
    pub async fn run_command_with_return(
        &self,
        address: &RemoteAddress,
        command: &str,
        max_retries: u32,
    ) -> Result<String> {
        let output = self
            .with_retries(&address.to_string(), command, max_retries, || {
                self.transport.execute(address, command)
            })
            .await?;

        Ok(output.trim().to_string())
    }

    /// Copy a file to or from a remote host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] without attempting anything if both or
    /// neither endpoint is remote, and [`Error::RetriesExhausted`] once every
    /// attempt has failed.
    pub async fn run_copy(
        &self,
        src: &CopyEndpoint,
        dest: &CopyEndpoint,
        max_retries: u32,
    ) -> Result<()> {
        let (verb, remote) = match CopyDirection::infer(src, dest)? {
            CopyDirection::Pull => ("pull", src),
            CopyDirection::Push => ("push", dest),
        };
        let target = match remote {
            CopyEndpoint::Remote { address, .. } => address.to_string(),
            CopyEndpoint::Local(path) => path.display().to_string(),
        };
        let operation = format!("{verb} {src} -> {dest}");

        self.with_retries(&target, &operation, max_retries, || {
            self.transport.copy(src, dest)
        })
        .await
    }

    async fn with_retries<R, F, Fut>(
        &self,
        target: &str,
        operation: &str,
        max_retries: u32,
        mut attempt: F,
    ) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = devnet_transport::Result<R>>,
    {
        let max_attempts = max_retries.saturating_add(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("{target}: {operation} (attempt {attempts}/{max_attempts})");

            match attempt().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!("{target}: {operation} succeeded after {attempts} attempts");
                    }
                    return Ok(value);
                }
                Err(e) if attempts < max_attempts => {
                    warn!("{target}: {operation} failed (attempt {attempts}): {e}, retrying...");
                    if !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => {
                    error!("{target}: {operation} failed after {attempts} attempts: {e}");
                    return Err(Error::RetriesExhausted {
                        target: target.to_string(),
                        operation: operation.to_string(),
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }
}
