//! OpenSSH-backed transport: `ssh` for commands, `scp` for file copies.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use devnet_transport::{CopyEndpoint, RemoteAddress, RemoteTransport, Result, TransportError};
use tokio::process::Command;
use tracing::{debug, trace};

/// Options for configuring an [`SshTransport`].
#[derive(Clone, Debug)]
pub struct SshOptions {
    /// Timeout handed to ssh/scp via `ConnectTimeout`.
    pub connect_timeout: Duration,

    /// Identity file passed with `-i`, if any.
    pub identity_file: Option<PathBuf>,

    /// Whether to skip host key verification. Devnet machines are recreated
    /// often enough that known_hosts entries go stale.
    pub skip_host_key_check: bool,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            identity_file: None,
            skip_host_key_check: true,
        }
    }
}

/// Transport that shells out to the system `ssh` and `scp` binaries.
#[derive(Clone, Debug, Default)]
pub struct SshTransport {
    options: SshOptions,
}

impl SshTransport {
    /// Create a new ssh transport.
    #[must_use]
    pub const fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// Common `-o` options shared by ssh and scp.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.options.connect_timeout.as_secs()),
        ];

        if self.options.skip_host_key_check {
            args.extend([
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
                "-o".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
                "-o".to_string(),
                "LogLevel=ERROR".to_string(),
            ]);
        }

        if let Some(identity_file) = &self.options.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.display().to_string());
        }

        args
    }

    fn ssh_args(&self, address: &RemoteAddress, command: &str) -> Vec<String> {
        let mut args = self.common_args();
        args.push(address.to_string());
        args.push(command.to_string());
        args
    }

    fn scp_args(&self, src: &CopyEndpoint, dest: &CopyEndpoint) -> Vec<String> {
        let mut args = self.common_args();
        args.push(src.to_string());
        args.push(dest.to_string());
        args
    }
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn execute(&self, address: &RemoteAddress, command: &str) -> Result<String> {
        debug!(%address, "ssh: {command}");

        let output = Command::new("ssh")
            .args(self.ssh_args(address, command))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TransportError::Io("failed to run ssh", e))?;

        if !output.status.success() {
            return Err(TransportError::NonZeroExit {
                program: "ssh",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)?;
        trace!(%address, "ssh output: {stdout}");

        Ok(stdout)
    }

    async fn copy(&self, src: &CopyEndpoint, dest: &CopyEndpoint) -> Result<()> {
        debug!("scp: {src} -> {dest}");

        let output = Command::new("scp")
            .args(self.scp_args(src, dest))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TransportError::Io("failed to run scp", e))?;

        if !output.status.success() {
            return Err(TransportError::NonZeroExit {
                program: "scp",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_args() {
        let transport = SshTransport::new(SshOptions {
            connect_timeout: Duration::from_secs(10),
            identity_file: Some(PathBuf::from("/home/ci/.ssh/devnet")),
            skip_host_key_check: false,
        });

        let args = transport.ssh_args(
            &RemoteAddress::new("ubuntu", "10.0.0.1"),
            "sudo systemctl stop bor.service",
        );

        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=10",
                "-i",
                "/home/ci/.ssh/devnet",
                "ubuntu@10.0.0.1",
                "sudo systemctl stop bor.service",
            ]
        );
    }

    #[test]
    fn test_scp_args_keep_endpoint_order() {
        let transport = SshTransport::default();
        let src = RemoteAddress::new("ubuntu", "10.0.0.1").endpoint("/var/lib/bor/address.txt");
        let dest = CopyEndpoint::Local(PathBuf::from("./address.txt"));

        let args = transport.scp_args(&src, &dest);
        let tail = &args[args.len() - 2..];

        assert_eq!(tail, ["ubuntu@10.0.0.1:/var/lib/bor/address.txt", "./address.txt"]);
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
    }
}
