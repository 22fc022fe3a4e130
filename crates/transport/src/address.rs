//! Reachability types for remote hosts and copy endpoints.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A `user@host` pair used to reach a machine over the remote shell.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RemoteAddress {
    user: String,
    host: String,
}

impl RemoteAddress {
    /// Create a new address from its parts.
    #[must_use]
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// The login user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The host name or IP.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build a remote copy endpoint for `path` on this host.
    #[must_use]
    pub fn endpoint(&self, path: impl Into<String>) -> CopyEndpoint {
        CopyEndpoint::Remote {
            address: self.clone(),
            path: path.into(),
        }
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

impl FromStr for RemoteAddress {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((user, host))
                if !user.is_empty() && !host.is_empty() && !host.contains(['@', ':']) =>
            {
                Ok(Self::new(user, host))
            }
            _ => Err(TransportError::InvalidAddress(format!(
                "expected user@host, got '{s}'"
            ))),
        }
    }
}

/// One side of a file copy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CopyEndpoint {
    /// A path on a remote host (`user@host:path`).
    Remote {
        /// Host holding the file.
        address: RemoteAddress,

        /// Path on that host, `~` expansion is left to the remote side.
        path: String,
    },

    /// A path on the machine running the orchestrator.
    Local(PathBuf),
}

impl CopyEndpoint {
    /// Whether this endpoint lives on a remote host.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for CopyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { address, path } => write!(f, "{address}:{path}"),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for CopyEndpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TransportError::InvalidAddress("empty copy endpoint".into()));
        }

        if let Some((prefix, path)) = s.split_once(':')
            && prefix.contains('@')
        {
            let address = prefix.parse()?;
            return Ok(Self::Remote {
                address,
                path: path.to_string(),
            });
        }

        Ok(Self::Local(PathBuf::from(s)))
    }
}

/// Direction of a copy, inferred from which side is remote.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CopyDirection {
    /// Remote source, local destination.
    Pull,

    /// Local source, remote destination.
    Push,
}

impl CopyDirection {
    /// Infer the direction of a copy.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] when both or neither
    /// endpoints are remote.
    pub fn infer(src: &CopyEndpoint, dest: &CopyEndpoint) -> Result<Self, TransportError> {
        match (src.is_remote(), dest.is_remote()) {
            (true, false) => Ok(Self::Pull),
            (false, true) => Ok(Self::Push),
            (true, true) => Err(TransportError::InvalidAddress(format!(
                "both endpoints are remote: {src} -> {dest}"
            ))),
            (false, false) => Err(TransportError::InvalidAddress(format!(
                "neither endpoint is remote: {src} -> {dest}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_address() {
        let address: RemoteAddress = "ubuntu@10.0.0.1".parse().unwrap();
        assert_eq!(address.user(), "ubuntu");
        assert_eq!(address.host(), "10.0.0.1");
        assert_eq!(address.to_string(), "ubuntu@10.0.0.1");

        assert!("10.0.0.1".parse::<RemoteAddress>().is_err());
        assert!("@10.0.0.1".parse::<RemoteAddress>().is_err());
        assert!("ubuntu@".parse::<RemoteAddress>().is_err());
    }

    #[test]
    fn test_parse_copy_endpoints() {
        let remote: CopyEndpoint = "ubuntu@10.0.0.1:~/matic-cli/devnet/devnet/signer-dump.json"
            .parse()
            .unwrap();
        assert_eq!(
            remote,
            RemoteAddress::new("ubuntu", "10.0.0.1")
                .endpoint("~/matic-cli/devnet/devnet/signer-dump.json")
        );

        let local: CopyEndpoint = "./signer-dump.json".parse().unwrap();
        assert_eq!(local, CopyEndpoint::Local(PathBuf::from("./signer-dump.json")));

        // A colon without a user part is still a local path.
        let odd: CopyEndpoint = "data:dump.json".parse().unwrap();
        assert!(!odd.is_remote());
    }

    #[test]
    fn test_infer_direction() {
        let remote = RemoteAddress::new("ubuntu", "10.0.0.1").endpoint("/var/lib/bor/address.txt");
        let local = CopyEndpoint::Local(PathBuf::from("./address.txt"));

        assert_eq!(
            CopyDirection::infer(&remote, &local).unwrap(),
            CopyDirection::Pull
        );
        assert_eq!(
            CopyDirection::infer(&local, &remote).unwrap(),
            CopyDirection::Push
        );
        assert!(CopyDirection::infer(&local, &local).is_err());
        assert!(CopyDirection::infer(&remote, &remote).is_err());
    }
}
