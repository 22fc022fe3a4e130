//! Identity of a single devnet machine.

use std::fmt;

use devnet_transport::RemoteAddress;
use serde::Serialize;

/// Role a node plays during bootstrap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Hosts the root-chain simulator and runs contract deployment.
    Producer,

    /// Every other node.
    Follower,
}

/// Execution client installed on a node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionClient {
    /// Primary client.
    Bor,

    /// Secondary client.
    Erigon,
}

impl ExecutionClient {
    /// Name of the systemd unit (without `.service`) and binary.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::Bor => "bor",
            Self::Erigon => "erigon",
        }
    }

    /// Chain data directory removed on cleanup.
    #[must_use]
    pub const fn data_dir(self) -> &'static str {
        match self {
            Self::Bor => "/var/lib/bor/data",
            Self::Erigon => "~/.erigon/data",
        }
    }

    /// Setup script run before the service is started.
    #[must_use]
    pub const fn setup_script(self) -> &'static str {
        match self {
            Self::Bor => "~/node/bor-setup.sh",
            Self::Erigon => "~/node/erigon-setup.sh",
        }
    }
}

impl fmt::Display for ExecutionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Follower => f.write_str("follower"),
        }
    }
}

/// A resolved node: where it lives, what it runs, and its role.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NodeIdentity {
    /// Position in the topology table.
    pub index: usize,

    /// How to reach the machine.
    pub address: RemoteAddress,

    /// Bootstrap role.
    pub role: Role,

    /// Installed execution client.
    pub client: ExecutionClient,
}

impl NodeIdentity {
    /// Whether this node is the producer.
    #[must_use]
    pub fn is_producer(&self) -> bool {
        self.role == Role::Producer
    }

    /// Host name or IP.
    #[must_use]
    pub fn host(&self) -> &str {
        self.address.host()
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}, {})",
            self.index, self.address, self.client, self.role
        )
    }
}
