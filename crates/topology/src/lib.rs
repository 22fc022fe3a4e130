//! Devnet topology resolution
//!
//! This crate provides:
//! - The devnet config document ([`DevnetConfig`])
//! - Node identity types ([`NodeIdentity`], [`Role`], [`ExecutionClient`])
//! - A pure resolver turning config into an ordered node table ([`Topology`])
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod node;

pub use config::{DevnetConfig, PUBLIC_CHAIN_IDS};
pub use error::{Error, Result};
pub use node::{ExecutionClient, NodeIdentity, Role};

use devnet_transport::RemoteAddress;
use tracing::debug;

/// Ordered node table for one invocation.
///
/// Primary-client hosts come first, then secondary-client hosts. The table is
/// rebuilt from config each time and never persisted.
#[derive(Clone, Debug)]
pub struct Topology {
    nodes: Vec<NodeIdentity>,
    primary_client_node_count: usize,
    eth_host_user: String,
    monitor_disabled: bool,
}

impl Topology {
    /// Resolve the node table from config. No I/O.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MismatchedLists`] if a host list and its user list
    /// differ in length, or [`Error::InvalidAddress`] for empty entries.
    pub fn resolve(config: &DevnetConfig) -> Result<Self> {
        check_lengths("bor", &config.devnet_bor_hosts, &config.devnet_bor_users)?;
        check_lengths(
            "erigon",
            &config.devnet_erigon_hosts,
            &config.devnet_erigon_users,
        )?;

        let primary_count = config.primary_client_node_count();
        let producer_count = config.producer_validator_count();

        let hosts = config
            .devnet_bor_hosts
            .iter()
            .chain(&config.devnet_erigon_hosts);
        let users = config
            .devnet_bor_users
            .iter()
            .chain(&config.devnet_erigon_users);

        let nodes = hosts
            .zip(users)
            .enumerate()
            .map(|(index, (host, user))| {
                let address = format!("{user}@{host}")
                    .parse::<RemoteAddress>()
                    .map_err(|e| Error::InvalidAddress {
                        index,
                        reason: e.to_string(),
                    })?;

                Ok(NodeIdentity {
                    index,
                    address,
                    role: role_for(index, primary_count, producer_count),
                    client: if index < primary_count {
                        ExecutionClient::Bor
                    } else {
                        ExecutionClient::Erigon
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            nodes = nodes.len(),
            primary_count, producer_count, "resolved devnet topology"
        );

        Ok(Self {
            nodes,
            primary_client_node_count: primary_count,
            eth_host_user: config.eth_host_user.clone(),
            monitor_disabled: config.is_docker() && producer_count == 0,
        })
    }

    /// All nodes in table order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeIdentity] {
        &self.nodes
    }

    /// Iterate over nodes in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, NodeIdentity> {
        self.nodes.iter()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The bootstrap node, if the table contains one.
    #[must_use]
    pub fn producer(&self) -> Option<&NodeIdentity> {
        self.nodes.iter().find(|node| node.is_producer())
    }

    /// Nodes running the primary execution client.
    #[must_use]
    pub fn primary_nodes(&self) -> &[NodeIdentity] {
        let end = self.primary_client_node_count.min(self.nodes.len());
        &self.nodes[..end]
    }

    /// Address used for deployment scripts and on-chain calls: the devnet
    /// checkout owner on the producer's machine.
    #[must_use]
    pub fn monitor_address(&self) -> Option<RemoteAddress> {
        if self.monitor_disabled {
            return None;
        }

        self.producer().map(|node| {
            if self.eth_host_user.is_empty() {
                node.address.clone()
            } else {
                RemoteAddress::new(self.eth_host_user.clone(), node.host())
            }
        })
    }
}

impl<'a> IntoIterator for &'a Topology {
    type Item = &'a NodeIdentity;
    type IntoIter = std::slice::Iter<'a, NodeIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

const fn role_for(index: usize, primary_count: usize, producer_count: usize) -> Role {
    if (index == 0 && producer_count > 0) || (index == primary_count && producer_count == 0) {
        Role::Producer
    } else {
        Role::Follower
    }
}

const fn check_lengths(client: &'static str, hosts: &[String], users: &[String]) -> Result<()> {
    if hosts.len() == users.len() {
        Ok(())
    } else {
        Err(Error::MismatchedLists {
            client,
            hosts: hosts.len(),
            users: users.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bor: &[&str], erigon: &[&str], bor_validators: usize) -> DevnetConfig {
        let strings = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        DevnetConfig {
            devnet_bor_hosts: strings(bor),
            devnet_bor_users: vec!["ubuntu".to_string(); bor.len()],
            devnet_erigon_hosts: strings(erigon),
            devnet_erigon_users: vec!["admin".to_string(); erigon.len()],
            num_of_bor_validators: bor_validators,
            num_of_bor_sentries: bor.len() - bor_validators,
            num_of_erigon_validators: erigon.len(),
            eth_host_user: "ubuntu".to_string(),
            ..DevnetConfig::default()
        }
    }

    #[test]
    fn test_single_node_is_producer() {
        let topology = Topology::resolve(&config(&["10.0.0.1"], &[], 1)).unwrap();

        assert_eq!(topology.len(), 1);
        let node = &topology.nodes()[0];
        assert_eq!(node.role, Role::Producer);
        assert_eq!(node.client, ExecutionClient::Bor);
        assert_eq!(node.address.to_string(), "ubuntu@10.0.0.1");
    }

    #[test]
    fn test_only_index_zero_produces_with_bor_validators() {
        let topology = Topology::resolve(&config(
            &["10.0.0.1", "10.0.0.2", "10.0.0.3"],
            &["10.0.1.1", "10.0.1.2"],
            2,
        ))
        .unwrap();

        let producers = topology
            .iter()
            .filter(|node| node.is_producer())
            .map(|node| node.index)
            .collect::<Vec<_>>();
        assert_eq!(producers, vec![0]);

        let clients = topology.iter().map(|node| node.client).collect::<Vec<_>>();
        assert_eq!(
            clients,
            vec![
                ExecutionClient::Bor,
                ExecutionClient::Bor,
                ExecutionClient::Bor,
                ExecutionClient::Erigon,
                ExecutionClient::Erigon,
            ]
        );
        assert_eq!(topology.primary_nodes().len(), 3);
        assert_eq!(topology.nodes()[3].address.user(), "admin");
    }

    #[test]
    fn test_first_secondary_produces_without_bor_validators() {
        let topology =
            Topology::resolve(&config(&["10.0.0.1", "10.0.0.2"], &["10.0.1.1", "10.0.1.2"], 0))
                .unwrap();

        let producers = topology
            .iter()
            .filter(|node| node.is_producer())
            .map(|node| node.index)
            .collect::<Vec<_>>();
        assert_eq!(producers, vec![2]);
        assert_eq!(
            topology.monitor_address().unwrap().to_string(),
            "ubuntu@10.0.1.1"
        );
    }

    #[test]
    fn test_missing_lists_resolve_empty() {
        let topology = Topology::resolve(&DevnetConfig::default()).unwrap();
        assert!(topology.is_empty());
        assert!(topology.producer().is_none());
        assert!(topology.monitor_address().is_none());
        assert!(topology.primary_nodes().is_empty());
    }

    #[test]
    fn test_mismatched_lists_rejected() {
        let mut config = config(&["10.0.0.1", "10.0.0.2"], &[], 2);
        config.devnet_bor_users.pop();

        let err = Topology::resolve(&config).unwrap_err();
        assert!(matches!(
            err,
            Error::MismatchedLists {
                client: "bor",
                hosts: 2,
                users: 1
            }
        ));
    }

    #[test]
    fn test_docker_without_bor_validators_has_no_monitor() {
        let mut config = config(&[], &["10.0.1.1"], 0);
        config.devnet_type = "docker".to_string();

        let topology = Topology::resolve(&config).unwrap();
        assert!(topology.producer().is_some());
        assert!(topology.monitor_address().is_none());
    }
}
