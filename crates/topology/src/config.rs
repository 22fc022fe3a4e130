//! The devnet configuration document.
//!
//! Keys follow the camelCase names used by the devnet setup tooling so the
//! same YAML file can be consumed unchanged.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Chain ids of public networks; account funding and similar devnet-only
/// shortcuts are refused for them.
pub const PUBLIC_CHAIN_IDS: [u64; 3] = [
    137,  // mainnet
    8001, // mumbai
    8002, // amoy
];

/// Devnet description read from the setup config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevnetConfig {
    /// `remote` or `docker`.
    #[serde(default = "default_devnet_type")]
    pub devnet_type: String,

    /// Hosts running the primary execution client (bor).
    #[serde(default, deserialize_with = "string_or_list")]
    pub devnet_bor_hosts: Vec<String>,

    /// Login users for `devnet_bor_hosts`, positionally.
    #[serde(default, deserialize_with = "string_or_list")]
    pub devnet_bor_users: Vec<String>,

    /// Hosts running the secondary execution client (erigon).
    #[serde(default, deserialize_with = "string_or_list")]
    pub devnet_erigon_hosts: Vec<String>,

    /// Login users for `devnet_erigon_hosts`, positionally.
    #[serde(default, deserialize_with = "string_or_list")]
    pub devnet_erigon_users: Vec<String>,

    /// Number of bor validators.
    #[serde(default)]
    pub num_of_bor_validators: usize,

    /// Number of bor sentries.
    #[serde(default)]
    pub num_of_bor_sentries: usize,

    /// Number of bor archive nodes.
    #[serde(default)]
    pub num_of_bor_archive_nodes: usize,

    /// Number of erigon validators.
    #[serde(default)]
    pub num_of_erigon_validators: usize,

    /// Number of erigon sentries.
    #[serde(default)]
    pub num_of_erigon_sentries: usize,

    /// Number of erigon archive nodes.
    #[serde(default)]
    pub num_of_erigon_archive_nodes: usize,

    /// User owning the devnet checkout on every machine.
    #[serde(default)]
    pub eth_host_user: String,

    /// Bor chain id.
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub bor_chain_id: Option<u64>,

    /// Heimdall chain id.
    #[serde(default)]
    pub heimdall_chain_id: Option<String>,
}

fn default_devnet_type() -> String {
    "remote".to_string()
}

impl DevnetConfig {
    /// Parse a config document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseConfig`] if the YAML is malformed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Number of nodes running the primary execution client. Nodes with an
    /// index below this run bor, the rest run erigon.
    #[must_use]
    pub const fn primary_client_node_count(&self) -> usize {
        self.num_of_bor_validators + self.num_of_bor_sentries + self.num_of_bor_archive_nodes
    }

    /// Number of validators on the primary client; drives producer placement.
    #[must_use]
    pub const fn producer_validator_count(&self) -> usize {
        self.num_of_bor_validators
    }

    /// Total validators across both clients.
    #[must_use]
    pub const fn validator_count(&self) -> usize {
        self.num_of_bor_validators + self.num_of_erigon_validators
    }

    /// Whether this devnet runs in docker rather than on remote machines.
    #[must_use]
    pub fn is_docker(&self) -> bool {
        self.devnet_type == "docker"
    }

    /// Whether the bor chain id is one of the public networks.
    #[must_use]
    pub fn is_public_chain(&self) -> bool {
        self.bor_chain_id
            .is_some_and(|id| PUBLIC_CHAIN_IDS.contains(&id))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    List(Vec<String>),
    Csv(String),
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<StringOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrList::List(items)) => items,
        Some(StringOrList::Csv(csv)) => csv.split(',').map(ToString::to_string).collect(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn optional_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
