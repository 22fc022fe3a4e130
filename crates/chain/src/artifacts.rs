//! Devnet artifacts produced on the producer machine during setup.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Remote location of the validator key dump.
pub const SIGNER_DUMP_PATH: &str = "~/matic-cli/devnet/devnet/signer-dump.json";

/// Remote location of the contract address book written by the PoS
/// contracts deployment.
pub const POS_CONTRACT_ADDRESSES_PATH: &str =
    "~/matic-cli/devnet/code/pos-contracts/contractAddresses.json";

/// Remote location of the contract address book in the legacy contracts
/// checkout.
pub const CONTRACT_ADDRESSES_PATH: &str = "~/matic-cli/devnet/code/contracts/contractAddresses.json";

/// Local file name of the signer dump.
pub const SIGNER_DUMP_FILE: &str = "signer-dump.json";

/// Local file name of the contract address book.
pub const CONTRACT_ADDRESSES_FILE: &str = "contractAddresses.json";

/// One validator account from the signer dump.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SignerEntry {
    /// Account address.
    pub address: String,

    /// Hex private key.
    pub priv_key: String,
}

/// Validator accounts in validator-id order.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct SignerDump(Vec<SignerEntry>);

impl SignerDump {
    /// Load from a local copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref(), "signer dump")
    }

    /// Account of validator `validator_id` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSigner`] if there is no such entry.
    pub fn signer(&self, validator_id: usize) -> Result<&SignerEntry> {
        validator_id
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .ok_or(Error::MissingSigner {
                validator_id,
                available: self.0.len(),
            })
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[SignerEntry] {
        &self.0
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dump is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contract address book; only the root-chain section is used.
#[derive(Clone, Debug, Deserialize)]
pub struct ContractAddresses {
    /// Root-chain contracts.
    pub root: RootContracts,
}

/// Root-chain contract addresses.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootContracts {
    /// Stake manager proxy.
    pub stake_manager_proxy: Option<String>,

    /// Token contracts.
    #[serde(rename = "tokens", default)]
    pub tokens: RootTokens,
}

/// Root-chain token addresses.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RootTokens {
    /// Staking token.
    pub matic_token: Option<String>,

    /// Test token used by the legacy contracts.
    pub test_token: Option<String>,
}

impl ContractAddresses {
    /// Load from a local copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref(), "contract addresses")
    }

    /// Stake manager proxy address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContract`] if absent.
    pub fn stake_manager_proxy(&self) -> Result<&str> {
        self.root
            .stake_manager_proxy
            .as_deref()
            .ok_or(Error::MissingContract("StakeManagerProxy"))
    }

    /// Staking token address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContract`] if absent.
    pub fn matic_token(&self) -> Result<&str> {
        self.root
            .tokens
            .matic_token
            .as_deref()
            .ok_or(Error::MissingContract("MaticToken"))
    }

    /// Test token address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingContract`] if absent.
    pub fn test_token(&self) -> Result<&str> {
        self.root
            .tokens
            .test_token
            .as_deref()
            .ok_or(Error::MissingContract("TestToken"))
    }
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|source| Error::ReadArtifact {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| Error::Decode { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_lookup_is_one_based() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SIGNER_DUMP_FILE);
        fs::write(
            &path,
            r#"[
                {"address":"0xaa","priv_key":"0x01","pub_key":"0x04aa"},
                {"address":"0xbb","priv_key":"0x02","pub_key":"0x04bb"}
            ]"#,
        )
        .unwrap();

        let dump = SignerDump::load(&path).unwrap();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump.signer(1).unwrap().address, "0xaa");
        assert_eq!(dump.signer(2).unwrap().priv_key, "0x02");
        assert!(matches!(
            dump.signer(0),
            Err(Error::MissingSigner { validator_id: 0, .. })
        ));
        assert!(dump.signer(3).is_err());
    }

    #[test]
    fn test_contract_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONTRACT_ADDRESSES_FILE);
        fs::write(
            &path,
            r#"{
                "root": {
                    "StakeManagerProxy": "0x5e3e",
                    "tokens": {"MaticToken": "0x4b5f", "TestToken": "0x7c1e"}
                },
                "child": {}
            }"#,
        )
        .unwrap();

        let addresses = ContractAddresses::load(&path).unwrap();
        assert_eq!(addresses.stake_manager_proxy().unwrap(), "0x5e3e");
        assert_eq!(addresses.matic_token().unwrap(), "0x4b5f");
        assert_eq!(addresses.test_token().unwrap(), "0x7c1e");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ContractAddresses::load(dir.path().join("nope.json")),
            Err(Error::ReadArtifact { .. })
        ));
    }
}
