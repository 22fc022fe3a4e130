//! Fresh secp256k1 accounts for new validators and signers.

use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// A secp256k1 key pair with its Ethereum address, hex encoded with `0x`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPair {
    /// 32-byte private key.
    pub private_key: String,

    /// 64-byte uncompressed public key without the `04` prefix.
    pub public_key: String,

    /// Lowercase 20-byte address.
    pub address: String,
}

impl KeyPair {
    /// Generate a random key pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(&SigningKey::random(&mut rand::thread_rng()))
    }

    /// Derive the key pair for a hex private key (with or without `0x`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the key is not a valid scalar.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| Error::InvalidKey(e.to_string()))?;

        Ok(Self::from_signing_key(&key))
    }

    fn from_signing_key(key: &SigningKey) -> Self {
        let point = key.verifying_key().to_encoded_point(false);
        // Drop the 0x04 SEC1 tag.
        let public = &point.as_bytes()[1..];
        let hash = Keccak256::digest(public);

        Self {
            private_key: format!("0x{}", hex::encode(key.to_bytes())),
            public_key: format!("0x{}", hex::encode(public)),
            address: format!("0x{}", hex::encode(&hash[12..])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let pair = KeyPair::from_private_key(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();

        assert_eq!(pair.address, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(
            pair.public_key,
            "0x79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn test_generated_keys_are_well_formed() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();

        assert_ne!(a, b);
        assert_eq!(a.private_key.len(), 2 + 64);
        assert_eq!(a.public_key.len(), 2 + 128);
        assert_eq!(a.address.len(), 2 + 40);
        assert_eq!(KeyPair::from_private_key(&a.private_key).unwrap(), a);
    }

    #[test]
    fn test_rejects_invalid_keys() {
        assert!(KeyPair::from_private_key("0xzz").is_err());
        assert!(KeyPair::from_private_key(&format!("0x{}", "00".repeat(32))).is_err());
    }
}
