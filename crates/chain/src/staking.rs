//! Queries against the heimdall staking REST API.
//!
//! The API is only reachable from the node itself, so callers run the
//! returned `curl` commands remotely and hand the output to the parsers.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Local REST endpoint of heimdall.
pub const STAKING_API: &str = "localhost:1317";

/// Validator state as reported by heimdall.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatorInfo {
    /// Current signer address.
    pub signer: String,

    /// Voting power.
    pub power: u64,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct RawValidator {
    #[serde(default)]
    signer: String,

    #[serde(default)]
    power: Value,
}

#[derive(Deserialize)]
struct RawValidatorSet {
    #[serde(default)]
    validators: Vec<Value>,
}

/// Command reading one validator.
#[must_use]
pub fn validator_query(validator_id: usize) -> String {
    format!("curl {STAKING_API}/staking/validator/{validator_id}")
}

/// Command reading the current validator set.
#[must_use]
pub fn validator_set_query() -> String {
    format!("curl {STAKING_API}/staking/validator-set")
}

/// Parse the output of [`validator_query`].
///
/// # Errors
///
/// Returns [`Error::Decode`] if the body has no `result` object, or
/// [`Error::UnexpectedResponse`] if the power is not a number.
pub fn parse_validator(body: &str) -> Result<ValidatorInfo> {
    let envelope: Envelope<RawValidator> =
        serde_json::from_str(body).map_err(|source| Error::Decode {
            what: "validator",
            source,
        })?;
    let raw = envelope.result;

    let power = match &raw.power {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0),
        _ => None,
    }
    .ok_or_else(|| Error::UnexpectedResponse(format!("validator power {}", raw.power)))?;

    Ok(ValidatorInfo {
        signer: raw.signer,
        power,
    })
}

/// Parse the output of [`validator_set_query`] into the set size.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the body has no `result` object.
pub fn parse_validator_set_size(body: &str) -> Result<usize> {
    let envelope: Envelope<RawValidatorSet> =
        serde_json::from_str(body).map_err(|source| Error::Decode {
            what: "validator set",
            source,
        })?;

    Ok(envelope.result.validators.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validator() {
        let body = r#"{"height":"120","result":{"ID":2,"power":"10000","signer":"0x6c468cf8c9879006e22ec4029696e005c2319c9d"}}"#;
        let info = parse_validator(body).unwrap();

        assert_eq!(info.signer, "0x6c468cf8c9879006e22ec4029696e005c2319c9d");
        assert_eq!(info.power, 10000);

        let numeric = parse_validator(r#"{"result":{"power":42,"signer":"0x1"}}"#).unwrap();
        assert_eq!(numeric.power, 42);
    }

    #[test]
    fn test_parse_validator_rejects_garbage() {
        assert!(matches!(
            parse_validator("curl: (7) Failed to connect"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            parse_validator(r#"{"result":{"power":true}}"#),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_validator_set_size() {
        let body = r#"{"result":{"validators":[{"ID":1},{"ID":2},{"ID":3}],"proposer":{"ID":1}}}"#;
        assert_eq!(parse_validator_set_size(body).unwrap(), 3);
    }

    #[test]
    fn test_queries() {
        assert_eq!(
            validator_query(3),
            "curl localhost:1317/staking/validator/3"
        );
        assert_eq!(
            validator_set_query(),
            "curl localhost:1317/staking/validator-set"
        );
    }
}
