//! Pieces shared by the staking workflows.

use std::sync::OnceLock;

use devnet_chain::artifacts::{
    CONTRACT_ADDRESSES_FILE, SIGNER_DUMP_FILE, SIGNER_DUMP_PATH,
};
use devnet_chain::{ContractAddresses, SignerDump, ValidatorInfo, staking};
use devnet_transport::{RemoteAddress, RemoteTransport};

use crate::context::WorkflowContext;
use crate::error::{Error, Result};

/// Check that `id` names an existing validator (`1..=count`).
///
/// # Errors
///
/// Returns [`Error::InvalidValidatorId`] otherwise.
pub const fn validate_validator_id(id: usize, count: usize) -> Result<()> {
    if id >= 1 && id <= count {
        Ok(())
    } else {
        Err(Error::InvalidValidatorId { id, count })
    }
}

/// Copy the signer dump and the contract address book from the monitor node.
pub(crate) async fn fetch_artifacts<T>(
    ctx: &WorkflowContext<T>,
    monitor: &RemoteAddress,
    contract_addresses_path: &str,
) -> Result<()>
where
    T: RemoteTransport,
{
    ctx.pull(monitor, SIGNER_DUMP_PATH, SIGNER_DUMP_FILE).await?;
    ctx.pull(monitor, contract_addresses_path, CONTRACT_ADDRESSES_FILE)
        .await?;
    Ok(())
}

/// Load the artifacts copied by [`fetch_artifacts`].
pub(crate) fn load_artifacts<T>(ctx: &WorkflowContext<T>) -> Result<(SignerDump, ContractAddresses)>
where
    T: RemoteTransport,
{
    let dump = SignerDump::load(ctx.local_path(SIGNER_DUMP_FILE))?;
    let addresses = ContractAddresses::load(ctx.local_path(CONTRACT_ADDRESSES_FILE))?;
    Ok((dump, addresses))
}

/// Current state of `validator_id` as seen by heimdall on the monitor node.
pub(crate) async fn read_validator<T>(
    ctx: &WorkflowContext<T>,
    monitor: &RemoteAddress,
    validator_id: usize,
) -> Result<ValidatorInfo>
where
    T: RemoteTransport,
{
    let output = ctx
        .run_with_return(monitor, &staking::validator_query(validator_id))
        .await?;
    Ok(staking::parse_validator(&output)?)
}

/// Size of the current validator set.
pub(crate) async fn read_validator_set_size<T>(
    ctx: &WorkflowContext<T>,
    monitor: &RemoteAddress,
) -> Result<usize>
where
    T: RemoteTransport,
{
    let output = ctx
        .run_with_return(monitor, &staking::validator_set_query())
        .await?;
    Ok(staking::parse_validator_set_size(&output)?)
}

/// Value recorded by an earlier stage.
pub(crate) fn recorded<'a, V>(cell: &'a OnceLock<V>, what: &'static str) -> Result<&'a V> {
    cell.get().ok_or(Error::MissingStageInput(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_validator_id() {
        assert!(validate_validator_id(1, 4).is_ok());
        assert!(validate_validator_id(4, 4).is_ok());
        assert!(matches!(
            validate_validator_id(0, 4),
            Err(Error::InvalidValidatorId { id: 0, count: 4 })
        ));
        assert!(validate_validator_id(5, 4).is_err());
        assert!(validate_validator_id(1, 0).is_err());
    }
}
