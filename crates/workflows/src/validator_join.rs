//! Stake a brand new validator and wait for it to join the validator set.

use std::sync::OnceLock;

use devnet_chain::artifacts::CONTRACT_ADDRESSES_PATH;
use devnet_chain::{CastSend, KeyPair, tokens};
use devnet_transport::RemoteTransport;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::sequencer::{Sequencer, WorkflowReport};
use crate::staking::{
    fetch_artifacts, load_artifacts, read_validator_set_size, recorded, validate_validator_id,
};

/// Tokens approved for the stake manager before staking.
pub const APPROVE_AMOUNT: u128 = 50;

/// Initial stake of the new validator.
pub const STAKE_AMOUNT: u128 = 12;

/// Heimdall fee paid with the stake.
pub const HEIMDALL_FEE: u128 = 12;

/// Use validator `validator_id`'s account to `stakeFor` a freshly generated
/// key, then wait until the validator set grows by one.
///
/// # Errors
///
/// Fails without any remote call if the id is out of range or there is no
/// monitor node; otherwise returns
/// [`Error::StageFailed`](crate::Error::StageFailed) for the first failing stage.
pub async fn validator_join<T>(
    ctx: &WorkflowContext<T>,
    validator_id: usize,
) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    validate_validator_id(validator_id, ctx.config().validator_count())?;
    let monitor = &ctx.monitor()?;
    let old_size = &OnceLock::new();

    Sequencer::new("validator-join")
        .stage("fetch-artifacts", move || async move {
            fetch_artifacts(ctx, monitor, CONTRACT_ADDRESSES_PATH).await
        })
        .stage("approve", move || async move {
            let (dump, addresses) = load_artifacts(ctx)?;
            let validator = dump.signer(validator_id)?;

            let approve = CastSend::new(addresses.test_token()?, "approve(address,uint256)")
                .arg(addresses.stake_manager_proxy()?)
                .arg(tokens(APPROVE_AMOUNT))
                .private_key(&validator.priv_key);
            ctx.run(monitor, &approve.to_command()).await
        })
        .stage("stake-for", move || async move {
            let (dump, addresses) = load_artifacts(ctx)?;
            let validator = dump.signer(validator_id)?;

            let size = read_validator_set_size(ctx, monitor).await?;
            info!("oldValidatorsCount: {size}");

            let key = KeyPair::generate();
            info!("NewValidatorAddr {} {}", key.address, key.public_key);
            info!("NewValidatorPrivKey {}", key.private_key);

            let signature = "stakeFor(address,uint256,uint256,bool,bytes)";
            let stake = CastSend::new(addresses.stake_manager_proxy()?, signature)
                .arg(&key.address)
                .arg(tokens(STAKE_AMOUNT))
                .arg(tokens(HEIMDALL_FEE))
                .arg(false)
                .arg(&key.public_key)
                .private_key(&validator.priv_key);
            ctx.run(monitor, &stake.to_command()).await?;

            let _ = old_size.set(size);
            Ok(())
        })
        .stage("await-validator-added", move || async move {
            let expected = recorded(old_size, "old validator set size")? + 1;
            ctx.poller()
                .wait_for(
                    "validator set to grow",
                    || read_validator_set_size(ctx, monitor),
                    |size| *size == expected,
                )
                .await?;

            info!("✅ Validator Added");
            info!("✅ Staked event sent from rootchain, received and processed on Heimdall");
            Ok(())
        })
        .run()
        .await
}
