//! Restake additional tokens for a validator and wait for its power to grow.

use std::sync::OnceLock;

use devnet_chain::artifacts::POS_CONTRACT_ADDRESSES_PATH;
use devnet_chain::{CastSend, tokens};
use devnet_transport::RemoteTransport;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::sequencer::{Sequencer, WorkflowReport};
use crate::staking::{
    fetch_artifacts, load_artifacts, read_validator, recorded, validate_validator_id,
};

/// Whole tokens added to the validator's stake.
pub const RESTAKE_AMOUNT: u64 = 100;

/// Fund `validator_id` from the first validator, restake the tokens and wait
/// until heimdall reports the increased power.
///
/// # Errors
///
/// Fails without any remote call if the id is out of range or there is no
/// monitor node; otherwise returns
/// [`Error::StageFailed`](crate::Error::StageFailed) for the first failing stage.
pub async fn stake_update<T>(
    ctx: &WorkflowContext<T>,
    validator_id: usize,
) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    validate_validator_id(validator_id, ctx.config().validator_count())?;
    let monitor = &ctx.monitor()?;
    let old_power = &OnceLock::new();

    Sequencer::new("stake-update")
        .stage("fetch-artifacts", move || async move {
            fetch_artifacts(ctx, monitor, POS_CONTRACT_ADDRESSES_PATH).await
        })
        .stage("restake", move || async move {
            let (dump, addresses) = load_artifacts(ctx)?;
            let funder = dump.signer(1)?;
            let validator = dump.signer(validator_id)?;
            let token = addresses.matic_token()?;
            let stake_manager = addresses.stake_manager_proxy()?;
            let amount = tokens(u128::from(RESTAKE_AMOUNT));

            let power = read_validator(ctx, monitor, validator_id).await?.power;
            info!("Old Validator Power: {power}");

            let transfer = CastSend::new(token, "transfer(address,uint256)")
                .arg(&validator.address)
                .arg(amount)
                .private_key(&funder.priv_key);
            let approve = CastSend::new(token, "approve(address,uint256)")
                .arg(stake_manager)
                .arg(amount)
                .private_key(&validator.priv_key);
            let restake = CastSend::new(stake_manager, "restakePOL(uint256,uint256,bool)")
                .arg(validator_id)
                .arg(amount)
                .arg(false)
                .private_key(&validator.priv_key);

            for call in [transfer, approve, restake] {
                ctx.run(monitor, &call.to_command()).await?;
            }

            let _ = old_power.set(power);
            Ok(())
        })
        .stage("await-power-update", move || async move {
            let expected = recorded(old_power, "old validator power")? + RESTAKE_AMOUNT;
            ctx.poller()
                .wait_for(
                    "validator power to increase",
                    || async move {
                        read_validator(ctx, monitor, validator_id)
                            .await
                            .map(|info| info.power)
                    },
                    |power| *power == expected,
                )
                .await?;

            info!("✅ Stake Updated");
            info!("✅ Stake-Update event sent from rootchain, received and processed on Heimdall");
            Ok(())
        })
        .run()
        .await
}
