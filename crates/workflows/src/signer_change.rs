//! Rotate a validator's signer key and wait for heimdall to pick it up.

use std::sync::OnceLock;

use devnet_chain::artifacts::POS_CONTRACT_ADDRESSES_PATH;
use devnet_chain::{CastSend, KeyPair};
use devnet_transport::RemoteTransport;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::sequencer::{Sequencer, WorkflowReport};
use crate::staking::{
    fetch_artifacts, load_artifacts, read_validator, recorded, validate_validator_id,
};

/// Send `updateSigner` for `validator_id` with a freshly generated key.
///
/// # Errors
///
/// Fails without any remote call if the id is out of range or there is no
/// monitor node; otherwise returns
/// [`Error::StageFailed`](crate::Error::StageFailed) for the first failing stage.
pub async fn signer_change<T>(
    ctx: &WorkflowContext<T>,
    validator_id: usize,
) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    validate_validator_id(validator_id, ctx.config().validator_count())?;
    let monitor = &ctx.monitor()?;
    let old_signer = &OnceLock::new();

    Sequencer::new("signer-change")
        .stage("fetch-artifacts", move || async move {
            fetch_artifacts(ctx, monitor, POS_CONTRACT_ADDRESSES_PATH).await
        })
        .stage("update-signer", move || async move {
            let (dump, addresses) = load_artifacts(ctx)?;
            let private_key = &dump.signer(validator_id)?.priv_key;

            let signer = read_validator(ctx, monitor, validator_id).await?.signer;
            info!("OldValidatorSigner {signer}");

            let key = KeyPair::generate();
            info!("NewValidatorAddr {} {}", key.address, key.public_key);
            info!("NewValidatorPrivKey {}", key.private_key);

            info!("Changing signer ...");
            let stake_manager = addresses.stake_manager_proxy()?;
            let command = CastSend::new(stake_manager, "updateSigner(uint256,bytes)")
                .arg(validator_id)
                .arg(&key.public_key)
                .private_key(private_key)
                .to_command();
            ctx.run(monitor, &command).await?;

            let _ = old_signer.set(signer);
            Ok(())
        })
        .stage("await-signer-change", move || async move {
            let old = recorded(old_signer, "old signer")?;
            let new = ctx
                .poller()
                .wait_for(
                    "validator signer to change",
                    || async move {
                        read_validator(ctx, monitor, validator_id)
                            .await
                            .map(|info| info.signer)
                    },
                    |signer| signer != old,
                )
                .await?;

            info!("newSigner: {new}");
            info!("✅ Signer Updated");
            info!("✅ SignerChange event from rootchain, received and processed on Heimdall");
            Ok(())
        })
        .run()
        .await
}
