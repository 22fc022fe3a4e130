//! Spread root-chain ether from the first genesis account to the others.

use devnet_chain::artifacts::{SIGNER_DUMP_FILE, SIGNER_DUMP_PATH};
use devnet_chain::{ChainRpc, SignerDump, tokens};
use devnet_transport::RemoteTransport;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::sequencer::{Sequencer, WorkflowReport};

/// Ether sent to every account.
pub const FUND_AMOUNT: u128 = 10;

/// Send [`FUND_AMOUNT`] ether from signer 0 to every other signer through the
/// root-chain RPC of the monitor node, one transfer at a time.
///
/// Public chains are left untouched and yield an empty report.
///
/// # Errors
///
/// Fails up front if there is no monitor node, otherwise returns
/// [`Error::StageFailed`](crate::Error::StageFailed) for the first failing stage.
pub async fn fund_accounts<T>(ctx: &WorkflowContext<T>) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    if ctx.config().is_public_chain() {
        info!("Fund accounts only works for devnet, skipping for public chains");
        return Sequencer::new("fund-accounts").run().await;
    }

    let monitor = &ctx.monitor()?;

    Sequencer::new("fund-accounts")
        .stage("fetch-signer-dump", move || async move {
            ctx.pull(monitor, SIGNER_DUMP_PATH, SIGNER_DUMP_FILE).await?;
            Ok(())
        })
        .stage("transfer", move || async move {
            let dump = SignerDump::load(ctx.local_path(SIGNER_DUMP_FILE))?;
            let rpc = ChainRpc::for_host(monitor.host(), ctx.settings().root_chain_rpc_port)?;

            let Some((source, recipients)) = dump.entries().split_first() else {
                info!("Signer dump is empty, nothing to fund");
                return Ok(());
            };

            info!("Transferring funds from account[0] to others ...");
            for recipient in recipients {
                let hash = rpc
                    .send_transaction(&source.address, &recipient.address, tokens(FUND_AMOUNT))
                    .await?;
                info!(
                    "Funds transferred from {} to {} with txHash {hash}",
                    source.address, recipient.address
                );
            }
            Ok(())
        })
        .run()
        .await
}
