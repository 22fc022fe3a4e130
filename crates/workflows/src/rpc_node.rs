//! Ready the first primary-client node for RPC testing.

use std::sync::OnceLock;

use devnet_chain::cast::WEI_PER_TOKEN;
use devnet_chain::{ChainRpc, format_ether};
use devnet_transport::RemoteTransport;
use tracing::{info, warn};

use crate::context::WorkflowContext;
use crate::error::{Error, Result};
use crate::sequencer::{Sequencer, WorkflowReport};
use crate::shadow::BOR_START_SCRIPT;

/// Checks the start script for the wallet flag; prints `found` or `not found`.
pub const WALLET_FLAG_CHECK: &str =
    "grep -q 'disable-bor-wallet=false' ~/node/bor-start.sh && echo 'found' || echo 'not found'";

/// Console query for the sync status.
pub const SYNCING_QUERY: &str =
    "~/go/bin/bor attach /var/lib/bor/data/bor.ipc --exec \"eth.syncing\"";

/// File on the node holding its account address.
pub const NODE_ADDRESS_PATH: &str = "/var/lib/bor/address.txt";

const NODE_ADDRESS_FILE: &str = "address.txt";

/// Balances at or below this many wei are reported as too low to test with.
pub const LOW_BALANCE_WEI: u128 = WEI_PER_TOKEN / 2;

/// Account of the RPC node and its balance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RpcNodeAccount {
    /// Account address.
    pub address: String,

    /// Balance in wei.
    pub balance: u128,
}

fn enable_wallet_command() -> String {
    format!(
        "sed -i 's/--allow-insecure-unlock \\\\/&\\n  --disable-bor-wallet=false \\\\/' {BOR_START_SCRIPT}"
    )
}

/// Enable the wallet on the first primary-client node if needed, then report
/// the node account's balance.
///
/// # Errors
///
/// Fails up front when there are no primary-client nodes, otherwise returns
/// [`Error::StageFailed`] for the first failing stage.
pub async fn prepare_rpc_node<T>(
    ctx: &WorkflowContext<T>,
) -> Result<(WorkflowReport, RpcNodeAccount)>
where
    T: RemoteTransport,
{
    let node = ctx
        .topology()
        .primary_nodes()
        .first()
        .ok_or(Error::NoPrimaryNodes("bor"))?;
    let address = &node.address;
    let account = &OnceLock::new();

    let report = Sequencer::new("prepare-rpc-node")
        .stage("enable-wallet", move || async move {
            let found = ctx.run_with_return(address, WALLET_FLAG_CHECK).await?;
            if found == "found" {
                info!("Wallet already enabled on machine {address}");
                return Ok(());
            }

            info!("Enabling the bor wallet on machine {address} ...");
            ctx.run(address, &enable_wallet_command()).await?;
            ctx.run(address, "sudo service bor restart").await?;

            tokio::time::sleep(ctx.settings().restart_settle_delay).await;

            ctx.poller()
                .wait_for(
                    "bor to finish syncing",
                    || ctx.run_with_return(address, SYNCING_QUERY),
                    |syncing| syncing == "false",
                )
                .await?;
            Ok(())
        })
        .stage("check-balance", move || async move {
            let local = ctx.pull(address, NODE_ADDRESS_PATH, NODE_ADDRESS_FILE).await?;
            let contents = tokio::fs::read_to_string(&local)
                .await
                .map_err(|e| Error::Io("failed to read node address", e))?;
            let account_address = contents.lines().next().unwrap_or_default().trim().to_string();
            if account_address.is_empty() {
                return Err(Error::UnexpectedOutput {
                    command: format!("cat {NODE_ADDRESS_PATH}"),
                    output: contents,
                });
            }

            let rpc = match &ctx.settings().bor_rpc_url {
                Some(url) => ChainRpc::new(url)?,
                None => ChainRpc::for_host(node.host(), ctx.settings().bor_rpc_port)?,
            };
            let balance = rpc.get_balance(&account_address).await?;
            info!("Account {account_address} has {} ETH", format_ether(balance));
            if balance <= LOW_BALANCE_WEI {
                warn!("Balance of {account_address} is too low for RPC tests");
            }

            let _ = account.set(RpcNodeAccount {
                address: account_address,
                balance,
            });
            Ok(())
        })
        .run()
        .await?;

    let account = account
        .get()
        .cloned()
        .ok_or(Error::MissingStageInput("node account"))?;
    Ok((report, account))
}
