//! Shadow fork: freeze the primary-client nodes at a target block and restart
//! them as an isolated chain on the public network's genesis.

use std::sync::OnceLock;

use devnet_fleet::{StageKind, run_across_fleet};
use devnet_topology::NodeIdentity;
use devnet_transport::RemoteTransport;
use rand::Rng;
use serde_json::json;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::{Error, Result};
use crate::sequencer::{Sequencer, WorkflowReport};
use crate::staking::recorded;

/// Genesis file written on each node.
pub const SHADOW_GENESIS_PATH: &str = "~/.bor/shadow-genesis.json";

/// Start script patched to use the shadow genesis.
pub const BOR_START_SCRIPT: &str = "~/node/bor-start.sh";

/// Console query for the latest block number.
pub const BLOCK_NUMBER_QUERY: &str =
    "~/go/bin/bor attach /var/lib/bor/data/bor.ipc --exec \"eth.blockNumber\"";

/// Directory (under the work dir) the fork block is recorded in.
pub const SHADOW_DATA_DIR: &str = "shadowData";

/// Shadow fork parameters.
#[derive(Clone, Debug)]
pub struct ShadowForkOptions {
    /// Block the nodes are forked at.
    pub target_block: u64,

    /// Public network whose genesis is used, `mainnet` or a testnet name.
    pub network: String,

    /// Chain id of the fork; random in `1000..11000` when unset.
    pub chain_id: Option<u64>,
}

impl ShadowForkOptions {
    /// Folder of the launch repository holding the network's genesis.
    #[must_use]
    pub fn launch_folder(&self) -> &'static str {
        if self.network == "mainnet" {
            "mainnet-v1"
        } else {
            "testnet-v4"
        }
    }
}

/// Commands that turn a stopped node into a shadow fork node, in order.
#[must_use]
pub fn shadow_commands(options: &ShadowForkOptions, chain_id: u64) -> Vec<String> {
    vec![
        format!(
            "curl -o {SHADOW_GENESIS_PATH} https://raw.githubusercontent.com/maticnetwork/launch/master/{}/sentry/validator/bor/genesis.json",
            options.launch_folder()
        ),
        format!(
            "sed -i 's/\"chainId\": *[0-9]*/\"chainId\": {chain_id}/' {SHADOW_GENESIS_PATH}"
        ),
        format!(
            "sed -i \"s|{}|\\$BOR_HOME/shadow-genesis.json|g\" {BOR_START_SCRIPT}",
            options.network
        ),
        format!(
            "sed -i 's/--mine$/--mine \\\\\\n  --bor.withoutheimdall \\\\\\n  --bor.devfakeauthor \\\\\\n  --rpc.allow-unprotected-txs \\\\/' {BOR_START_SCRIPT}"
        ),
        "sudo service bor restart".to_string(),
    ]
}

async fn block_number<T>(ctx: &WorkflowContext<T>, node: &NodeIdentity) -> Result<u64>
where
    T: RemoteTransport,
{
    let output = ctx.run_with_return(&node.address, BLOCK_NUMBER_QUERY).await?;
    output.parse().map_err(|_| Error::UnexpectedOutput {
        command: BLOCK_NUMBER_QUERY.to_string(),
        output,
    })
}

/// Run the shadow fork.
///
/// # Errors
///
/// Fails immediately for a zero target or when there are no primary-client
/// nodes, and with [`Error::AllNodesPastTarget`] when every node is already
/// beyond the target. Stage failures come back wrapped in
/// [`Error::StageFailed`].
pub async fn shadow_fork<T>(
    ctx: &WorkflowContext<T>,
    options: &ShadowForkOptions,
) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    let target = options.target_block;
    if target == 0 {
        return Err(Error::InvalidBlockNumber(target));
    }
    if ctx.topology().primary_nodes().is_empty() {
        return Err(Error::NoPrimaryNodes("bor"));
    }

    let chain_id = options
        .chain_id
        .unwrap_or_else(|| rand::thread_rng().gen_range(1000..11000));
    let eligible = &OnceLock::<Vec<NodeIdentity>>::new();

    Sequencer::new("shadow-fork")
        .stage("select-nodes", move || async move {
            let heights = run_across_fleet(ctx.topology().primary_nodes(), |node| {
                block_number(ctx, node)
            })
            .await
            .into_result()?;

            let nodes = ctx
                .topology()
                .primary_nodes()
                .iter()
                .zip(heights)
                .filter_map(|(node, height)| {
                    if height > target {
                        info!(
                            "Latest block already past {target} on machine {}! Skipping machine ...",
                            node.address
                        );
                        None
                    } else {
                        Some(node.clone())
                    }
                })
                .collect::<Vec<_>>();

            if nodes.is_empty() {
                return Err(Error::AllNodesPastTarget(target));
            }

            let _ = eligible.set(nodes);
            Ok(())
        })
        .stage("await-target-block", move || async move {
            let nodes = recorded(eligible, "eligible nodes")?;
            let poller = ctx.poller();
            run_across_fleet(nodes, |node| async move {
                poller
                    .wait_for(
                        &format!("block {target} on {}", node.address),
                        || block_number(ctx, node),
                        |height| *height >= target,
                    )
                    .await
            })
            .await
            .into_result()?;
            Ok(())
        })
        .stage(StageKind::Stop.to_string(), move || ctx.run_stage(StageKind::Stop))
        .stage("rewrite-genesis", move || async move {
            let nodes = recorded(eligible, "eligible nodes")?;
            let commands = &shadow_commands(options, chain_id);
            info!("Downloading genesis, updating start script and restarting bor on machines ...");

            run_across_fleet(nodes, |node| async move {
                for command in commands {
                    ctx.run(&node.address, command).await?;
                }
                Ok::<_, Error>(())
            })
            .await
            .into_result()?;
            Ok(())
        })
        .stage("record-block", move || async move {
            let dir = ctx.local_path(SHADOW_DATA_DIR);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::Io("failed to create shadow data dir", e))?;

            let data = json!({ "blockNumber": target }).to_string();
            tokio::fs::write(dir.join("blockData.json"), data)
                .await
                .map_err(|e| Error::Io("failed to write block data", e))?;

            info!("Shadow fork at block {target} with chain id {chain_id}");
            Ok(())
        })
        .run()
        .await
}
