//! CLI binary driving devnet workflows over ssh.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use devnet_topology::{DevnetConfig, Topology};
use devnet_transport_ssh::{SshOptions, SshTransport};
use devnet_workflows::{
    ShadowForkOptions, WorkflowContext, WorkflowReport, WorkflowSettings, cleanup,
    fund_accounts, prepare_rpc_node, shadow_fork, signer_change, stake_update, stop,
    validator_join,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Config could not be loaded or resolved.
    #[error(transparent)]
    Topology(#[from] devnet_topology::Error),

    /// A workflow failed.
    #[error(transparent)]
    Workflow(#[from] devnet_workflows::Error),

    /// Topology could not be rendered.
    #[error("failed to render topology: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Devnet setup config (YAML)
    #[arg(
        long,
        default_value = "remote-setup-config.yaml",
        env = "DEVNET_CONFIG"
    )]
    config: PathBuf,

    /// Directory artifacts copied from the nodes are written to
    #[arg(long, default_value = ".", env = "DEVNET_WORK_DIR")]
    work_dir: PathBuf,

    /// Retries after the first attempt of every remote command or copy
    #[arg(long, default_value_t = 5, env = "DEVNET_MAX_RETRIES")]
    max_retries: u32,

    /// Seconds between attempts of a failing remote operation
    #[arg(long, default_value_t = 0, env = "DEVNET_RETRY_DELAY_SECS")]
    retry_delay_secs: u64,

    /// Seconds between convergence queries
    #[arg(long, default_value_t = 3, env = "DEVNET_POLL_INTERVAL_SECS")]
    poll_interval_secs: u64,

    /// Give up waiting for on-chain effects after this many seconds (0 waits forever)
    #[arg(long, default_value_t = 1800, env = "DEVNET_POLL_TIMEOUT_SECS")]
    poll_timeout_secs: u64,

    /// Seconds to wait before each contract deployment
    #[arg(long, default_value_t = 60, env = "DEVNET_DEPLOY_DELAY_SECS")]
    deploy_delay_secs: u64,

    /// Seconds to wait after restarting bor before querying it
    #[arg(long, default_value_t = 100, env = "DEVNET_RESTART_SETTLE_SECS")]
    restart_settle_secs: u64,

    /// Execution client RPC used by prepare-rpc-node instead of the node's own
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Identity file for ssh and scp
    #[arg(long, env = "DEVNET_SSH_IDENTITY")]
    ssh_identity: Option<PathBuf>,

    /// ssh connect timeout in seconds
    #[arg(long, default_value_t = 30, env = "DEVNET_SSH_CONNECT_TIMEOUT_SECS")]
    ssh_connect_timeout_secs: u64,

    /// Verify host keys against known_hosts
    #[arg(long, env = "DEVNET_SSH_STRICT_HOST_KEYS")]
    ssh_strict_host_keys: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Stop, wipe and restart every node, then redeploy contracts
    Cleanup,

    /// Stop every service on every node
    Stop,

    /// Rotate a validator's signer key
    SignerChange {
        /// Validator id (1-based)
        #[arg(long, env = "DEVNET_VALIDATOR_ID")]
        validator_id: usize,
    },

    /// Restake additional tokens for a validator
    StakeUpdate {
        /// Validator id (1-based)
        #[arg(long, env = "DEVNET_VALIDATOR_ID")]
        validator_id: usize,
    },

    /// Stake a new validator from an existing validator's account
    Stake {
        /// Validator id (1-based) paying for the stake
        #[arg(long, env = "DEVNET_VALIDATOR_ID")]
        validator_id: usize,
    },

    /// Fork the bor nodes off a public network at a target block
    Shadow {
        /// Block to fork at
        #[arg(long, env = "SHADOW_BLOCK")]
        target_block: u64,

        /// Public network providing the genesis
        #[arg(long, default_value = "mainnet", env = "NETWORK")]
        network: String,

        /// Chain id of the fork (random when unset)
        #[arg(long, env = "SHADOW_CHAIN_ID")]
        chain_id: Option<u64>,
    },

    /// Fund every genesis account from the first one
    FundAccounts,

    /// Enable the wallet on the first bor node and report its balance
    PrepareRpcNode,

    /// Print the resolved node table
    Topology {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    fn settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            poll_timeout: (self.poll_timeout_secs > 0)
                .then(|| Duration::from_secs(self.poll_timeout_secs)),
            deploy_delay: Duration::from_secs(self.deploy_delay_secs),
            restart_settle_delay: Duration::from_secs(self.restart_settle_secs),
            work_dir: self.work_dir.clone(),
            bor_rpc_url: self.rpc_url.clone(),
            ..WorkflowSettings::default()
        }
    }

    fn ssh_options(&self) -> SshOptions {
        SshOptions {
            connect_timeout: Duration::from_secs(self.ssh_connect_timeout_secs),
            identity_file: self.ssh_identity.clone(),
            skip_host_key_check: !self.ssh_strict_host_keys,
        }
    }
}

fn print_topology(config: &DevnetConfig, json: bool) -> Result<(), Error> {
    let topology = Topology::resolve(config)?;

    if json {
        let nodes = topology.iter().collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    for node in &topology {
        println!("{node}");
    }
    match topology.monitor_address() {
        Some(monitor) => println!("monitor: {monitor}"),
        None => println!("monitor: none"),
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), Error> {
    let config = DevnetConfig::from_yaml_file(&args.config)?;
    info!("loaded devnet config from {}", args.config.display());

    if let Command::Topology { json } = args.command {
        return print_topology(&config, json);
    }

    let transport = Arc::new(SshTransport::new(args.ssh_options()));
    let ctx = WorkflowContext::new(Arc::new(config), transport, args.settings())?;

    let report: WorkflowReport = match args.command {
        Command::Cleanup => cleanup(&ctx).await?,
        Command::Stop => stop(&ctx).await?,
        Command::SignerChange { validator_id } => signer_change(&ctx, validator_id).await?,
        Command::StakeUpdate { validator_id } => stake_update(&ctx, validator_id).await?,
        Command::Stake { validator_id } => validator_join(&ctx, validator_id).await?,
        Command::Shadow {
            target_block,
            network,
            chain_id,
        } => {
            let options = ShadowForkOptions {
                target_block,
                network,
                chain_id,
            };
            shadow_fork(&ctx, &options).await?
        }
        Command::FundAccounts => fund_accounts(&ctx).await?,
        Command::PrepareRpcNode => {
            let (report, account) = prepare_rpc_node(&ctx).await?;
            info!("RPC node account {} balance {} wei", account.address, account.balance);
            report
        }
        Command::Topology { .. } => return Ok(()),
    };

    info!(
        "workflow {} {} ({} stages)",
        report.workflow,
        report.state,
        report.completed.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
