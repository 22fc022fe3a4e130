//! Shared state for one workflow invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use devnet_chain::rpc::{BOR_RPC_PORT, ROOT_CHAIN_RPC_PORT};
use devnet_fleet::{
    FleetReport, Poller, RemoteExecutor, StageKind, run_plan_across_fleet,
};
use devnet_topology::{DevnetConfig, Topology};
use devnet_transport::{CopyEndpoint, RemoteAddress, RemoteTransport};
use tracing::info;

use crate::error::{Error, Result};

/// Tunables shared by every workflow.
#[derive(Clone, Debug)]
pub struct WorkflowSettings {
    /// Retries after the first attempt of each remote operation.
    pub max_retries: u32,

    /// Pause between attempts.
    pub retry_delay: Duration,

    /// Pause between convergence queries.
    pub poll_interval: Duration,

    /// Give up polling after this long; `None` polls forever.
    pub poll_timeout: Option<Duration>,

    /// Pause before each contract deployment step.
    pub deploy_delay: Duration,

    /// Pause after restarting an execution client before querying it.
    pub restart_settle_delay: Duration,

    /// Local directory artifacts are copied into.
    pub work_dir: PathBuf,

    /// Root-chain RPC port on the monitor node.
    pub root_chain_rpc_port: u16,

    /// Execution client RPC port.
    pub bor_rpc_port: u16,

    /// Execution client RPC endpoint used instead of the node's own
    /// `http://{host}:{bor_rpc_port}`.
    pub bor_rpc_url: Option<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::ZERO,
            poll_interval: Duration::from_secs(3),
            poll_timeout: Some(Duration::from_secs(30 * 60)),
            deploy_delay: Duration::from_secs(60),
            restart_settle_delay: Duration::from_secs(100),
            work_dir: PathBuf::from("."),
            root_chain_rpc_port: ROOT_CHAIN_RPC_PORT,
            bor_rpc_port: BOR_RPC_PORT,
            bor_rpc_url: None,
        }
    }
}

/// Config, topology and executor for one invocation.
pub struct WorkflowContext<T>
where
    T: RemoteTransport,
{
    config: Arc<DevnetConfig>,
    topology: Topology,
    executor: RemoteExecutor<T>,
    settings: WorkflowSettings,
}

impl<T> WorkflowContext<T>
where
    T: RemoteTransport,
{
    /// Resolve the topology and build the executor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Topology`] if the config does not resolve.
    pub fn new(
        config: Arc<DevnetConfig>,
        transport: Arc<T>,
        settings: WorkflowSettings,
    ) -> Result<Self> {
        let topology = Topology::resolve(&config)?;
        let executor = RemoteExecutor::new(transport).with_retry_delay(settings.retry_delay);

        Ok(Self {
            config,
            topology,
            executor,
            settings,
        })
    }

    /// Devnet config.
    #[must_use]
    pub fn config(&self) -> &DevnetConfig {
        &self.config
    }

    /// Resolved node table.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Retrying executor.
    #[must_use]
    pub const fn executor(&self) -> &RemoteExecutor<T> {
        &self.executor
    }

    /// Tunables.
    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Poller configured from the settings.
    #[must_use]
    pub const fn poller(&self) -> Poller {
        Poller::new(self.settings.poll_interval, self.settings.poll_timeout)
    }

    /// Node used for deployments and on-chain calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMonitorNode`] if the topology has none.
    pub fn monitor(&self) -> Result<RemoteAddress> {
        let monitor = self.topology.monitor_address().ok_or(Error::NoMonitorNode)?;
        info!("Monitoring the first node {}", monitor.host());
        Ok(monitor)
    }

    /// Run a command, discarding output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fleet`] once retries are exhausted.
    pub async fn run(&self, address: &RemoteAddress, command: &str) -> Result<()> {
        Ok(self
            .executor
            .run_command(address, command, self.settings.max_retries)
            .await?)
    }

    /// Run a command and return its trimmed output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fleet`] once retries are exhausted.
    pub async fn run_with_return(&self, address: &RemoteAddress, command: &str) -> Result<String> {
        Ok(self
            .executor
            .run_command_with_return(address, command, self.settings.max_retries)
            .await?)
    }

    /// Copy `remote_path` on `address` into the work dir as `file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the work dir cannot be created or the copy fails.
    pub async fn pull(
        &self,
        address: &RemoteAddress,
        remote_path: &str,
        file_name: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.settings.work_dir)
            .await
            .map_err(|e| Error::Io("failed to create work dir", e))?;

        let local = self.local_path(file_name);
        self.executor
            .run_copy(
                &address.endpoint(remote_path),
                &CopyEndpoint::Local(local.clone()),
                self.settings.max_retries,
            )
            .await?;

        Ok(local)
    }

    /// Path of `file_name` inside the work dir.
    #[must_use]
    pub fn local_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.settings.work_dir.join(file_name)
    }

    /// Run a lifecycle stage on every node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fleet`] if any node failed.
    pub async fn run_stage(&self, stage: StageKind) -> Result<()> {
        let report: FleetReport =
            run_plan_across_fleet(&self.executor, &self.topology, stage, self.settings.max_retries)
                .await;
        report.into_result()?;
        Ok(())
    }
}
