//! Role-based command plans.
//!
//! Maps a node and a lifecycle stage to the ordered shell commands that stage
//! runs on it. Pure: nothing here touches the network.

use std::fmt;

use devnet_topology::{ExecutionClient, NodeIdentity};

/// Devnet checkout on the producer machine.
pub const DEVNET_DIR: &str = "~/matic-cli/devnet";

/// Heimdall home directory on every node.
pub const HEIMDALL_HOME: &str = "/var/lib/heimdall";

/// A fleet-wide lifecycle stage.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StageKind {
    /// Stop every service.
    Stop,

    /// Wipe chain and bridge state.
    Clean,

    /// Re-run setup and start every service.
    Start,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Clean => f.write_str("clean"),
            Self::Start => f.write_str("start"),
        }
    }
}

/// A single-node deployment step run on the producer after the fleet is up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DeployStage {
    /// Deploy the child-chain contracts.
    BorContracts,

    /// Deploy and register the state-sync contracts.
    StateSyncContracts,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BorContracts => f.write_str("deploy-bor-contracts"),
            Self::StateSyncContracts => f.write_str("deploy-state-sync-contracts"),
        }
    }
}

/// A shell command with a human readable description.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteCommand {
    /// Progress line logged before the command runs.
    pub description: String,

    /// Shell command executed on the node.
    pub command: String,
}

impl RemoteCommand {
    /// Create a new command.
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
        }
    }
}

fn stop_service(service: &str, display: &str) -> RemoteCommand {
    RemoteCommand::new(
        format!("Stopping {display}"),
        format!(
            "sudo systemctl stop {service}.service || echo \"{display} not running on current machine...\""
        ),
    )
}

fn devnet_script(description: &str, script: &str) -> RemoteCommand {
    RemoteCommand::new(description, format!("cd {DEVNET_DIR} && bash {script}"))
}

/// Ordered commands `stage` runs on `node`.
///
/// Producer-only steps (root-chain simulator and contract bootstrap) come
/// first and are never emitted for followers.
#[must_use]
pub fn commands_for(node: &NodeIdentity, stage: StageKind) -> Vec<RemoteCommand> {
    let client = node.client;
    let mut commands = Vec::new();

    match stage {
        StageKind::Stop => {
            if node.is_producer() {
                commands.push(stop_service("anvil", "anvil"));
            }
            commands.push(stop_service(client.service(), client.service()));
            commands.push(stop_service("heimdalld", "heimdall"));
        }
        StageKind::Clean => {
            if node.is_producer() {
                commands.push(RemoteCommand::new(
                    "Cleaning up anvil",
                    format!("rm -rf ~/data/anvil-db && rm -rf {DEVNET_DIR}/data/anvil-db"),
                ));
            }
            commands.push(RemoteCommand::new(
                "Cleaning up heimdall",
                format!("heimdalld unsafe-reset-all --home {HEIMDALL_HOME}"),
            ));
            commands.push(RemoteCommand::new(
                "Purging queue for heimdall bridge",
                format!("heimdalld heimdall-bridge --home {HEIMDALL_HOME} purge-queue"),
            ));
            commands.push(RemoteCommand::new(
                "Resetting heimdall bridge",
                format!("heimdalld heimdall-bridge --home {HEIMDALL_HOME} unsafe-reset-all"),
            ));
            commands.push(RemoteCommand::new(
                "Cleaning up bridge storage",
                format!("rm -rf {HEIMDALL_HOME}/bridge"),
            ));
            commands.push(RemoteCommand::new(
                format!("Cleaning up {client}"),
                format!("rm -rf {}", client.data_dir()),
            ));
        }
        StageKind::Start => {
            if node.is_producer() {
                commands.push(RemoteCommand::new(
                    "Running anvil",
                    "sudo systemctl start anvil.service",
                ));
                commands.push(devnet_script(
                    "Deploying main net contracts dependencies",
                    "anvil-deploy-dependencies.sh",
                ));
                commands.push(devnet_script(
                    "Deploying main net contracts",
                    "anvil-deployment.sh",
                ));
                commands.push(devnet_script("Setting up validators", "anvil-stake.sh"));
            }
            commands.push(RemoteCommand::new(
                "Setting up heimdall",
                "bash ~/node/heimdalld-setup.sh",
            ));
            commands.push(RemoteCommand::new(
                "Starting heimdall",
                "sudo systemctl start heimdalld.service",
            ));
            commands.push(RemoteCommand::new(
                format!("Setting up {client}"),
                format!("bash {}", client.setup_script()),
            ));
            commands.push(start_client(client));
        }
    }

    commands
}

/// Command starting the execution client service.
#[must_use]
pub fn start_client(client: ExecutionClient) -> RemoteCommand {
    RemoteCommand::new(
        format!("Starting {client}"),
        format!("sudo systemctl start {}.service", client.service()),
    )
}

/// Command for a single deployment step.
#[must_use]
pub fn deploy_command(stage: DeployStage) -> RemoteCommand {
    match stage {
        DeployStage::BorContracts => {
            devnet_script("Deploying contracts for bor", "anvil-deployment-bor.sh")
        }
        DeployStage::StateSyncContracts => {
            devnet_script("Deploying state-sync contracts", "anvil-deployment-sync.sh")
        }
    }
}

/// Deployment steps in the order they must run.
#[must_use]
pub fn deploy_commands() -> Vec<(DeployStage, RemoteCommand)> {
    [DeployStage::BorContracts, DeployStage::StateSyncContracts]
        .into_iter()
        .map(|stage| (stage, deploy_command(stage)))
        .collect()
}
