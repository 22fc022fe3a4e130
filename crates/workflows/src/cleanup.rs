//! Tear the devnet down, wipe its state and bootstrap it again.

use devnet_fleet::dispatch::deploy_commands;
use devnet_fleet::StageKind;
use devnet_transport::RemoteTransport;
use tracing::info;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::sequencer::{Sequencer, WorkflowReport};

/// Stop, clean and restart every node, then deploy the child-chain and
/// state-sync contracts from the monitor node.
///
/// # Errors
///
/// Fails up front if there is no monitor node, otherwise returns
/// [`Error::StageFailed`](crate::Error::StageFailed) for the first failing
/// stage. Nothing is rolled back.
pub async fn cleanup<T>(ctx: &WorkflowContext<T>) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    let monitor = &ctx.monitor()?;
    let delay = ctx.settings().deploy_delay;

    let mut sequencer = Sequencer::new("cleanup");
    for stage in [StageKind::Stop, StageKind::Clean, StageKind::Start] {
        sequencer = sequencer.stage(stage.to_string(), move || ctx.run_stage(stage));
    }

    for (stage, command) in deploy_commands() {
        sequencer = sequencer.stage(stage.to_string(), move || async move {
            info!("{} on machine {monitor} ...", command.description);
            tokio::time::sleep(delay).await;
            ctx.run(monitor, &command.command).await
        });
    }

    sequencer.run().await
}

/// Stop every service on every node.
///
/// # Errors
///
/// Returns [`Error::StageFailed`](crate::Error::StageFailed) if the stop stage fails.
pub async fn stop<T>(ctx: &WorkflowContext<T>) -> Result<WorkflowReport>
where
    T: RemoteTransport,
{
    Sequencer::new("stop")
        .stage(StageKind::Stop.to_string(), move || ctx.run_stage(StageKind::Stop))
        .run()
        .await
}
