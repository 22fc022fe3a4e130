//! Concurrent fan-out of per-node work.

use std::fmt::Display;
use std::future::Future;

use devnet_topology::{NodeIdentity, Topology};
use devnet_transport::RemoteTransport;
use futures::future::join_all;
use tracing::{error, info};

use crate::dispatch::{StageKind, commands_for};
use crate::error::{Error, Result};
use crate::executor::RemoteExecutor;

/// Outcome of one node's chain of work.
#[derive(Debug)]
pub struct NodeOutcome<T, E = Error> {
    /// Index of the node in the topology.
    pub index: usize,

    /// What the chain returned.
    pub result: std::result::Result<T, E>,
}

/// Outcomes of a fleet-wide stage, in node order.
#[derive(Debug)]
pub struct FleetReport<T = (), E = Error> {
    outcomes: Vec<NodeOutcome<T, E>>,
}

impl<T, E> FleetReport<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Per-node outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[NodeOutcome<T, E>] {
        &self.outcomes
    }

    /// Indices of nodes whose chain failed.
    #[must_use]
    pub fn failed(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.index)
            .collect()
    }

    /// Whether every node succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// Collapse into the per-node values, or a single stage error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FleetFailed`] listing every failed node, with the
    /// first failure as its source.
    pub fn into_result(self) -> Result<Vec<T>> {
        let total = self.outcomes.len();
        let failed = self.failed();

        let mut values = Vec::with_capacity(total);
        let mut first_error = None;

        for outcome in self.outcomes {
            match outcome.result {
                Ok(value) => values.push(value),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => Ok(values),
            Some(source) => Err(Error::FleetFailed {
                failed,
                total,
                source: Box::new(source),
            }),
        }
    }
}

/// Run `task` for every node concurrently and wait for all of them.
///
/// A failing node does not cancel its siblings; every chain runs to
/// completion before the report is returned.
pub async fn run_across_fleet<'a, T, E, F, Fut>(
    nodes: impl IntoIterator<Item = &'a NodeIdentity>,
    task: F,
) -> FleetReport<T, E>
where
    E: Display,
    F: Fn(&'a NodeIdentity) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let chains = nodes.into_iter().map(|node| {
        let index = node.index;
        let chain = task(node);
        async move {
            NodeOutcome {
                index,
                result: chain.await,
            }
        }
    });

    let outcomes = join_all(chains).await;

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            error!("node {} failed: {e}", outcome.index);
        }
    }

    FleetReport { outcomes }
}

/// Run every command of `stage` on its node, nodes in parallel and each
/// node's commands in order.
pub async fn run_plan_across_fleet<T>(
    executor: &RemoteExecutor<T>,
    topology: &Topology,
    stage: StageKind,
    max_retries: u32,
) -> FleetReport
where
    T: RemoteTransport,
{
    run_across_fleet(topology, |node| async move {
        for command in commands_for(node, stage) {
            info!("{} on machine {} ...", command.description, node.address);
            executor
                .run_command(&node.address, &command.command, max_retries)
                .await?;
        }
        Ok(())
    })
    .await
}
