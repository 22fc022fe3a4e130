//! Error types for devnet workflows.

use thiserror::Error;

use crate::sequencer::WorkflowReport;

/// Result type for workflows.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a workflow can end with.
#[derive(Debug, Error)]
pub enum Error {
    /// Validator id outside `1..=count`.
    #[error("invalid validator id {id}, expected 1..={count}")]
    InvalidValidatorId {
        /// Requested id.
        id: usize,

        /// Validators in the devnet.
        count: usize,
    },

    /// No node can serve as monitor for on-chain calls.
    #[error("no nodes to monitor, please check your configs")]
    NoMonitorNode,

    /// The workflow needs primary-client nodes and there are none.
    #[error("no {0} hosts configured")]
    NoPrimaryNodes(&'static str),

    /// Shadow fork target block must be positive.
    #[error("invalid target block {0}")]
    InvalidBlockNumber(u64),

    /// Every node is already beyond the shadow fork target.
    #[error("all the machines are past the target block {0}")]
    AllNodesPastTarget(u64),

    /// A remote command printed something that could not be interpreted.
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput {
        /// Command that was run.
        command: String,

        /// What it printed.
        output: String,
    },

    /// A stage ran before the stage producing its input.
    #[error("stage input '{0}' was never produced")]
    MissingStageInput(&'static str),

    /// Local file handling failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// A stage failed; `report` lists the stages that completed before it.
    /// Nothing those stages changed is rolled back.
    #[error("workflow {} {}: {source}", .report.workflow, .report.state)]
    StageFailed {
        /// Workflow state at the failure, ending in `Failed(stage)`.
        report: WorkflowReport,

        /// Error of the failing stage.
        #[source]
        source: Box<Error>,
    },

    /// Remote execution failed.
    #[error(transparent)]
    Fleet(#[from] devnet_fleet::Error),

    /// Chain data could not be read or decoded.
    #[error(transparent)]
    Chain(#[from] devnet_chain::Error),

    /// Config could not be resolved into a topology.
    #[error(transparent)]
    Topology(#[from] devnet_topology::Error),
}

impl Error {
    /// The underlying error, looking through [`Error::StageFailed`].
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
