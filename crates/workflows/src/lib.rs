//! Named multi-stage devnet workflows.
//!
//! Each workflow is a [`Sequencer`] of stages run strictly in order over a
//! [`WorkflowContext`]. Stages fan out across the fleet where the work is
//! per node, and wait for on-chain effects by polling the monitor node.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod cleanup;
mod context;
mod error;
mod fund;
mod rpc_node;
mod sequencer;
mod shadow;
mod signer_change;
mod stake_update;
mod staking;
mod validator_join;

pub use cleanup::{cleanup, stop};
pub use context::{WorkflowContext, WorkflowSettings};
pub use error::{Error, Result};
pub use fund::{FUND_AMOUNT, fund_accounts};
pub use rpc_node::{LOW_BALANCE_WEI, RpcNodeAccount, prepare_rpc_node};
pub use sequencer::{Sequencer, WorkflowReport, WorkflowState};
pub use shadow::{ShadowForkOptions, shadow_commands, shadow_fork};
pub use signer_change::signer_change;
pub use stake_update::{RESTAKE_AMOUNT, stake_update};
pub use staking::validate_validator_id;
pub use validator_join::validator_join;
