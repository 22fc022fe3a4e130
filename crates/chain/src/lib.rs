//! Chain-facing helpers for devnet workflows.
//!
//! Nothing here runs remote commands itself: staking queries and `cast`
//! transactions are rendered as shell commands for the fleet executor, and
//! their output is parsed here. Only [`ChainRpc`] talks to a node directly.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifacts;
pub mod cast;
mod error;
mod keys;
pub mod rpc;
pub mod staking;

pub use artifacts::{ContractAddresses, SignerDump, SignerEntry};
pub use cast::{CastSend, tokens};
pub use error::{Error, Result};
pub use keys::KeyPair;
pub use rpc::{ChainRpc, format_ether};
pub use staking::ValidatorInfo;
