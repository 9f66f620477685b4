//! GitSwarm Core Library
//!
//! Primitives shared by every governance module: addresses and amounts,
//! the clock, the fungible token capability, the simulated chain that hosts
//! native balances and token contracts, and the event log.

pub mod address;
pub mod amount;
pub mod chain;
pub mod clock;
pub mod error;
pub mod event;
pub mod token;

pub use address::Address;
pub use amount::{mul_div, Amount, ProjectId, ProposalId, ONE_TOKEN};
pub use chain::Chain;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ErrorKind, Result};
pub use event::{Event, EventLog};
pub use token::{Erc20Token, TokenBehavior, TokenCapability, TokenMethod};

/// Reserved project id of the GitSwarm platform itself
pub const GITSWARM_PROJECT_ID: ProjectId = 0;
