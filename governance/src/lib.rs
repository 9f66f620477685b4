//! GitSwarm Governance Module
//!
//! Per-project governance state shared by every module of the platform:
//! the bounded parameter store with its trusted-address list, the
//! delegation ledger, and the proposal and voting engine that gates every
//! state-changing action.

pub mod action;
pub mod delegates;
pub mod error;
pub mod parameters;
pub mod proposal;
pub mod voting;

pub use action::{ModuleKind, ProposalAction, TransferEntry};
pub use delegates::DelegationLedger;
pub use error::{GovernanceError, Result};
pub use parameters::{ParameterBounds, ParameterKey, ParameterStore};
pub use proposal::{Proposal, ProposalEngine};
pub use voting::{VoteRecord, VoteTally, VotingContext};

/// Governance configuration constants
pub mod config {
    use gitswarm_core::Amount;

    pub const HOUR: u64 = 3_600;

    pub const DAY: u64 = 24 * HOUR;

    /// Default voting window (3 days)
    pub const DEFAULT_VOTE_DURATION: u64 = 3 * DAY;

    /// Default contest buffer between lock and execution (3 days)
    pub const DEFAULT_BUFFER: u64 = 3 * DAY;

    /// Default window after which a proposal can no longer be locked or executed (7 days)
    pub const DEFAULT_EXPIRATION_PERIOD: u64 = 7 * DAY;

    pub const DEFAULT_MAX_NR_OF_DELEGATORS: u64 = 1_000;

    /// Yes share needed to mint new tokens (80%)
    pub const DEFAULT_CREATE_TOKENS_PERCENTAGE: u64 = 80;

    /// Share of circulating supply whose objection overturns a locked proposal (30%)
    pub const DEFAULT_VETO_MINIMUM_PERCENTAGE: u64 = 30;

    /// Smallest balance allowed to vote, propose or delegate (0.01 token)
    pub const DEFAULT_MINIMUM_VOTING_POWER: Amount = 10_000_000_000_000_000;

    /// Yes share needed by every proposal other than token creation
    pub const MAJORITY_PERCENTAGE: u64 = 50;
}
