//! Vote weighting and tallies

use gitswarm_core::{mul_div, Address, Amount, ProjectId, TokenCapability};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::delegates::DelegationLedger;
use crate::parameters::{ParameterKey, ParameterStore};

/// A voter's recorded choice and its slot in the proposal's voter list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub index: usize,
    pub support: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub yes: Amount,
    pub no: Amount,
    pub passed: bool,
}

impl VoteTally {
    pub fn new(yes: Amount, no: Amount, percentage: u64) -> Self {
        Self {
            yes,
            no,
            passed: passes(yes, no, percentage),
        }
    }
}

/// True when yes is at least no and holds `percentage` of the weighted votes.
/// A tie passes at 50%.
pub fn passes(yes: Amount, no: Amount, percentage: u64) -> bool {
    if yes < no {
        return false;
    }
    let total = yes.saturating_add(no);
    let percentage = Amount::from(percentage);
    match (yes.checked_mul(100), total.checked_mul(percentage)) {
        (Some(lhs), Some(rhs)) => lhs >= rhs,
        _ => yes >= mul_div(total, percentage, 100).unwrap_or(Amount::MAX),
    }
}

/// Read-only view of everything vote weighting depends on, for one project
pub struct VotingContext<'a> {
    pub project: ProjectId,
    pub token: &'a dyn TokenCapability,
    pub delegates: &'a DelegationLedger,
    pub parameters: &'a ParameterStore,
    /// Voting-token supply outside burn addresses
    pub circulating_supply: Amount,
    pub now: u64,
}

impl VotingContext<'_> {
    pub fn parameter(&self, key: ParameterKey) -> u128 {
        self.parameters.parameter(self.project, key)
    }

    pub fn duration(&self, key: ParameterKey) -> u64 {
        self.parameters.duration(self.project, key)
    }

    /// Own balance plus power of delegators who have not voted themselves
    pub fn voting_power(&self, voter: &Address, votes: &HashMap<Address, VoteRecord>) -> Amount {
        let delegated = self.delegates.get_delegated_voting_power_excluding_voters(
            self.token,
            self.project,
            voter,
            |delegator| votes.contains_key(delegator),
        );
        self.token.balance_of(voter).saturating_add(delegated)
    }

    /// Whether `voter` may take part. The GitSwarm address always may.
    pub fn has_voting_power(&self, voter: &Address, votes: &HashMap<Address, VoteRecord>) -> bool {
        self.parameters.is_gitswarm_address(voter)
            || self.voting_power(voter, votes) >= self.parameter(ParameterKey::MinimumVotingPower)
    }
}
