//! Delegation Ledger
//!
//! Each delegator points at no more than one delegate per project. Delegates
//! keep an ordered list of their delegators; removal swaps the last entry
//! into the vacated slot, so an index observed before a removal may point at
//! a different delegator afterwards.

use gitswarm_core::{Address, Amount, ProjectId, TokenCapability};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GovernanceError, Result};
use crate::parameters::{ParameterKey, ParameterStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DelegationGraph {
    delegate_of: HashMap<Address, Address>,
    delegators: HashMap<Address, Vec<Address>>,
    /// Slot of each delegator inside its delegate's list
    position: HashMap<Address, usize>,
}

impl DelegationGraph {
    fn attach(&mut self, delegator: Address, delegate: Address) {
        let list = self.delegators.entry(delegate).or_default();
        self.position.insert(delegator, list.len());
        list.push(delegator);
        self.delegate_of.insert(delegator, delegate);
    }

    /// Removes the delegator's edge, moving the tail of the list into its slot
    fn detach(&mut self, delegator: &Address) -> Option<Address> {
        let delegate = self.delegate_of.remove(delegator)?;
        let index = self.position.remove(delegator)?;
        let list = self.delegators.get_mut(&delegate)?;
        list.swap_remove(index);
        if let Some(moved) = list.get(index) {
            self.position.insert(*moved, index);
        }
        if list.is_empty() {
            self.delegators.remove(&delegate);
        }
        Some(delegate)
    }

    fn delegators_of(&self, delegate: &Address) -> &[Address] {
        self.delegators
            .get(delegate)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationLedger {
    projects: HashMap<ProjectId, DelegationGraph>,
}

impl DelegationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegate(
        &mut self,
        token: &dyn TokenCapability,
        parameters: &ParameterStore,
        project: ProjectId,
        delegator: Address,
        delegate: Address,
    ) -> Result<()> {
        let graph = self.projects.entry(project).or_default();
        if delegate == delegator || graph.delegate_of.get(&delegate) == Some(&delegator) {
            return Err(GovernanceError::SelfDelegation);
        }
        let minimum = parameters.parameter(project, ParameterKey::MinimumVotingPower);
        if token.balance_of(&delegator) < minimum {
            return Err(GovernanceError::NotEnoughDirectVotingPower);
        }

        let max = usize::try_from(parameters.parameter(project, ParameterKey::MaxNrOfDelegators))
            .unwrap_or(usize::MAX);
        let current = graph.delegators_of(&delegate).len();
        let freed = usize::from(graph.delegate_of.get(&delegator) == Some(&delegate));
        if current - freed >= max {
            return Err(GovernanceError::TooManyDelegators);
        }

        graph.detach(&delegator);
        graph.attach(delegator, delegate);
        debug!("project {}: {} delegated to {}", project, delegator, delegate);
        Ok(())
    }

    /// Removes the caller's delegation, returning the former delegate
    pub fn undelegate(&mut self, project: ProjectId, delegator: Address) -> Result<Address> {
        let delegate = self
            .projects
            .get_mut(&project)
            .and_then(|graph| graph.detach(&delegator))
            .ok_or(GovernanceError::NotDelegated)?;
        debug!("project {}: {} undelegated from {}", project, delegator, delegate);
        Ok(delegate)
    }

    /// Drops every edge pointing at `delegate`, returning the released delegators
    pub fn undelegate_all_from_address(
        &mut self,
        project: ProjectId,
        delegate: Address,
    ) -> Vec<Address> {
        let Some(graph) = self.projects.get_mut(&project) else {
            return Vec::new();
        };
        let released = graph.delegators.remove(&delegate).unwrap_or_default();
        for delegator in &released {
            graph.delegate_of.remove(delegator);
            graph.position.remove(delegator);
        }
        debug!(
            "project {}: released {} delegators of {}",
            project,
            released.len(),
            delegate
        );
        released
    }

    pub fn delegate_of(&self, project: ProjectId, delegator: &Address) -> Option<Address> {
        self.projects
            .get(&project)
            .and_then(|graph| graph.delegate_of.get(delegator))
            .copied()
    }

    pub fn delegators_of(&self, project: ProjectId, delegate: &Address) -> &[Address] {
        self.projects
            .get(&project)
            .map(|graph| graph.delegators_of(delegate))
            .unwrap_or(&[])
    }

    pub fn get_delegated_voting_power(
        &self,
        token: &dyn TokenCapability,
        project: ProjectId,
        delegate: &Address,
    ) -> Amount {
        self.get_delegated_voting_power_excluding_voters(token, project, delegate, |_| false)
    }

    /// Delegated power, skipping delegators for whom `has_voted` holds
    pub fn get_delegated_voting_power_excluding_voters(
        &self,
        token: &dyn TokenCapability,
        project: ProjectId,
        delegate: &Address,
        has_voted: impl Fn(&Address) -> bool,
    ) -> Amount {
        self.delegators_of(project, delegate)
            .iter()
            .filter(|delegator| !has_voted(delegator))
            .fold(0, |sum: Amount, delegator| {
                sum.saturating_add(token.balance_of(delegator))
            })
    }

    pub fn check_voting_power(
        &self,
        token: &dyn TokenCapability,
        project: ProjectId,
        address: &Address,
        required: Amount,
    ) -> bool {
        token
            .balance_of(address)
            .saturating_add(self.get_delegated_voting_power(token, project, address))
            >= required
    }

    /// Delegators of `delegate` below the minimum balance, with ascending indexes
    pub fn get_spam_delegates(
        &self,
        token: &dyn TokenCapability,
        parameters: &ParameterStore,
        project: ProjectId,
        delegate: &Address,
    ) -> (Vec<Address>, Vec<usize>) {
        let minimum = parameters.parameter(project, ParameterKey::MinimumVotingPower);
        self.delegators_of(project, delegate)
            .iter()
            .enumerate()
            .filter(|(_, delegator)| token.balance_of(delegator) < minimum)
            .map(|(index, delegator)| (*delegator, index))
            .unzip()
    }

    /// Removes spam delegators reported by [`Self::get_spam_delegates`].
    ///
    /// All pairs are validated against the current list before anything is
    /// removed. Indexes must be strictly ascending; removal then runs from
    /// the highest index down, so every pending index stays valid across
    /// the swaps. Entries whose balance has recovered are left in place.
    pub fn remove_spam_delegates(
        &mut self,
        token: &dyn TokenCapability,
        parameters: &ParameterStore,
        project: ProjectId,
        delegate: Address,
        addresses: &[Address],
        indexes: &[usize],
    ) -> Result<Vec<Address>> {
        if addresses.len() != indexes.len() {
            return Err(GovernanceError::LengthMismatch);
        }
        if indexes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GovernanceError::UnsortedIndexes);
        }
        let list = self.delegators_of(project, &delegate);
        for (address, index) in addresses.iter().zip(indexes) {
            match list.get(*index) {
                None => return Err(GovernanceError::IndexOutOfBounds),
                Some(found) if found != address => {
                    return Err(GovernanceError::WrongIndexForAddress)
                }
                Some(_) => {}
            }
        }

        let minimum = parameters.parameter(project, ParameterKey::MinimumVotingPower);
        let mut removed = Vec::new();
        if let Some(graph) = self.projects.get_mut(&project) {
            for address in addresses.iter().rev() {
                if token.balance_of(address) < minimum && graph.detach(address).is_some() {
                    removed.push(*address);
                }
            }
        }
        debug!(
            "project {}: removed {} spam delegators of {}",
            project,
            removed.len(),
            delegate
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterBounds;
    use gitswarm_core::{Erc20Token, ONE_TOKEN};
    use std::collections::BTreeMap;

    fn accounts(n: usize) -> Vec<Address> {
        (0..n).map(|i| Address::from_label(&format!("account-{i}"))).collect()
    }

    fn setup(n: usize) -> (Erc20Token, ParameterStore, Vec<Address>) {
        let mut token = Erc20Token::new("GitSwarm", "GS");
        let accounts = accounts(n);
        for account in &accounts {
            token.mint(*account, ONE_TOKEN).unwrap();
        }
        (token, ParameterStore::new(), accounts)
    }

    #[test]
    fn test_delegate_and_power() {
        let (token, params, a) = setup(3);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[1], a[0]).unwrap();
        ledger.delegate(&token, &params, 1, a[2], a[0]).unwrap();
        assert_eq!(ledger.delegate_of(1, &a[1]), Some(a[0]));
        assert_eq!(ledger.delegators_of(1, &a[0]), &[a[1], a[2]]);
        assert_eq!(ledger.get_delegated_voting_power(&token, 1, &a[0]), 2 * ONE_TOKEN);
        assert!(ledger.check_voting_power(&token, 1, &a[0], 3 * ONE_TOKEN));
        assert!(!ledger.check_voting_power(&token, 1, &a[0], 3 * ONE_TOKEN + 1));
    }

    #[test]
    fn test_self_delegation() {
        let (token, params, a) = setup(2);
        let mut ledger = DelegationLedger::new();
        assert_eq!(
            ledger.delegate(&token, &params, 1, a[0], a[0]),
            Err(GovernanceError::SelfDelegation)
        );
        ledger.delegate(&token, &params, 1, a[0], a[1]).unwrap();
        assert_eq!(
            ledger.delegate(&token, &params, 1, a[1], a[0]),
            Err(GovernanceError::SelfDelegation)
        );
    }

    #[test]
    fn test_not_enough_direct_power() {
        let (mut token, params, a) = setup(2);
        let poor = Address::from_label("poor");
        token.mint(poor, 10).unwrap();
        let mut ledger = DelegationLedger::new();
        assert_eq!(
            ledger.delegate(&token, &params, 1, poor, a[0]),
            Err(GovernanceError::NotEnoughDirectVotingPower)
        );
    }

    #[test]
    fn test_redelegate_moves_edge() {
        let (token, params, a) = setup(3);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[0], a[1]).unwrap();
        ledger.delegate(&token, &params, 1, a[0], a[2]).unwrap();
        assert!(ledger.delegators_of(1, &a[1]).is_empty());
        assert_eq!(ledger.delegators_of(1, &a[2]), &[a[0]]);
    }

    #[test]
    fn test_undelegate_then_delegate_appends() {
        let (token, params, a) = setup(4);
        let mut ledger = DelegationLedger::new();
        let d = a[3];
        for account in &a[..3] {
            ledger.delegate(&token, &params, 1, *account, d).unwrap();
        }
        assert_eq!(ledger.undelegate(1, a[1]).unwrap(), d);
        assert_eq!(ledger.delegators_of(1, &d), &[a[0], a[2]]);
        ledger.delegate(&token, &params, 1, a[1], d).unwrap();
        assert_eq!(ledger.delegators_of(1, &d), &[a[0], a[2], a[1]]);
        assert_eq!(ledger.undelegate(1, d), Err(GovernanceError::NotDelegated));
    }

    #[test]
    fn test_undelegate_all() {
        let (token, params, a) = setup(3);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[1], a[0]).unwrap();
        ledger.delegate(&token, &params, 1, a[2], a[0]).unwrap();
        assert_eq!(ledger.undelegate_all_from_address(1, a[0]).len(), 2);
        assert_eq!(ledger.delegate_of(1, &a[1]), None);
        assert_eq!(ledger.get_delegated_voting_power(&token, 1, &a[0]), 0);
    }

    #[test]
    fn test_max_delegators() {
        let (token, _, a) = setup(4);
        let mut overrides = BTreeMap::new();
        overrides.insert(
            ParameterKey::MaxNrOfDelegators,
            ParameterBounds {
                default: 2,
                min: 1,
                max: 10,
            },
        );
        let params = ParameterStore::with_bounds(overrides);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[1], a[0]).unwrap();
        ledger.delegate(&token, &params, 1, a[2], a[0]).unwrap();
        assert_eq!(
            ledger.delegate(&token, &params, 1, a[3], a[0]),
            Err(GovernanceError::TooManyDelegators)
        );
        // Re-pointing an existing edge does not need a free slot
        ledger.delegate(&token, &params, 1, a[2], a[0]).unwrap();
    }

    #[test]
    fn test_power_excluding_voters() {
        let (token, params, a) = setup(3);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[1], a[0]).unwrap();
        ledger.delegate(&token, &params, 1, a[2], a[0]).unwrap();
        let voted = a[1];
        assert_eq!(
            ledger.get_delegated_voting_power_excluding_voters(&token, 1, &a[0], |v| *v == voted),
            ONE_TOKEN
        );
    }

    #[test]
    fn test_spam_delegates_removed() {
        let (mut token, params, a) = setup(5);
        let mut ledger = DelegationLedger::new();
        let d = a[0];
        for account in &a[1..] {
            ledger.delegate(&token, &params, 1, *account, d).unwrap();
        }
        let sink = Address::from_label("sink");
        token.transfer(a[1], sink, ONE_TOKEN).unwrap();
        token.transfer(a[3], sink, ONE_TOKEN).unwrap();

        let (addresses, indexes) = ledger.get_spam_delegates(&token, &params, 1, &d);
        assert_eq!(addresses, vec![a[1], a[3]]);
        assert_eq!(indexes, vec![0, 2]);

        let removed = ledger
            .remove_spam_delegates(&token, &params, 1, d, &addresses, &indexes)
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(ledger.delegators_of(1, &d), &[a[4], a[2]]);
        assert_eq!(ledger.get_delegated_voting_power(&token, 1, &d), 2 * ONE_TOKEN);
        assert!(ledger.get_spam_delegates(&token, &params, 1, &d).0.is_empty());
    }

    #[test]
    fn test_spam_removal_validation() {
        let (mut token, params, a) = setup(3);
        let mut ledger = DelegationLedger::new();
        let d = a[0];
        ledger.delegate(&token, &params, 1, a[1], d).unwrap();
        ledger.delegate(&token, &params, 1, a[2], d).unwrap();
        token.transfer(a[1], d, ONE_TOKEN).unwrap();

        assert_eq!(
            ledger.remove_spam_delegates(&token, &params, 1, d, &[a[1]], &[0, 1]),
            Err(GovernanceError::LengthMismatch)
        );
        assert_eq!(
            ledger.remove_spam_delegates(&token, &params, 1, d, &[a[1]], &[1]),
            Err(GovernanceError::WrongIndexForAddress)
        );
        assert_eq!(
            ledger.remove_spam_delegates(&token, &params, 1, d, &[a[1]], &[5]),
            Err(GovernanceError::IndexOutOfBounds)
        );
        assert_eq!(
            ledger.remove_spam_delegates(&token, &params, 1, d, &[a[2], a[1]], &[1, 0]),
            Err(GovernanceError::UnsortedIndexes)
        );
        assert_eq!(ledger.delegators_of(1, &d).len(), 2);
    }

    #[test]
    fn test_recovered_delegator_is_kept() {
        let (token, params, a) = setup(2);
        let mut ledger = DelegationLedger::new();
        ledger.delegate(&token, &params, 1, a[1], a[0]).unwrap();
        let removed = ledger
            .remove_spam_delegates(&token, &params, 1, a[0], &[a[1]], &[0])
            .unwrap();
        assert!(removed.is_empty());
        assert_eq!(ledger.delegators_of(1, &a[0]), &[a[1]]);
    }
}
