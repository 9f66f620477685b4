//! Proposal & Voting Engine
//!
//! Lifecycle of a proposal:
//!
//! 1. A module registers it through [`ProposalEngine::create_proposal`]; the
//!    proposer's yes vote is recorded and voting stays open until `end_time`.
//! 2. After `end_time`, anyone locks the count. A passing proposal enters
//!    the contest buffer (`end_time` moves to the end of the buffer); a
//!    failing one is deleted.
//! 3. During the buffer, holders may contest. Enough objection flips the
//!    decision to reject.
//! 4. After the buffer and before expiration, the owning module executes the
//!    action once through [`ProposalEngine::executable_action`] and
//!    [`ProposalEngine::mark_executed`].
//!
//! Tallies are never cached across calls. Each read re-weighs every
//! recorded voter against current balances and delegations.

use gitswarm_core::{Address, ProjectId, ProposalId};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::action::{ModuleKind, ProposalAction};
use crate::config;
use crate::error::{GovernanceError, Result};
use crate::parameters::ParameterKey;
use crate::voting::{VoteRecord, VoteTally, VotingContext};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub project_id: ProjectId,
    pub proposer: Address,
    pub action: ProposalAction,
    pub created_at: u64,
    /// End of voting while open, end of the contest buffer once locked
    pub end_time: u64,
    pub voting_allowed: bool,
    pub will_execute: bool,
    pub locked: bool,
    pub executed: bool,
    /// Tally frozen at lock time
    pub locked_tally: VoteTally,
    /// Contesters with the flag they contested with
    pub contests: Vec<(Address, bool)>,
    voters: Vec<Address>,
    votes: HashMap<Address, VoteRecord>,
}

impl Proposal {
    pub fn proposal_type(&self) -> u8 {
        self.action.proposal_type()
    }

    pub fn voters(&self) -> &[Address] {
        &self.voters
    }

    pub fn nr_of_voters(&self) -> usize {
        self.voters.len()
    }

    pub fn vote_of(&self, voter: &Address) -> Option<VoteRecord> {
        self.votes.get(voter).copied()
    }

    /// Records or overwrites a vote
    fn record_vote(&mut self, voter: Address, support: bool) {
        match self.votes.get_mut(&voter) {
            Some(record) => record.support = support,
            None => {
                self.votes.insert(
                    voter,
                    VoteRecord {
                        index: self.voters.len(),
                        support,
                    },
                );
                self.voters.push(voter);
            }
        }
    }

    /// Swap-removes the voter at `index`, keeping the moved voter's slot in sync
    fn remove_voter_at(&mut self, index: usize) -> Address {
        let voter = self.voters.swap_remove(index);
        self.votes.remove(&voter);
        if let Some(moved) = self.voters.get(index) {
            if let Some(record) = self.votes.get_mut(moved) {
                record.index = index;
            }
        }
        voter
    }

    fn delete(&mut self) {
        self.voting_allowed = false;
        self.will_execute = false;
        self.locked_tally = VoteTally::default();
        self.voters.clear();
        self.votes.clear();
    }

    fn required_percentage(&self, ctx: &VotingContext) -> u64 {
        match self.action {
            ProposalAction::CreateTokens { .. } => u64::try_from(
                ctx.parameter(ParameterKey::RequiredVotingPowerPercentageToCreateTokens),
            )
            .unwrap_or(100),
            _ => config::MAJORITY_PERCENTAGE,
        }
    }

    fn tally(&self, ctx: &VotingContext, percentage: u64) -> VoteTally {
        let (yes, no) = self.voters.iter().fold((0u128, 0u128), |(yes, no), voter| {
            let weight = ctx.voting_power(voter, &self.votes);
            match self.votes.get(voter) {
                Some(record) if record.support => (yes.saturating_add(weight), no),
                Some(_) => (yes, no.saturating_add(weight)),
                None => (yes, no),
            }
        });
        VoteTally::new(yes, no, percentage)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalEngine {
    /// Modules allowed to register and consume proposals
    modules: BTreeSet<Address>,
    proposals: HashMap<ProjectId, Vec<Proposal>>,
}

impl ProposalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, modules: impl IntoIterator<Item = Address>) -> Result<()> {
        if !self.modules.is_empty() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        self.modules = modules.into_iter().collect();
        Ok(())
    }

    pub fn is_module(&self, caller: &Address) -> bool {
        self.modules.contains(caller)
    }

    fn ensure_module(&self, caller: &Address) -> Result<()> {
        if !self.is_module(caller) {
            return Err(GovernanceError::RestrictedFunction);
        }
        Ok(())
    }

    pub fn next_proposal_id(&self, project: ProjectId) -> ProposalId {
        self.proposals
            .get(&project)
            .map(|list| list.len() as ProposalId)
            .unwrap_or(0)
    }

    pub fn proposal(&self, project: ProjectId, id: ProposalId) -> Option<&Proposal> {
        let index = usize::try_from(id).ok()?;
        self.proposals.get(&project)?.get(index)
    }

    fn proposal_mut(&mut self, project: ProjectId, id: ProposalId) -> Option<&mut Proposal> {
        let index = usize::try_from(id).ok()?;
        self.proposals.get_mut(&project)?.get_mut(index)
    }

    fn existing(&self, project: ProjectId, id: ProposalId) -> Result<&Proposal> {
        self.proposal(project, id)
            .ok_or(GovernanceError::ProposalDoesNotExist)
    }

    fn existing_mut(&mut self, project: ProjectId, id: ProposalId) -> Result<&mut Proposal> {
        self.proposal_mut(project, id)
            .ok_or(GovernanceError::ProposalDoesNotExist)
    }

    /// Registers a proposal on behalf of a module and casts the proposer's yes vote
    pub fn create_proposal(
        &mut self,
        caller: Address,
        ctx: &VotingContext,
        proposer: Address,
        action: ProposalAction,
    ) -> Result<ProposalId> {
        self.ensure_module(&caller)?;
        if !ctx.has_voting_power(&proposer, &HashMap::new()) {
            return Err(GovernanceError::NotEnoughVotingPower);
        }

        let id = self.next_proposal_id(ctx.project);
        let end_time = ctx
            .now
            .saturating_add(ctx.duration(ParameterKey::VoteDuration));
        let mut proposal = Proposal {
            id,
            project_id: ctx.project,
            proposer,
            action,
            created_at: ctx.now,
            end_time,
            voting_allowed: true,
            will_execute: false,
            locked: false,
            executed: false,
            locked_tally: VoteTally::default(),
            contests: Vec::new(),
            voters: Vec::new(),
            votes: HashMap::new(),
        };
        proposal.record_vote(proposer, true);
        info!(
            "project {}: proposal {} of type {} created by {}, voting ends at {}",
            ctx.project,
            id,
            proposal.proposal_type(),
            proposer,
            end_time
        );
        self.proposals.entry(ctx.project).or_default().push(proposal);
        Ok(id)
    }

    pub fn vote(
        &mut self,
        ctx: &VotingContext,
        id: ProposalId,
        voter: Address,
        support: bool,
    ) -> Result<()> {
        let proposal = self
            .proposal_mut(ctx.project, id)
            .filter(|p| p.voting_allowed)
            .ok_or(GovernanceError::ProposalInactive)?;
        if ctx.now > proposal.end_time {
            return Err(GovernanceError::VotingPeriodEnded);
        }
        if !ctx.has_voting_power(&voter, &proposal.votes) {
            return Err(GovernanceError::NotEnoughVotingPower);
        }
        proposal.record_vote(voter, support);
        debug!(
            "project {}: {} voted {} on proposal {}",
            ctx.project,
            voter,
            if support { "yes" } else { "no" },
            id
        );
        Ok(())
    }

    pub fn get_vote_count(&self, ctx: &VotingContext, id: ProposalId) -> Result<VoteTally> {
        self.check_vote_count(ctx, id, config::MAJORITY_PERCENTAGE)
    }

    /// Live weighted tally, `passed` judged against `percentage`
    pub fn check_vote_count(
        &self,
        ctx: &VotingContext,
        id: ProposalId,
        percentage: u64,
    ) -> Result<VoteTally> {
        Ok(self.existing(ctx.project, id)?.tally(ctx, percentage))
    }

    /// Freezes the count after voting ends. Returns whether the proposal will execute.
    pub fn lock_vote_count(&mut self, ctx: &VotingContext, id: ProposalId) -> Result<bool> {
        let expiration = ctx.duration(ParameterKey::ExpirationPeriod);
        let buffer = ctx.duration(ParameterKey::BufferBetweenEndOfVotingAndExecuteProposal);
        let proposal = self
            .proposal_mut(ctx.project, id)
            .filter(|p| p.voting_allowed)
            .ok_or(GovernanceError::ProposalInactive)?;
        if ctx.now <= proposal.end_time {
            return Err(GovernanceError::VotingOngoing);
        }
        if ctx.now > proposal.end_time.saturating_add(expiration) {
            return Err(GovernanceError::ProposalExpired);
        }

        let tally = proposal.tally(ctx, proposal.required_percentage(ctx));
        proposal.locked = true;
        proposal.voting_allowed = false;
        if tally.passed {
            proposal.will_execute = true;
            proposal.locked_tally = tally;
            proposal.end_time = ctx.now.saturating_add(buffer);
        } else {
            proposal.delete();
        }
        info!(
            "project {}: proposal {} locked with yes={} no={}, will execute: {}",
            ctx.project, id, tally.yes, tally.no, tally.passed
        );
        Ok(tally.passed)
    }

    /// Objects to a locked proposal during its buffer.
    ///
    /// The contester's vote is re-cast as an objection whichever flag is
    /// given. The decision flips to reject when objections outweigh
    /// support or reach the veto share of circulating supply. Returns
    /// whether the proposal still executes.
    pub fn contest_proposal(
        &mut self,
        ctx: &VotingContext,
        id: ProposalId,
        contester: Address,
        support: bool,
    ) -> Result<bool> {
        let needed = ctx
            .parameters
            .needed_to_contest(ctx.project, ctx.circulating_supply)?;
        let proposal = self
            .proposal_mut(ctx.project, id)
            .filter(|p| p.locked && p.will_execute && !p.voting_allowed && ctx.now < p.end_time)
            .ok_or(GovernanceError::NotContestable)?;
        if !ctx.has_voting_power(&contester, &proposal.votes) {
            return Err(GovernanceError::NotEnoughVotingPower);
        }

        proposal.record_vote(contester, false);
        proposal.contests.push((contester, support));
        let tally = proposal.tally(ctx, config::MAJORITY_PERCENTAGE);
        if tally.no > tally.yes || tally.no >= needed {
            proposal.will_execute = false;
        }
        info!(
            "project {}: proposal {} contested by {}, yes={} no={} needed={}, will execute: {}",
            ctx.project, id, contester, tally.yes, tally.no, needed, proposal.will_execute
        );
        Ok(proposal.will_execute)
    }

    /// Execute gate. Returns the action once the proposal is executable by `module`.
    pub fn executable_action(
        &self,
        module: ModuleKind,
        project: ProjectId,
        id: ProposalId,
        now: u64,
        expiration_period: u64,
    ) -> Result<ProposalAction> {
        let proposal = self
            .proposal(project, id)
            .filter(|p| !p.executed)
            .ok_or(GovernanceError::ProposalDoesNotExist)?;
        if now < proposal.end_time {
            return Err(GovernanceError::BufferNotEnded);
        }
        if now > proposal.end_time.saturating_add(expiration_period) {
            return Err(GovernanceError::ExecutePeriodExpired);
        }
        if !proposal.will_execute {
            return Err(GovernanceError::NotApproved);
        }
        if proposal.action.executed_by() != module {
            return Err(GovernanceError::UnexpectedProposalType);
        }
        Ok(proposal.action.clone())
    }

    /// Consumes an executed proposal so a second execution fails
    pub fn mark_executed(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
    ) -> Result<()> {
        self.ensure_module(&caller)?;
        let proposal = self
            .proposal_mut(project, id)
            .filter(|p| !p.executed)
            .ok_or(GovernanceError::ProposalDoesNotExist)?;
        proposal.executed = true;
        proposal.will_execute = false;
        info!("project {}: proposal {} executed", project, id);
        Ok(())
    }

    pub fn set_active(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
        active: bool,
    ) -> Result<()> {
        self.ensure_module(&caller)?;
        self.existing_mut(project, id)?.voting_allowed = active;
        Ok(())
    }

    pub fn set_will_execute(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
        will_execute: bool,
    ) -> Result<()> {
        self.ensure_module(&caller)?;
        self.existing_mut(project, id)?.will_execute = will_execute;
        Ok(())
    }

    pub fn delete_proposal(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
    ) -> Result<()> {
        self.ensure_module(&caller)?;
        self.existing_mut(project, id)?.delete();
        Ok(())
    }

    pub fn get_voters(&self, project: ProjectId, id: ProposalId) -> Result<&[Address]> {
        Ok(self.existing(project, id)?.voters())
    }

    pub fn has_voted_already(&self, project: ProjectId, id: ProposalId, voter: &Address) -> bool {
        self.proposal(project, id)
            .map(|p| p.votes.contains_key(voter))
            .unwrap_or(false)
    }

    /// `(has_voted, voted_yes)` for one address
    pub fn get_votes(&self, project: ProjectId, id: ProposalId, voter: &Address) -> (bool, bool) {
        match self.proposal(project, id).and_then(|p| p.vote_of(voter)) {
            Some(record) => (true, record.support),
            None => (false, false),
        }
    }

    /// Ascending indexes of voters whose power fell below the minimum
    pub fn get_spam_voters(&self, ctx: &VotingContext, id: ProposalId) -> Result<Vec<usize>> {
        let proposal = self.existing(ctx.project, id)?;
        Ok(proposal
            .voters
            .iter()
            .enumerate()
            .filter(|(_, voter)| !ctx.has_voting_power(voter, &proposal.votes))
            .map(|(index, _)| index)
            .collect())
    }

    /// Drops spam voters at strictly ascending `indexes`.
    ///
    /// Spam status is judged once against the current voter set, then the
    /// entries are swap-removed from the highest index down. Indexes that
    /// point at legitimate voters are skipped.
    pub fn remove_spam_voters(
        &mut self,
        ctx: &VotingContext,
        id: ProposalId,
        indexes: &[usize],
    ) -> Result<Vec<Address>> {
        if indexes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GovernanceError::UnsortedIndexes);
        }
        let proposal = self.existing(ctx.project, id)?;
        if indexes.last().is_some_and(|last| *last >= proposal.voters.len()) {
            return Err(GovernanceError::IndexOutOfBounds);
        }
        let spam: Vec<usize> = indexes
            .iter()
            .copied()
            .filter(|index| !ctx.has_voting_power(&proposal.voters[*index], &proposal.votes))
            .collect();

        let proposal = self.existing_mut(ctx.project, id)?;
        let removed: Vec<Address> = spam
            .into_iter()
            .rev()
            .map(|index| proposal.remove_voter_at(index))
            .collect();
        debug!(
            "project {}: removed {} spam voters from proposal {}",
            ctx.project,
            removed.len(),
            id
        );
        Ok(removed)
    }
}
