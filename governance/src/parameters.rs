//! Parameter Store
//!
//! Bounded per-project governance parameters plus the trusted-address
//! allow-list consulted by privileged treasury operations. Every project
//! carries an immutable set of implicitly trusted core addresses, fixed when
//! the registry initializes the project, which proposals can never remove.

use gitswarm_core::{mul_div, Address, Amount, ProjectId, ProposalId};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::action::{ModuleKind, ProposalAction};
use crate::config;
use crate::error::{GovernanceError, Result};
use crate::proposal::ProposalEngine;
use crate::voting::VotingContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParameterKey {
    VoteDuration,
    MaxNrOfDelegators,
    BufferBetweenEndOfVotingAndExecuteProposal,
    RequiredVotingPowerPercentageToCreateTokens,
    VetoMinimumPercentage,
    ExpirationPeriod,
    MinimumVotingPower,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 7] = [
        ParameterKey::VoteDuration,
        ParameterKey::MaxNrOfDelegators,
        ParameterKey::BufferBetweenEndOfVotingAndExecuteProposal,
        ParameterKey::RequiredVotingPowerPercentageToCreateTokens,
        ParameterKey::VetoMinimumPercentage,
        ParameterKey::ExpirationPeriod,
        ParameterKey::MinimumVotingPower,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::VoteDuration => "VoteDuration",
            ParameterKey::MaxNrOfDelegators => "MaxNrOfDelegators",
            ParameterKey::BufferBetweenEndOfVotingAndExecuteProposal => {
                "BufferBetweenEndOfVotingAndExecuteProposal"
            }
            ParameterKey::RequiredVotingPowerPercentageToCreateTokens => {
                "RequiredVotingPowerPercentageToCreateTokens"
            }
            ParameterKey::VetoMinimumPercentage => "VetoMinimumPercentage",
            ParameterKey::ExpirationPeriod => "ExpirationPeriod",
            ParameterKey::MinimumVotingPower => "MinimumVotingPower",
        }
    }

    /// Built-in default and bounds
    pub fn default_bounds(&self) -> ParameterBounds {
        let (default, min, max): (u128, u128, u128) = match self {
            ParameterKey::VoteDuration => (
                config::DEFAULT_VOTE_DURATION.into(),
                60,
                (30 * config::DAY).into(),
            ),
            ParameterKey::MaxNrOfDelegators => {
                (config::DEFAULT_MAX_NR_OF_DELEGATORS.into(), 1, 10_000)
            }
            ParameterKey::BufferBetweenEndOfVotingAndExecuteProposal => (
                config::DEFAULT_BUFFER.into(),
                60,
                (30 * config::DAY).into(),
            ),
            ParameterKey::RequiredVotingPowerPercentageToCreateTokens => {
                (config::DEFAULT_CREATE_TOKENS_PERCENTAGE.into(), 50, 100)
            }
            ParameterKey::VetoMinimumPercentage => {
                (config::DEFAULT_VETO_MINIMUM_PERCENTAGE.into(), 1, 100)
            }
            ParameterKey::ExpirationPeriod => (
                config::DEFAULT_EXPIRATION_PERIOD.into(),
                config::HOUR.into(),
                (90 * config::DAY).into(),
            ),
            ParameterKey::MinimumVotingPower => (
                config::DEFAULT_MINIMUM_VOTING_POWER,
                1,
                1_000_000 * gitswarm_core::ONE_TOKEN,
            ),
        };
        ParameterBounds { default, min, max }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self> {
        ParameterKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| GovernanceError::UnknownParameter(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub default: u128,
    pub min: u128,
    pub max: u128,
}

impl ParameterBounds {
    pub fn contains(&self, value: u128) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProjectTrust {
    /// Fixed at project creation; only a voting-token change rebinds an entry
    core: BTreeSet<Address>,
    trusted: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterStore {
    bounds: BTreeMap<ParameterKey, ParameterBounds>,
    values: HashMap<ProjectId, BTreeMap<ParameterKey, u128>>,
    trust: HashMap<ProjectId, ProjectTrust>,
    gitswarm_address: Option<Address>,
    registry: Option<Address>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_bounds(BTreeMap::new())
    }

    /// Store whose bounds are overridden per key
    pub fn with_bounds(overrides: BTreeMap<ParameterKey, ParameterBounds>) -> Self {
        let mut bounds: BTreeMap<ParameterKey, ParameterBounds> = ParameterKey::ALL
            .iter()
            .map(|key| (*key, key.default_bounds()))
            .collect();
        bounds.extend(overrides);
        Self {
            bounds,
            values: HashMap::new(),
            trust: HashMap::new(),
            gitswarm_address: None,
            registry: None,
        }
    }

    /// One-time wiring: the registry that may open projects and the platform address
    pub fn initialize(
        &mut self,
        registry: Address,
        gitswarm_address: Option<Address>,
    ) -> Result<()> {
        if self.registry.is_some() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        self.registry = Some(registry);
        self.gitswarm_address = gitswarm_address.filter(|a| !a.is_zero());
        Ok(())
    }

    pub fn initialize_project(
        &mut self,
        caller: Address,
        project: ProjectId,
        core: impl IntoIterator<Item = Address>,
    ) -> Result<()> {
        self.ensure_registry(caller)?;
        if self.trust.contains_key(&project) {
            return Err(GovernanceError::AlreadyInitialized);
        }
        let defaults = self
            .bounds
            .iter()
            .map(|(key, bounds)| (*key, bounds.default))
            .collect();
        self.values.insert(project, defaults);
        self.trust.insert(
            project,
            ProjectTrust {
                core: core.into_iter().collect(),
                trusted: Vec::new(),
            },
        );
        Ok(())
    }

    /// Swaps one implicit core address, used when a project changes its voting token
    pub fn rebind_core_address(
        &mut self,
        caller: Address,
        project: ProjectId,
        old: Address,
        new: Address,
    ) -> Result<()> {
        self.ensure_registry(caller)?;
        let trust = self
            .trust
            .get_mut(&project)
            .ok_or(GovernanceError::UnknownProject)?;
        trust.core.remove(&old);
        trust.core.insert(new);
        Ok(())
    }

    pub fn is_project(&self, project: ProjectId) -> bool {
        self.trust.contains_key(&project)
    }

    pub fn bounds(&self, key: ParameterKey) -> ParameterBounds {
        self.bounds
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.default_bounds())
    }

    pub fn parameter(&self, project: ProjectId, key: ParameterKey) -> u128 {
        self.values
            .get(&project)
            .and_then(|values| values.get(&key))
            .copied()
            .unwrap_or_else(|| self.bounds(key).default)
    }

    /// Parameter read as a number of seconds
    pub fn duration(&self, project: ProjectId, key: ParameterKey) -> u64 {
        u64::try_from(self.parameter(project, key)).unwrap_or(u64::MAX)
    }

    pub fn validate_value(&self, key: ParameterKey, value: u128) -> Result<()> {
        if !self.bounds(key).contains(value) {
            return Err(GovernanceError::ValueOutOfRange);
        }
        Ok(())
    }

    pub fn is_trusted_address(&self, project: ProjectId, address: &Address) -> bool {
        match self.trust.get(&project) {
            Some(trust) => trust.core.contains(address) || trust.trusted.contains(address),
            None => false,
        }
    }

    /// Governed allow-list, excluding the implicit core set
    pub fn trusted_addresses(&self, project: ProjectId) -> &[Address] {
        self.trust
            .get(&project)
            .map(|trust| trust.trusted.as_slice())
            .unwrap_or(&[])
    }

    pub fn gitswarm_address(&self) -> Option<Address> {
        self.gitswarm_address
    }

    pub fn is_gitswarm_address(&self, address: &Address) -> bool {
        self.gitswarm_address.as_ref() == Some(address)
    }

    /// The platform address renounces its privileges
    pub fn remove_gitswarm_address(&mut self, caller: Address) -> Result<()> {
        if !self.is_gitswarm_address(&caller) {
            return Err(GovernanceError::RestrictedFunction);
        }
        info!("GitSwarm address {} removed", caller);
        self.gitswarm_address = None;
        Ok(())
    }

    pub fn has_min_balance(&self, project: ProjectId, address: &Address, balance: Amount) -> bool {
        self.is_gitswarm_address(address)
            || balance >= self.parameter(project, ParameterKey::MinimumVotingPower)
    }

    /// Objection weight that overturns a locked proposal
    pub fn needed_to_contest(
        &self,
        project: ProjectId,
        circulating_supply: Amount,
    ) -> Result<Amount> {
        let percentage = self.parameter(project, ParameterKey::VetoMinimumPercentage);
        Ok(mul_div(percentage, circulating_supply, 100)?)
    }

    pub fn propose_parameter_change(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        key: ParameterKey,
        value: u128,
    ) -> Result<ProposalId> {
        self.validate_value(key, value)?;
        engine.create_proposal(
            ModuleKind::Parameters.address(),
            ctx,
            proposer,
            ProposalAction::ChangeParameter { key, value },
        )
    }

    pub fn propose_change_trusted_address(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        address: Address,
        add: bool,
    ) -> Result<ProposalId> {
        if address.is_zero() {
            return Err(gitswarm_core::CoreError::ZeroAddress.into());
        }
        engine.create_proposal(
            ModuleKind::Parameters.address(),
            ctx,
            proposer,
            ProposalAction::ChangeTrustedAddress { address, add },
        )
    }

    pub fn execute_proposal(
        &mut self,
        engine: &mut ProposalEngine,
        project: ProjectId,
        proposal_id: ProposalId,
        now: u64,
    ) -> Result<()> {
        let expiration = self.duration(project, ParameterKey::ExpirationPeriod);
        let action =
            engine.executable_action(ModuleKind::Parameters, project, proposal_id, now, expiration)?;
        match action {
            ProposalAction::ChangeParameter { key, value } => {
                self.validate_value(key, value)?;
                self.values.entry(project).or_default().insert(key, value);
                info!("project {} parameter {} set to {}", project, key, value);
            }
            ProposalAction::ChangeTrustedAddress { address, add } => {
                self.toggle_trusted(project, address, add)?;
            }
            _ => return Err(GovernanceError::UnexpectedProposalType),
        }
        engine.mark_executed(ModuleKind::Parameters.address(), project, proposal_id)
    }

    fn toggle_trusted(&mut self, project: ProjectId, address: Address, add: bool) -> Result<()> {
        let trust = self
            .trust
            .get_mut(&project)
            .ok_or(GovernanceError::UnknownProject)?;
        if trust.core.contains(&address) {
            return Err(if add {
                GovernanceError::AlreadyTrusted
            } else {
                GovernanceError::CoreModuleNotRemovable
            });
        }
        let position = trust.trusted.iter().position(|a| *a == address);
        match (add, position) {
            (true, Some(_)) => return Err(GovernanceError::AlreadyTrusted),
            (true, None) => trust.trusted.push(address),
            (false, None) => return Err(GovernanceError::NotTrusted),
            (false, Some(index)) => {
                trust.trusted.swap_remove(index);
            }
        }
        info!(
            "project {} trusted address {} {}",
            project,
            address,
            if add { "added" } else { "removed" }
        );
        Ok(())
    }

    fn ensure_registry(&self, caller: Address) -> Result<()> {
        match self.registry {
            None => Err(GovernanceError::NotInitialized),
            Some(registry) if registry == caller => Ok(()),
            Some(_) => Err(GovernanceError::RestrictedFunction),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
