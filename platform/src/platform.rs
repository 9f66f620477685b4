//! GitSwarm platform
//!
//! Owns the state of every module and runs each public operation as one
//! atomic transaction: the operation works on a copy of the state, and the
//! copy replaces the live state only when the operation succeeds. A failed
//! call leaves no trace, emitted events included.

use gitswarm_core::{
    Address, Amount, Chain, Clock, Erc20Token, Event, EventLog, ProjectId, ProposalId,
    SystemClock, TokenCapability, GITSWARM_PROJECT_ID,
};
use governance::{
    DelegationLedger, GovernanceError, ModuleKind, ParameterKey, ParameterStore, Proposal,
    ProposalEngine, VoteTally, VotingContext,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use treasury::{FundsManager, GasStation};

use crate::config::{ConfigError, PlatformConfig};
use crate::error::{PlatformError, Result};
use crate::registry::ContractsManager;
use crate::supply::{TokenSpec, TokenSupply};

/// Everything a transaction may touch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformState {
    pub chain: Chain,
    pub events: EventLog,
    pub parameters: ParameterStore,
    pub delegates: DelegationLedger,
    pub engine: ProposalEngine,
    pub funds: FundsManager,
    pub gas: GasStation,
    pub registry: ContractsManager,
    pub supply: TokenSupply,
    initialized: bool,
}

impl PlatformState {
    fn new(parameters: ParameterStore) -> Self {
        Self {
            chain: Chain::new(),
            events: EventLog::new(),
            parameters,
            delegates: DelegationLedger::new(),
            engine: ProposalEngine::new(),
            funds: FundsManager::new(),
            gas: GasStation::new(),
            registry: ContractsManager::new(),
            supply: TokenSupply::new(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn record_proposal(
        &mut self,
        project: ProjectId,
        id: ProposalId,
        proposer: Address,
    ) -> ProposalId {
        let proposal_type = self
            .engine
            .proposal(project, id)
            .map(Proposal::proposal_type)
            .unwrap_or_default();
        self.events.emit(Event::ProposalCreated {
            project_id: project,
            proposal_id: id,
            proposer,
            proposal_type,
        });
        id
    }
}

/// Voting view of one project, borrowing only the fields it reads
fn voting_context<'a>(
    chain: &'a Chain,
    registry: &ContractsManager,
    delegates: &'a DelegationLedger,
    parameters: &'a ParameterStore,
    project: ProjectId,
    now: u64,
) -> Result<VotingContext<'a>> {
    let token = registry.voting_token(project)?;
    Ok(VotingContext {
        project,
        token: chain.token(&token)?,
        delegates,
        parameters,
        circulating_supply: registry.circulating_supply(chain, project)?,
        now,
    })
}

macro_rules! ctx {
    ($state:expr, $project:expr, $now:expr) => {
        voting_context(
            &$state.chain,
            &$state.registry,
            &$state.delegates,
            &$state.parameters,
            $project,
            $now,
        )
    };
}

pub struct Platform<C: Clock = SystemClock> {
    state: PlatformState,
    clock: C,
    config: PlatformConfig,
}

/// Platform shared between threads; the lock serializes transactions
pub type SharedPlatform<C = SystemClock> = Arc<Mutex<Platform<C>>>;

impl<C: Clock> Platform<C> {
    pub fn new(config: PlatformConfig, clock: C) -> std::result::Result<Self, ConfigError> {
        let bounds = config.parameter_bounds()?;
        Ok(Self {
            state: PlatformState::new(ParameterStore::with_bounds(bounds)),
            clock,
            config,
        })
    }

    pub fn with_clock(clock: C) -> Self {
        Self {
            state: PlatformState::new(ParameterStore::new()),
            clock,
            config: PlatformConfig::default(),
        }
    }

    pub fn into_shared(self) -> SharedPlatform<C> {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> &PlatformState {
        &self.state
    }

    pub fn events(&self) -> &[Event] {
        self.state.events.events()
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Runs `operation` against a copy of the state and commits it on success
    fn apply<T>(
        &mut self,
        name: &str,
        operation: impl FnOnce(&mut PlatformState, u64) -> Result<T>,
    ) -> Result<T> {
        let now = self.clock.now();
        let mut draft = self.state.clone();
        match operation(&mut draft, now) {
            Ok(value) => {
                self.state = draft;
                debug!("{} committed at {}", name, now);
                Ok(value)
            }
            Err(err) => {
                warn!("{} rejected: {}", name, err);
                Err(err)
            }
        }
    }

    fn transact<T>(
        &mut self,
        name: &str,
        operation: impl FnOnce(&mut PlatformState, u64) -> Result<T>,
    ) -> Result<T> {
        self.apply(name, |s, now| {
            if !s.initialized {
                return Err(GovernanceError::NotInitialized.into());
            }
            operation(s, now)
        })
    }

    /// Wires the modules together and creates the GitSwarm project 0
    pub fn initialize(&mut self) -> Result<()> {
        let config = self.config.clone();
        self.apply("initialize", |s, _| {
            if s.initialized {
                return Err(PlatformError::AlreadyInitialized);
            }
            let modules: Vec<Address> = ModuleKind::ALL.iter().map(|m| m.address()).collect();
            s.parameters
                .initialize(s.registry.address(), Some(config.gitswarm_address))?;
            s.engine.initialize(modules)?;
            s.registry.initialize()?;

            let spec = TokenSpec {
                name: config.gitswarm_token.name.clone(),
                symbol: config.gitswarm_token.symbol.clone(),
                expandable: true,
                initial_supply: config.gitswarm_token.initial_supply,
                buffer: config.gitswarm_token.buffer,
            };
            let (project, token) = s.supply.deploy_project_token(
                &mut s.chain,
                &mut s.registry,
                &mut s.parameters,
                &mut s.funds,
                &mut s.events,
                config.gitswarm_address,
                "gitswarm",
                &spec,
            )?;
            s.initialized = true;
            info!("GitSwarm platform initialized, project {} token {}", project, token);
            Ok(())
        })
    }

    // Simulated chain activity outside the governance modules

    pub fn fund_native(&mut self, address: Address, amount: Amount) -> Result<()> {
        self.apply("fund_native", |s, _| Ok(s.chain.fund_native(address, amount)?))
    }

    pub fn deploy_token(&mut self, address: Address, token: Erc20Token) -> Result<()> {
        self.apply("deploy_token", |s, _| Ok(s.chain.deploy_token(address, token)?))
    }

    pub fn approve(
        &mut self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        self.apply("approve", |s, _| {
            s.chain.token_mut(&token)?.approve(caller, spender, amount)?;
            Ok(())
        })
    }

    pub fn transfer(
        &mut self,
        caller: Address,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.apply("transfer", |s, _| {
            Ok(s.chain.safe_transfer(&token, caller, to, amount)?)
        })
    }

    // Project registry

    pub fn create_project(
        &mut self,
        caller: Address,
        db_id: &str,
        token: Address,
    ) -> Result<ProjectId> {
        self.transact("create_project", |s, _| {
            let project = s.registry.create_project(
                &s.chain,
                &mut s.parameters,
                &mut s.events,
                db_id,
                token,
            )?;
            debug!("project {} registered by {}", project, caller);
            Ok(project)
        })
    }

    pub fn deploy_project_token(
        &mut self,
        caller: Address,
        db_id: &str,
        spec: TokenSpec,
    ) -> Result<(ProjectId, Address)> {
        self.transact("deploy_project_token", |s, _| {
            s.supply.deploy_project_token(
                &mut s.chain,
                &mut s.registry,
                &mut s.parameters,
                &mut s.funds,
                &mut s.events,
                caller,
                db_id,
                &spec,
            )
        })
    }

    pub fn propose_change_voting_token(
        &mut self,
        caller: Address,
        project: ProjectId,
        token: Address,
    ) -> Result<ProposalId> {
        self.transact("propose_change_voting_token", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let id = s
                .registry
                .propose_change_voting_token(&s.chain, &mut s.engine, &ctx, caller, token)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    pub fn propose_add_burn_address(
        &mut self,
        caller: Address,
        project: ProjectId,
        address: Address,
    ) -> Result<ProposalId> {
        self.transact("propose_add_burn_address", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let id = s
                .registry
                .propose_add_burn_address(&mut s.engine, &ctx, caller, address)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    /// Upgrades are voted on by GitSwarm token holders
    pub fn propose_upgrade_contracts(
        &mut self,
        caller: Address,
        implementations: BTreeMap<ModuleKind, Address>,
    ) -> Result<ProposalId> {
        self.transact("propose_upgrade_contracts", |s, now| {
            let ctx = ctx!(s, GITSWARM_PROJECT_ID, now)?;
            let id = s
                .registry
                .propose_upgrade_contracts(&mut s.engine, &ctx, caller, implementations)?;
            Ok(s.record_proposal(GITSWARM_PROJECT_ID, id, caller))
        })
    }

    // Delegation

    pub fn delegate(
        &mut self,
        caller: Address,
        project: ProjectId,
        delegate: Address,
    ) -> Result<()> {
        self.transact("delegate", |s, _| {
            let token = s.registry.voting_token(project)?;
            let previous = s.delegates.delegate_of(project, &caller);
            s.delegates.delegate(
                s.chain.token(&token)?,
                &s.parameters,
                project,
                caller,
                delegate,
            )?;
            if let Some(previous) = previous.filter(|p| *p != delegate) {
                s.events.emit(Event::Undelegated {
                    project_id: project,
                    delegator: caller,
                    delegate: previous,
                });
            }
            s.events.emit(Event::Delegated {
                project_id: project,
                delegator: caller,
                delegate,
            });
            Ok(())
        })
    }

    pub fn undelegate(&mut self, caller: Address, project: ProjectId) -> Result<()> {
        self.transact("undelegate", |s, _| {
            let delegate = s.delegates.undelegate(project, caller)?;
            s.events.emit(Event::Undelegated {
                project_id: project,
                delegator: caller,
                delegate,
            });
            Ok(())
        })
    }

    /// The caller drops every delegation pointing at it
    pub fn undelegate_all_from_address(
        &mut self,
        caller: Address,
        project: ProjectId,
    ) -> Result<Vec<Address>> {
        self.transact("undelegate_all_from_address", |s, _| {
            let released = s.delegates.undelegate_all_from_address(project, caller);
            for delegator in &released {
                s.events.emit(Event::Undelegated {
                    project_id: project,
                    delegator: *delegator,
                    delegate: caller,
                });
            }
            Ok(released)
        })
    }

    /// Anyone may prune spam delegators of any delegate
    pub fn remove_spam_delegates(
        &mut self,
        caller: Address,
        project: ProjectId,
        delegate: Address,
        addresses: &[Address],
        indexes: &[usize],
    ) -> Result<Vec<Address>> {
        self.transact("remove_spam_delegates", |s, _| {
            let token = s.registry.voting_token(project)?;
            let removed = s.delegates.remove_spam_delegates(
                s.chain.token(&token)?,
                &s.parameters,
                project,
                delegate,
                addresses,
                indexes,
            )?;
            for delegator in &removed {
                s.events.emit(Event::Undelegated {
                    project_id: project,
                    delegator: *delegator,
                    delegate,
                });
            }
            debug!("{} pruned {} spam delegators of {}", caller, removed.len(), delegate);
            Ok(removed)
        })
    }

    // Voting

    pub fn vote(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
        support: bool,
    ) -> Result<()> {
        self.transact("vote", |s, now| {
            let ctx = ctx!(s, project, now)?;
            s.engine.vote(&ctx, id, caller, support)?;
            s.events.emit(Event::VoteCast {
                project_id: project,
                proposal_id: id,
                voter: caller,
                support,
            });
            Ok(())
        })
    }

    pub fn lock_vote_count(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
    ) -> Result<bool> {
        self.transact("lock_vote_count", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let will_execute = s.engine.lock_vote_count(&ctx, id)?;
            s.events.emit(Event::VoteCountLocked {
                project_id: project,
                proposal_id: id,
                will_execute,
            });
            debug!("proposal {} of project {} locked by {}", id, project, caller);
            Ok(will_execute)
        })
    }

    pub fn contest_proposal(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
        support: bool,
    ) -> Result<bool> {
        self.transact("contest_proposal", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let will_execute = s.engine.contest_proposal(&ctx, id, caller, support)?;
            s.events.emit(Event::ProposalContested {
                project_id: project,
                proposal_id: id,
                contester: caller,
                will_execute,
            });
            Ok(will_execute)
        })
    }

    pub fn remove_spam_voters(
        &mut self,
        caller: Address,
        project: ProjectId,
        id: ProposalId,
        indexes: &[usize],
    ) -> Result<Vec<Address>> {
        self.transact("remove_spam_voters", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let removed = s.engine.remove_spam_voters(&ctx, id, indexes)?;
            debug!("{} pruned {} spam voters from proposal {}", caller, removed.len(), id);
            Ok(removed)
        })
    }

    // Parameters

    pub fn propose_parameter_change(
        &mut self,
        caller: Address,
        project: ProjectId,
        key: ParameterKey,
        value: u128,
    ) -> Result<ProposalId> {
        self.transact("propose_parameter_change", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let id = s
                .parameters
                .propose_parameter_change(&mut s.engine, &ctx, caller, key, value)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    pub fn propose_change_trusted_address(
        &mut self,
        caller: Address,
        project: ProjectId,
        address: Address,
        add: bool,
    ) -> Result<ProposalId> {
        self.transact("propose_change_trusted_address", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let id = s
                .parameters
                .propose_change_trusted_address(&mut s.engine, &ctx, caller, address, add)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    pub fn remove_gitswarm_address(&mut self, caller: Address) -> Result<()> {
        self.transact("remove_gitswarm_address", |s, _| {
            Ok(s.parameters.remove_gitswarm_address(caller)?)
        })
    }

    // Treasury

    pub fn deposit_token(
        &mut self,
        caller: Address,
        project: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact("deposit_token", |s, _| {
            s.registry.voting_token(project)?;
            Ok(s.funds
                .deposit_token(&mut s.chain, &mut s.events, caller, project, token, amount)?)
        })
    }

    pub fn deposit_eth(
        &mut self,
        caller: Address,
        project: ProjectId,
        value: Amount,
    ) -> Result<()> {
        self.transact("deposit_eth", |s, _| {
            s.registry.voting_token(project)?;
            Ok(s.funds
                .deposit_eth(&mut s.chain, &mut s.events, caller, project, value)?)
        })
    }

    /// Burns `burn_amount` of the project's voting token for a share of its treasury
    pub fn reclaim_funds(
        &mut self,
        caller: Address,
        project: ProjectId,
        burn_amount: Amount,
        tokens: &[Address],
    ) -> Result<Vec<(Address, Amount)>> {
        self.transact("reclaim_funds", |s, _| {
            let token = s.registry.voting_token(project)?;
            let circulating = s.registry.circulating_supply(&s.chain, project)?;
            Ok(s.funds.reclaim_funds(
                &mut s.chain,
                &mut s.events,
                caller,
                project,
                token,
                circulating,
                burn_amount,
                tokens,
            )?)
        })
    }

    pub fn send_orphan_tokens_to_gitswarm(
        &mut self,
        caller: Address,
        token: Address,
    ) -> Result<Amount> {
        self.transact("send_orphan_tokens_to_gitswarm", |s, _| {
            let swept = s
                .funds
                .send_orphan_tokens_to_gitswarm(&s.chain, &mut s.events, token)?;
            debug!("orphan sweep of {} requested by {}", token, caller);
            Ok(swept)
        })
    }

    pub fn send_token(
        &mut self,
        caller: Address,
        project: ProjectId,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact("send_token", |s, _| {
            Ok(s.funds
                .send_token(&mut s.chain, &s.parameters, caller, project, token, to, amount)?)
        })
    }

    pub fn send_ether(
        &mut self,
        caller: Address,
        project: ProjectId,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact("send_ether", |s, _| {
            Ok(s.funds
                .send_ether(&mut s.chain, &s.parameters, caller, project, to, amount)?)
        })
    }

    pub fn update_balance(
        &mut self,
        caller: Address,
        project: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact("update_balance", |s, _| {
            Ok(s.funds
                .update_balance(&s.parameters, caller, project, token, amount)?)
        })
    }

    pub fn propose_transaction(
        &mut self,
        caller: Address,
        project: ProjectId,
        tokens: &[Address],
        amounts: &[Amount],
        to: &[Address],
        deposit_to_project_ids: &[ProjectId],
    ) -> Result<ProposalId> {
        self.transact("propose_transaction", |s, now| {
            let ctx = ctx!(s, project, now)?;
            let id = s.funds.propose_transaction(
                &mut s.engine,
                &ctx,
                caller,
                tokens,
                amounts,
                to,
                deposit_to_project_ids,
            )?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    // Gas station

    pub fn buy_gas_for_project(
        &mut self,
        caller: Address,
        project: ProjectId,
        value: Amount,
    ) -> Result<()> {
        self.transact("buy_gas_for_project", |s, _| {
            Ok(s.gas
                .buy_gas_for_project(&mut s.chain, &mut s.events, caller, project, value)?)
        })
    }

    pub fn propose_transfer_to_gas_address(
        &mut self,
        caller: Address,
        amount: Amount,
        to: Address,
    ) -> Result<ProposalId> {
        self.transact("propose_transfer_to_gas_address", |s, now| {
            let ctx = ctx!(s, GITSWARM_PROJECT_ID, now)?;
            let id = s
                .gas
                .propose_transfer_to_gas_address(&mut s.engine, &ctx, caller, amount, to)?;
            Ok(s.record_proposal(GITSWARM_PROJECT_ID, id, caller))
        })
    }

    // Token supply

    pub fn propose_create_tokens(
        &mut self,
        caller: Address,
        project: ProjectId,
        amount: Amount,
    ) -> Result<ProposalId> {
        self.transact("propose_create_tokens", |s, now| {
            let token = s.registry.voting_token(project)?;
            let ctx = ctx!(s, project, now)?;
            let id = s
                .supply
                .propose_create_tokens(&mut s.engine, &ctx, caller, token, amount)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    pub fn propose_disable_token_creation(
        &mut self,
        caller: Address,
        project: ProjectId,
    ) -> Result<ProposalId> {
        self.transact("propose_disable_token_creation", |s, now| {
            let token = s.registry.voting_token(project)?;
            let ctx = ctx!(s, project, now)?;
            let id = s
                .supply
                .propose_disable_token_creation(&mut s.engine, &ctx, caller, token)?;
            Ok(s.record_proposal(project, id, caller))
        })
    }

    /// Executes proposal `id` through `module`, the way a caller invokes a
    /// module's own `executeProposal`.
    pub fn execute_proposal(
        &mut self,
        caller: Address,
        module: ModuleKind,
        project: ProjectId,
        id: ProposalId,
    ) -> Result<()> {
        self.transact("execute_proposal", |s, now| {
            match module {
                ModuleKind::Parameters => {
                    s.parameters.execute_proposal(&mut s.engine, project, id, now)?;
                }
                ModuleKind::FundsManager => {
                    s.funds.execute_proposal(
                        &mut s.chain,
                        &mut s.events,
                        &mut s.engine,
                        &s.parameters,
                        &mut s.gas,
                        project,
                        id,
                        now,
                    )?;
                }
                ModuleKind::GasStation => {
                    if project != GITSWARM_PROJECT_ID {
                        return Err(GovernanceError::ProposalDoesNotExist.into());
                    }
                    s.gas.execute_proposal(
                        &mut s.chain,
                        &mut s.events,
                        &mut s.engine,
                        &s.parameters,
                        id,
                        now,
                    )?;
                }
                ModuleKind::ContractsManager => {
                    s.registry.execute_proposal(
                        &s.chain,
                        &mut s.engine,
                        &mut s.parameters,
                        &mut s.events,
                        project,
                        id,
                        now,
                    )?;
                }
                ModuleKind::TokenSupply => {
                    s.supply.execute_proposal(
                        &mut s.chain,
                        &mut s.engine,
                        &s.registry,
                        &s.delegates,
                        &s.parameters,
                        &mut s.funds,
                        project,
                        id,
                        now,
                    )?;
                }
                ModuleKind::Delegates | ModuleKind::Proposal => {
                    let expiration = s.parameters.duration(project, ParameterKey::ExpirationPeriod);
                    s.engine.executable_action(module, project, id, now, expiration)?;
                    return Err(GovernanceError::UnexpectedProposalType.into());
                }
            }
            s.events.emit(Event::ProposalExecuted {
                project_id: project,
                proposal_id: id,
            });
            debug!("proposal {} of project {} executed by {}", id, project, caller);
            Ok(())
        })
    }

    // Queries

    pub fn proposal(&self, project: ProjectId, id: ProposalId) -> Option<&Proposal> {
        self.state.engine.proposal(project, id)
    }

    pub fn next_proposal_id(&self, project: ProjectId) -> ProposalId {
        self.state.engine.next_proposal_id(project)
    }

    pub fn get_vote_count(&self, project: ProjectId, id: ProposalId) -> Result<VoteTally> {
        let ctx = ctx!(self.state, project, self.now())?;
        Ok(self.state.engine.get_vote_count(&ctx, id)?)
    }

    pub fn check_vote_count(
        &self,
        project: ProjectId,
        id: ProposalId,
        percentage: u64,
    ) -> Result<VoteTally> {
        let ctx = ctx!(self.state, project, self.now())?;
        Ok(self.state.engine.check_vote_count(&ctx, id, percentage)?)
    }

    pub fn get_spam_voters(&self, project: ProjectId, id: ProposalId) -> Result<Vec<usize>> {
        let ctx = ctx!(self.state, project, self.now())?;
        Ok(self.state.engine.get_spam_voters(&ctx, id)?)
    }

    pub fn get_votes(&self, project: ProjectId, id: ProposalId, voter: &Address) -> (bool, bool) {
        self.state.engine.get_votes(project, id, voter)
    }

    pub fn get_spam_delegates(
        &self,
        project: ProjectId,
        delegate: &Address,
    ) -> Result<(Vec<Address>, Vec<usize>)> {
        let token = self.voting_token_contract(project)?;
        Ok(self
            .state
            .delegates
            .get_spam_delegates(token, &self.state.parameters, project, delegate))
    }

    pub fn get_delegated_voting_power(
        &self,
        project: ProjectId,
        delegate: &Address,
    ) -> Result<Amount> {
        let token = self.voting_token_contract(project)?;
        Ok(self.state.delegates.get_delegated_voting_power(token, project, delegate))
    }

    pub fn check_voting_power(
        &self,
        project: ProjectId,
        address: &Address,
        required: Amount,
    ) -> Result<bool> {
        let token = self.voting_token_contract(project)?;
        Ok(self
            .state
            .delegates
            .check_voting_power(token, project, address, required))
    }

    pub fn delegate_of(&self, project: ProjectId, delegator: &Address) -> Option<Address> {
        self.state.delegates.delegate_of(project, delegator)
    }

    pub fn delegators_of(&self, project: ProjectId, delegate: &Address) -> &[Address] {
        self.state.delegates.delegators_of(project, delegate)
    }

    pub fn voting_token(&self, project: ProjectId) -> Result<Address> {
        self.state.registry.voting_token(project)
    }

    fn voting_token_contract(&self, project: ProjectId) -> Result<&Erc20Token> {
        let token = self.state.registry.voting_token(project)?;
        Ok(self.state.chain.token(&token)?)
    }

    pub fn circulating_supply(&self, project: ProjectId) -> Result<Amount> {
        self.state.registry.circulating_supply(&self.state.chain, project)
    }

    pub fn burn_addresses(&self, project: ProjectId) -> &[Address] {
        self.state.registry.burn_addresses(project)
    }

    pub fn needed_to_contest(&self, project: ProjectId) -> Result<Amount> {
        let circulating = self.circulating_supply(project)?;
        Ok(self.state.parameters.needed_to_contest(project, circulating)?)
    }

    pub fn has_min_balance(&self, project: ProjectId, address: &Address) -> Result<bool> {
        self.state
            .registry
            .has_min_balance(&self.state.chain, &self.state.parameters, project, address)
    }

    pub fn parameter(&self, project: ProjectId, key: ParameterKey) -> u128 {
        self.state.parameters.parameter(project, key)
    }

    pub fn is_trusted_address(&self, project: ProjectId, address: &Address) -> bool {
        self.state.parameters.is_trusted_address(project, address)
    }

    pub fn treasury_balance(&self, project: ProjectId, token: &Address) -> Amount {
        self.state.funds.balance(project, token)
    }

    pub fn gas_balance(&self, project: ProjectId) -> Amount {
        self.state.gas.gas_balance(project)
    }

    pub fn native_balance(&self, address: &Address) -> Amount {
        self.state.chain.native_balance(address)
    }

    pub fn token_balance(&self, token: &Address, owner: &Address) -> Amount {
        self.state.chain.token_balance(token, owner)
    }

    pub fn token_supply(&self, token: &Address) -> Result<Amount> {
        Ok(self.state.chain.token(token)?.total_supply())
    }
}

impl<C: Clock + Default> Default for Platform<C> {
    fn default() -> Self {
        Self::with_clock(C::default())
    }
}
