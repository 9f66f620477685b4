//! Contracts Manager: project registry, burn addresses and module upgrades

use gitswarm_core::{
    Address, Amount, Chain, CoreError, Event, EventLog, ProjectId, ProposalId, TokenCapability,
};
use governance::{
    GovernanceError, ModuleKind, ParameterKey, ParameterStore, ProposalAction, ProposalEngine,
    VotingContext,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Identifier of the project in the off-chain database
    pub db_id: String,
    pub voting_token: Address,
    /// Balances held here do not count towards circulating supply
    pub burn_addresses: Vec<Address>,
}

/// Logic currently behind a module address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub address: Address,
    pub version: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractsManager {
    projects: Vec<Project>,
    implementations: BTreeMap<ModuleKind, Implementation>,
}

impl ContractsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(&self) -> Address {
        ModuleKind::ContractsManager.address()
    }

    /// Installs the first implementation of every module
    pub fn initialize(&mut self) -> Result<()> {
        if !self.implementations.is_empty() {
            return Err(PlatformError::AlreadyInitialized);
        }
        self.implementations = ModuleKind::ALL
            .iter()
            .map(|module| {
                let implementation = Implementation {
                    address: Address::from_label(&format!("gitswarm/{}/v1", module.label())),
                    version: 1,
                };
                (*module, implementation)
            })
            .collect();
        Ok(())
    }

    pub fn is_erc20_token(&self, chain: &Chain, address: &Address) -> bool {
        chain.is_erc20_token(address)
    }

    fn validate_token(chain: &Chain, token: &Address) -> Result<()> {
        if token.is_zero() {
            return Err(CoreError::ZeroAddress.into());
        }
        if !chain.is_erc20_token(token) {
            return Err(CoreError::NotAToken(*token).into());
        }
        Ok(())
    }

    /// Registers a project bound to `token` and opens its parameter namespace.
    ///
    /// The project's implicit trust set is every module address plus the
    /// voting token itself. The Funds Manager is burn address 0, so treasury
    /// holdings never count as circulating.
    pub fn create_project(
        &mut self,
        chain: &Chain,
        parameters: &mut ParameterStore,
        events: &mut EventLog,
        db_id: &str,
        token: Address,
    ) -> Result<ProjectId> {
        Self::validate_token(chain, &token)?;
        let id = self.next_project_id();
        let core = ModuleKind::ALL
            .iter()
            .map(|module| module.address())
            .chain(std::iter::once(token));
        parameters.initialize_project(self.address(), id, core)?;
        self.projects.push(Project {
            id,
            db_id: db_id.to_string(),
            voting_token: token,
            burn_addresses: vec![ModuleKind::FundsManager.address()],
        });
        events.emit(Event::ProjectCreated {
            project_id: id,
            db_id: db_id.to_string(),
            token,
        });
        info!("project {} ({}) created with voting token {}", id, db_id, token);
        Ok(id)
    }

    pub fn next_project_id(&self) -> ProjectId {
        self.projects.len() as ProjectId
    }

    pub fn project(&self, project: ProjectId) -> Option<&Project> {
        self.projects.get(usize::try_from(project).ok()?)
    }

    fn existing_mut(&mut self, project: ProjectId) -> Result<&mut Project> {
        usize::try_from(project)
            .ok()
            .and_then(|index| self.projects.get_mut(index))
            .ok_or(PlatformError::Governance(GovernanceError::UnknownProject))
    }

    fn existing(&self, project: ProjectId) -> Result<&Project> {
        self.project(project)
            .ok_or(PlatformError::Governance(GovernanceError::UnknownProject))
    }

    pub fn voting_token(&self, project: ProjectId) -> Result<Address> {
        Ok(self.existing(project)?.voting_token)
    }

    pub fn burn_addresses(&self, project: ProjectId) -> &[Address] {
        self.project(project)
            .map(|p| p.burn_addresses.as_slice())
            .unwrap_or(&[])
    }

    /// Voting-token supply minus what sits on burn addresses
    pub fn circulating_supply(&self, chain: &Chain, project: ProjectId) -> Result<Amount> {
        let project = self.existing(project)?;
        let token = chain.token(&project.voting_token)?;
        let burned: Amount = project
            .burn_addresses
            .iter()
            .map(|address| token.balance_of(address))
            .fold(0, Amount::saturating_add);
        Ok(token.total_supply().saturating_sub(burned))
    }

    pub fn has_min_balance(
        &self,
        chain: &Chain,
        parameters: &ParameterStore,
        project: ProjectId,
        address: &Address,
    ) -> Result<bool> {
        let token = self.voting_token(project)?;
        let balance = chain.token_balance(&token, address);
        Ok(parameters.has_min_balance(project, address, balance))
    }

    pub fn implementation(&self, module: ModuleKind) -> Option<Implementation> {
        self.implementations.get(&module).copied()
    }

    pub fn propose_change_voting_token(
        &self,
        chain: &Chain,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        token: Address,
    ) -> Result<ProposalId> {
        Self::validate_token(chain, &token)?;
        Ok(engine.create_proposal(
            self.address(),
            ctx,
            proposer,
            ProposalAction::ChangeVotingToken { token },
        )?)
    }

    pub fn propose_add_burn_address(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        address: Address,
    ) -> Result<ProposalId> {
        if address.is_zero() {
            return Err(CoreError::ZeroAddress.into());
        }
        Ok(engine.create_proposal(
            self.address(),
            ctx,
            proposer,
            ProposalAction::AddBurnAddress { address },
        )?)
    }

    /// Proposes new logic for any subset of modules, voted on in project 0
    pub fn propose_upgrade_contracts(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        implementations: BTreeMap<ModuleKind, Address>,
    ) -> Result<ProposalId> {
        if implementations.is_empty() || implementations.values().any(Address::is_zero) {
            return Err(CoreError::ZeroAddress.into());
        }
        Ok(engine.create_proposal(
            self.address(),
            ctx,
            proposer,
            ProposalAction::UpgradeContracts { implementations },
        )?)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn execute_proposal(
        &mut self,
        chain: &Chain,
        engine: &mut ProposalEngine,
        parameters: &mut ParameterStore,
        events: &mut EventLog,
        project: ProjectId,
        proposal_id: ProposalId,
        now: u64,
    ) -> Result<()> {
        let expiration = parameters.duration(project, ParameterKey::ExpirationPeriod);
        let action = engine.executable_action(
            ModuleKind::ContractsManager,
            project,
            proposal_id,
            now,
            expiration,
        )?;
        let address = self.address();
        match action {
            ProposalAction::AddBurnAddress { address: burn } => {
                let entry = self.existing_mut(project)?;
                if entry.burn_addresses.contains(&burn) {
                    return Err(PlatformError::DuplicateBurnAddress);
                }
                entry.burn_addresses.push(burn);
                info!("project {}: burn address {} added", project, burn);
            }
            ProposalAction::ChangeVotingToken { token } => {
                Self::validate_token(chain, &token)?;
                let entry = self.existing_mut(project)?;
                parameters.rebind_core_address(address, project, entry.voting_token, token)?;
                info!(
                    "project {}: voting token changed from {} to {}",
                    project, entry.voting_token, token
                );
                entry.voting_token = token;
            }
            ProposalAction::UpgradeContracts { implementations } => {
                for (module, target) in &implementations {
                    let current = self.implementations.entry(*module).or_insert(Implementation {
                        address: Address::ZERO,
                        version: 0,
                    });
                    current.address = *target;
                    current.version += 1;
                    info!("{} upgraded to {} (v{})", module.label(), target, current.version);
                }
                events.emit(Event::ContractsUpgraded { proposal_id });
            }
            _ => return Err(GovernanceError::UnexpectedProposalType.into()),
        }
        engine.mark_executed(address, project, proposal_id)?;
        Ok(())
    }
}
