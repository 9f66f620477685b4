//! Governed token supply
//!
//! Tokens deployed through the platform are either fixed or expandable.
//! An expandable token grows only through executed `CreateTokens`
//! proposals, minting into the Funds Manager on behalf of the project,
//! until a `DisableCreateMoreTokens` proposal switches that off for good.

use gitswarm_core::amount::decimal;
use gitswarm_core::{
    Address, Amount, Chain, Erc20Token, EventLog, ProjectId, ProposalId, TokenCapability,
};
use governance::{
    DelegationLedger, GovernanceError, ModuleKind, ParameterKey, ParameterStore, ProposalAction,
    ProposalEngine, VotingContext,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use treasury::{FundsManager, TreasuryError};

use crate::error::{PlatformError, Result};
use crate::registry::ContractsManager;

/// Token to deploy together with a new project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub expandable: bool,
    /// Minted to the project creator
    #[serde(with = "decimal")]
    pub initial_supply: Amount,
    /// Minted to the Funds Manager and booked to the new project
    #[serde(with = "decimal")]
    pub buffer: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyPolicy {
    pub expandable: bool,
    pub creation_disabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSupply {
    policies: HashMap<Address, SupplyPolicy>,
}

impl TokenSupply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(&self) -> Address {
        ModuleKind::TokenSupply.address()
    }

    /// Policy of a platform-deployed token; `None` for external tokens
    pub fn policy(&self, token: &Address) -> Option<SupplyPolicy> {
        self.policies.get(token).copied()
    }

    /// Deploys the token at the address reserved for the next project and
    /// registers the project bound to it.
    #[allow(clippy::too_many_arguments)]
    pub fn deploy_project_token(
        &mut self,
        chain: &mut Chain,
        registry: &mut ContractsManager,
        parameters: &mut ParameterStore,
        funds: &mut FundsManager,
        events: &mut EventLog,
        creator: Address,
        db_id: &str,
        spec: &TokenSpec,
    ) -> Result<(ProjectId, Address)> {
        let address = Address::from_label(&format!(
            "gitswarm/token/{}",
            registry.next_project_id()
        ));
        let mut token = Erc20Token::new(&spec.name, &spec.symbol);
        if spec.initial_supply > 0 {
            token.mint(creator, spec.initial_supply)?;
        }
        if spec.buffer > 0 {
            token.mint(funds.address(), spec.buffer)?;
        }
        chain.deploy_token(address, token)?;

        let project = registry.create_project(chain, parameters, events, db_id, address)?;
        if spec.buffer > 0 {
            funds.record_mint(chain, project, address, spec.buffer)?;
        }
        self.policies.insert(
            address,
            SupplyPolicy {
                expandable: spec.expandable,
                creation_disabled: false,
            },
        );
        info!(
            "project {}: {} token {} deployed at {}",
            project,
            if spec.expandable { "expandable" } else { "fixed" },
            spec.symbol,
            address
        );
        Ok((project, address))
    }

    fn ensure_expandable(&self, token: &Address) -> Result<()> {
        match self.policy(token) {
            Some(policy) if !policy.expandable => Err(PlatformError::FixedSupply),
            None => Err(PlatformError::FixedSupply),
            Some(policy) if policy.creation_disabled => Err(PlatformError::TokenCreationDisabled),
            Some(_) => Ok(()),
        }
    }

    pub fn propose_create_tokens(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        token: Address,
        amount: Amount,
    ) -> Result<ProposalId> {
        self.ensure_expandable(&token)?;
        if amount == 0 {
            return Err(TreasuryError::ZeroAmount.into());
        }
        Ok(engine.create_proposal(
            self.address(),
            ctx,
            proposer,
            ProposalAction::CreateTokens { token, amount },
        )?)
    }

    pub fn propose_disable_token_creation(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        token: Address,
    ) -> Result<ProposalId> {
        self.ensure_expandable(&token)?;
        Ok(engine.create_proposal(
            self.address(),
            ctx,
            proposer,
            ProposalAction::DisableCreateMoreTokens { token },
        )?)
    }

    /// Executes a supply proposal.
    ///
    /// Token creation re-checks the live tally against
    /// `RequiredVotingPowerPercentageToCreateTokens`, since a contest may
    /// have eroded support without overturning the simple majority.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_proposal(
        &mut self,
        chain: &mut Chain,
        engine: &mut ProposalEngine,
        registry: &ContractsManager,
        delegates: &DelegationLedger,
        parameters: &ParameterStore,
        funds: &mut FundsManager,
        project: ProjectId,
        proposal_id: ProposalId,
        now: u64,
    ) -> Result<()> {
        let expiration = parameters.duration(project, ParameterKey::ExpirationPeriod);
        let action =
            engine.executable_action(ModuleKind::TokenSupply, project, proposal_id, now, expiration)?;
        match action {
            ProposalAction::CreateTokens { token, amount } => {
                self.ensure_expandable(&token)?;
                let key = ParameterKey::RequiredVotingPowerPercentageToCreateTokens;
                let percentage =
                    u64::try_from(parameters.parameter(project, key)).unwrap_or(u64::MAX);
                let tally = {
                    let voting_token = registry.voting_token(project)?;
                    let ctx = VotingContext {
                        project,
                        token: chain.token(&voting_token)?,
                        delegates,
                        parameters,
                        circulating_supply: registry.circulating_supply(chain, project)?,
                        now,
                    };
                    engine.check_vote_count(&ctx, proposal_id, percentage)?
                };
                if !tally.passed {
                    return Err(GovernanceError::CreateTokensThresholdNotMet.into());
                }
                chain.token_mut(&token)?.mint(funds.address(), amount)?;
                funds.record_mint(chain, project, token, amount)?;
                info!("project {}: minted {} of {} to the treasury", project, amount, token);
            }
            ProposalAction::DisableCreateMoreTokens { token } => {
                self.ensure_expandable(&token)?;
                if let Some(policy) = self.policies.get_mut(&token) {
                    policy.creation_disabled = true;
                }
                info!("project {}: token creation disabled for {}", project, token);
            }
            _ => return Err(GovernanceError::UnexpectedProposalType.into()),
        }
        engine.mark_executed(self.address(), project, proposal_id)?;
        Ok(())
    }
}
