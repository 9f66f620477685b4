//! Gas Station: native coin contributed for a project's transaction fees

use gitswarm_core::{
    Address, Amount, Chain, CoreError, Event, EventLog, ProjectId, ProposalId,
    GITSWARM_PROJECT_ID,
};
use governance::{
    GovernanceError, ModuleKind, ParameterKey, ParameterStore, ProposalAction, ProposalEngine,
    VotingContext,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, TreasuryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasStation {
    address: Address,
    gas: HashMap<ProjectId, Amount>,
}

impl GasStation {
    pub fn new() -> Self {
        Self {
            address: ModuleKind::GasStation.address(),
            gas: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Total native coin ever contributed for `project`
    pub fn gas_balance(&self, project: ProjectId) -> Amount {
        self.gas.get(&project).copied().unwrap_or(0)
    }

    pub fn buy_gas_for_project(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        payer: Address,
        project: ProjectId,
        value: Amount,
    ) -> Result<()> {
        if value == 0 {
            return Err(TreasuryError::ZeroValue);
        }
        chain.transfer_native(payer, self.address, value)?;
        let balance = self
            .gas_balance(project)
            .checked_add(value)
            .ok_or(CoreError::Overflow)?;
        self.gas.insert(project, balance);
        events.emit(Event::BuyGasEvent {
            project_id: project,
            amount: value,
        });
        info!("project {}: bought {} gas", project, value);
        Ok(())
    }

    /// Registers a proposal paying `amount` to a gas address.
    ///
    /// Gas transfers are voted on by GitSwarm token holders, so `ctx` is
    /// the voting context of project 0.
    pub fn propose_transfer_to_gas_address(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        amount: Amount,
        to: Address,
    ) -> Result<ProposalId> {
        Ok(engine.create_proposal(
            self.address,
            ctx,
            proposer,
            ProposalAction::TransferToGasAddress { to, amount },
        )?)
    }

    pub fn execute_proposal(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        engine: &mut ProposalEngine,
        parameters: &ParameterStore,
        proposal_id: ProposalId,
        now: u64,
    ) -> Result<()> {
        let project = GITSWARM_PROJECT_ID;
        let expiration = parameters.duration(project, ParameterKey::ExpirationPeriod);
        let action =
            engine.executable_action(ModuleKind::GasStation, project, proposal_id, now, expiration)?;
        let ProposalAction::TransferToGasAddress { to, amount } = action else {
            return Err(GovernanceError::UnexpectedProposalType.into());
        };
        if chain.native_balance(&self.address) < amount {
            return Err(TreasuryError::InsufficientBalance);
        }
        chain.transfer_native(self.address, to, amount)?;
        engine.mark_executed(self.address, project, proposal_id)?;
        events.emit(Event::TransferredGas { to, amount });
        info!("gas proposal {}: transferred {} to {}", proposal_id, amount, to);
        Ok(())
    }

    pub fn transfer_to_gas_address_proposal(
        &self,
        engine: &ProposalEngine,
        proposal_id: ProposalId,
    ) -> Option<(Amount, Address)> {
        match engine.proposal(GITSWARM_PROJECT_ID, proposal_id)?.action {
            ProposalAction::TransferToGasAddress { to, amount } => Some((amount, to)),
            _ => None,
        }
    }
}

impl Default for GasStation {
    fn default() -> Self {
        Self::new()
    }
}
