//! Funds Manager
//!
//! Ledger of what each project owns out of the assets the manager holds.
//! Deposits only credit after the transfer in has succeeded, and every
//! payout debits the ledger before the transfer out, so the sum of the
//! ledger for a token never exceeds the real holding.

use gitswarm_core::{
    mul_div, Address, Amount, Chain, CoreError, Event, EventLog, ProjectId, ProposalId,
    TokenCapability, GITSWARM_PROJECT_ID,
};
use governance::{
    GovernanceError, ModuleKind, ParameterKey, ParameterStore, ProposalAction, ProposalEngine,
    TransferEntry, VotingContext,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, TreasuryError};
use crate::gas::GasStation;

/// Token key under which native coin is booked
pub const NATIVE_COIN: Address = Address::ZERO;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsManager {
    address: Address,
    balances: HashMap<ProjectId, HashMap<Address, Amount>>,
    /// Sum of all project balances per token
    tracked: HashMap<Address, Amount>,
}

impl FundsManager {
    pub fn new() -> Self {
        Self {
            address: ModuleKind::FundsManager.address(),
            balances: HashMap::new(),
            tracked: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn balance(&self, project: ProjectId, token: &Address) -> Amount {
        self.balances
            .get(&project)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or(0)
    }

    pub fn tracked_total(&self, token: &Address) -> Amount {
        self.tracked.get(token).copied().unwrap_or(0)
    }

    /// What the manager really holds of `token`
    pub fn held(&self, chain: &Chain, token: &Address) -> Amount {
        if *token == NATIVE_COIN {
            chain.native_balance(&self.address)
        } else {
            chain.token_balance(token, &self.address)
        }
    }

    fn credit(&mut self, project: ProjectId, token: Address, amount: Amount) -> Result<()> {
        let balance = self
            .balance(project, &token)
            .checked_add(amount)
            .ok_or(CoreError::Overflow)?;
        let tracked = self
            .tracked_total(&token)
            .checked_add(amount)
            .ok_or(CoreError::Overflow)?;
        self.balances.entry(project).or_default().insert(token, balance);
        self.tracked.insert(token, tracked);
        Ok(())
    }

    fn debit(&mut self, project: ProjectId, token: Address, amount: Amount) -> Result<()> {
        let balance = self.balance(project, &token);
        if balance < amount {
            return Err(if token == NATIVE_COIN {
                TreasuryError::NotEnoughEther
            } else {
                TreasuryError::NotEnoughTokens
            });
        }
        self.balances
            .entry(project)
            .or_default()
            .insert(token, balance - amount);
        let tracked = self.tracked_total(&token).saturating_sub(amount);
        self.tracked.insert(token, tracked);
        Ok(())
    }

    /// Moves booked funds between projects without touching the holding
    fn move_between_projects(
        &mut self,
        from: ProjectId,
        to: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.debit(from, token, amount)?;
        self.credit(to, token, amount)
    }

    fn pay_out(
        &self,
        chain: &mut Chain,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if token == NATIVE_COIN {
            chain.transfer_native(self.address, to, amount)?;
        } else {
            chain.safe_transfer(&token, self.address, to, amount)?;
        }
        Ok(())
    }

    /// Credits a project with tokens pulled from `caller` under its allowance
    pub fn deposit_token(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        caller: Address,
        project: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Err(TreasuryError::ZeroAmount);
        }
        if token == NATIVE_COIN {
            return Err(CoreError::NotAToken(token).into());
        }
        chain.safe_transfer_from(&token, self.address, caller, self.address, amount)?;
        self.credit(project, token, amount)?;
        events.emit(Event::Deposited {
            project_id: project,
            token,
            amount,
        });
        debug!("project {}: deposited {} of {}", project, amount, token);
        Ok(())
    }

    pub fn deposit_eth(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        caller: Address,
        project: ProjectId,
        value: Amount,
    ) -> Result<()> {
        if value == 0 {
            return Err(TreasuryError::ZeroAmount);
        }
        chain.transfer_native(caller, self.address, value)?;
        self.credit(project, NATIVE_COIN, value)?;
        events.emit(Event::Deposited {
            project_id: project,
            token: NATIVE_COIN,
            amount: value,
        });
        debug!("project {}: deposited {} native", project, value);
        Ok(())
    }

    /// Books tokens minted straight to the manager, e.g. a new token's buffer
    pub fn record_mint(
        &mut self,
        chain: &Chain,
        project: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        let held = self.held(chain, &token);
        if self.tracked_total(&token).saturating_add(amount) > held {
            return Err(TreasuryError::NotEnoughTokens);
        }
        self.credit(project, token, amount)
    }

    /// Burns `burn_amount` governance tokens from `caller` and pays out the
    /// same share of circulating supply from each named token and the native
    /// coin booked to `project`.
    ///
    /// Returns the payouts made. Tokens with nothing booked pay nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn reclaim_funds(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        caller: Address,
        project: ProjectId,
        governance_token: Address,
        circulating_supply: Amount,
        burn_amount: Amount,
        tokens: &[Address],
    ) -> Result<Vec<(Address, Amount)>> {
        if burn_amount == 0 {
            return Err(TreasuryError::ZeroAmount);
        }
        let token = chain.token(&governance_token)?;
        if token.allowance(&caller, &self.address) < burn_amount {
            return Err(CoreError::InsufficientTokenAllowance.into());
        }
        if token.balance_of(&caller) < burn_amount {
            return Err(CoreError::InsufficientTokenBalance.into());
        }

        let mut seen = BTreeSet::new();
        let mut payouts = Vec::new();
        for token in tokens.iter().copied().chain(std::iter::once(NATIVE_COIN)) {
            if !seen.insert(token) {
                continue;
            }
            let share = mul_div(self.balance(project, &token), burn_amount, circulating_supply)?;
            if share == 0 {
                continue;
            }
            self.debit(project, token, share)?;
            payouts.push((token, share));
        }
        for (token, share) in &payouts {
            self.pay_out(chain, *token, caller, *share)?;
        }

        chain.safe_transfer_from(&governance_token, self.address, caller, self.address, burn_amount)?;
        chain.token_mut(&governance_token)?.burn(self.address, burn_amount)?;

        events.emit(Event::FundsReclaimed {
            project_id: project,
            account: caller,
            burned: burn_amount,
        });
        info!(
            "project {}: {} burned {} and reclaimed {} assets",
            project,
            caller,
            burn_amount,
            payouts.len()
        );
        Ok(payouts)
    }

    /// Books whatever the manager holds beyond the ledger to the GitSwarm project
    pub fn send_orphan_tokens_to_gitswarm(
        &mut self,
        chain: &Chain,
        events: &mut EventLog,
        token: Address,
    ) -> Result<Amount> {
        let orphan = self
            .held(chain, &token)
            .saturating_sub(self.tracked_total(&token));
        if orphan > 0 {
            self.credit(GITSWARM_PROJECT_ID, token, orphan)?;
            events.emit(Event::OrphansSwept {
                token,
                amount: orphan,
            });
            info!("swept {} orphaned units of {} to project 0", orphan, token);
        }
        Ok(orphan)
    }

    fn ensure_trusted(
        &self,
        parameters: &ParameterStore,
        caller: &Address,
        project: ProjectId,
    ) -> Result<()> {
        if !parameters.is_trusted_address(project, caller) {
            return Err(GovernanceError::RestrictedFunction.into());
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_token(
        &mut self,
        chain: &mut Chain,
        parameters: &ParameterStore,
        caller: Address,
        project: ProjectId,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_trusted(parameters, &caller, project)?;
        if token == NATIVE_COIN {
            return Err(CoreError::NotAToken(token).into());
        }
        self.debit(project, token, amount)?;
        self.pay_out(chain, token, to, amount)?;
        debug!("project {}: {} sent {} of {} to {}", project, caller, amount, token, to);
        Ok(())
    }

    pub fn send_ether(
        &mut self,
        chain: &mut Chain,
        parameters: &ParameterStore,
        caller: Address,
        project: ProjectId,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_trusted(parameters, &caller, project)?;
        self.debit(project, NATIVE_COIN, amount)?;
        self.pay_out(chain, NATIVE_COIN, to, amount)?;
        debug!("project {}: {} sent {} native to {}", project, caller, amount, to);
        Ok(())
    }

    /// Writes off booked funds a trusted module has already moved by other means
    pub fn update_balance(
        &mut self,
        parameters: &ParameterStore,
        caller: Address,
        project: ProjectId,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_trusted(parameters, &caller, project)?;
        self.debit(project, token, amount)
    }

    /// Validates parallel lists and registers a batched transfer proposal
    pub fn propose_transaction(
        &self,
        engine: &mut ProposalEngine,
        ctx: &VotingContext,
        proposer: Address,
        tokens: &[Address],
        amounts: &[Amount],
        to: &[Address],
        deposit_to_project_ids: &[ProjectId],
    ) -> Result<ProposalId> {
        if amounts.is_empty() {
            return Err(TreasuryError::EmptyAmounts);
        }
        let len = amounts.len();
        if tokens.len() != len || to.len() != len || deposit_to_project_ids.len() != len {
            return Err(TreasuryError::LengthMismatch);
        }
        if amounts.contains(&0) {
            return Err(TreasuryError::ZeroAmount);
        }

        let entries = (0..len)
            .map(|i| TransferEntry {
                token: tokens[i],
                amount: amounts[i],
                to: to[i],
                deposit_to_project_id: deposit_to_project_ids[i],
            })
            .collect();
        Ok(engine.create_proposal(
            self.address,
            ctx,
            proposer,
            ProposalAction::Transaction { entries },
        )?)
    }

    /// Executes a transaction proposal leg by leg.
    ///
    /// A leg with a non-zero `deposit_to_project_id` moves booked funds to
    /// that project. A native leg addressed to the gas station buys gas for
    /// the paying project. Everything else is paid out.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_proposal(
        &mut self,
        chain: &mut Chain,
        events: &mut EventLog,
        engine: &mut ProposalEngine,
        parameters: &ParameterStore,
        gas_station: &mut GasStation,
        project: ProjectId,
        proposal_id: ProposalId,
        now: u64,
    ) -> Result<()> {
        let expiration = parameters.duration(project, ParameterKey::ExpirationPeriod);
        let action =
            engine.executable_action(ModuleKind::FundsManager, project, proposal_id, now, expiration)?;
        let ProposalAction::Transaction { entries } = action else {
            return Err(GovernanceError::UnexpectedProposalType.into());
        };

        for entry in &entries {
            if entry.deposit_to_project_id != 0 {
                self.move_between_projects(
                    project,
                    entry.deposit_to_project_id,
                    entry.token,
                    entry.amount,
                )?;
            } else if entry.to == gas_station.address() && entry.token == NATIVE_COIN {
                self.debit(project, NATIVE_COIN, entry.amount)?;
                gas_station.buy_gas_for_project(chain, events, self.address, project, entry.amount)?;
            } else {
                self.debit(project, entry.token, entry.amount)?;
                self.pay_out(chain, entry.token, entry.to, entry.amount)?;
            }
        }
        engine.mark_executed(self.address, project, proposal_id)?;
        info!(
            "project {}: transaction proposal {} paid {} legs",
            project,
            proposal_id,
            entries.len()
        );
        Ok(())
    }

    pub fn transaction_proposal(
        &self,
        engine: &ProposalEngine,
        project: ProjectId,
        proposal_id: ProposalId,
    ) -> Option<Vec<TransferEntry>> {
        match &engine.proposal(project, proposal_id)?.action {
            ProposalAction::Transaction { entries } => Some(entries.clone()),
            _ => None,
        }
    }
}

impl Default for FundsManager {
    fn default() -> Self {
        Self::new()
    }
}
