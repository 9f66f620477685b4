//! RPC-style call interface
//!
//! A call is a JSON object naming a method and its parameters:
//!
//! ```json
//! {"method": "vote", "params": {"projectId": 1, "proposalId": 0, "support": true}}
//! ```
//!
//! Each method lives on one module, addressed by the call's target. Amounts
//! travel as decimal strings. Results come back as JSON values.

use gitswarm_core::amount::decimal;
use gitswarm_core::{Address, Amount, Clock, ProjectId, ProposalId};
use governance::{ModuleKind, ParameterKey};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{PlatformError, Result};
use crate::platform::Platform;
use crate::supply::TokenSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "params",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Call {
    // ContractsManager
    CreateProject {
        db_id: String,
        token: Address,
    },
    DeployProjectToken {
        db_id: String,
        token: TokenSpec,
    },
    ProposeChangeVotingToken {
        project_id: ProjectId,
        token: Address,
    },
    ProposeAddBurnAddress {
        project_id: ProjectId,
        address: Address,
    },
    ProposeUpgradeContracts {
        implementations: BTreeMap<ModuleKind, Address>,
    },
    CirculatingSupply {
        project_id: ProjectId,
    },

    // Delegates
    Delegate {
        project_id: ProjectId,
        delegate: Address,
    },
    Undelegate {
        project_id: ProjectId,
    },
    UndelegateAllFromAddress {
        project_id: ProjectId,
    },
    RemoveSpamDelegates {
        project_id: ProjectId,
        delegate: Address,
        addresses: Vec<Address>,
        indexes: Vec<usize>,
    },
    GetSpamDelegates {
        project_id: ProjectId,
        delegate: Address,
    },
    GetDelegatedVotingPower {
        project_id: ProjectId,
        delegate: Address,
    },

    // Proposal
    Vote {
        project_id: ProjectId,
        proposal_id: ProposalId,
        support: bool,
    },
    LockVoteCount {
        project_id: ProjectId,
        proposal_id: ProposalId,
    },
    ContestProposal {
        project_id: ProjectId,
        proposal_id: ProposalId,
        support: bool,
    },
    RemoveSpamVoters {
        project_id: ProjectId,
        proposal_id: ProposalId,
        indexes: Vec<usize>,
    },
    GetSpamVoters {
        project_id: ProjectId,
        proposal_id: ProposalId,
    },
    GetVoteCount {
        project_id: ProjectId,
        proposal_id: ProposalId,
    },
    GetVotes {
        project_id: ProjectId,
        proposal_id: ProposalId,
        voter: Address,
    },
    NextProposalId {
        project_id: ProjectId,
    },

    // Parameters
    ProposeParameterChange {
        project_id: ProjectId,
        parameter: ParameterKey,
        #[serde(with = "decimal")]
        value: Amount,
    },
    ProposeChangeTrustedAddress {
        project_id: ProjectId,
        address: Address,
        add: bool,
    },
    RemoveGitSwarmAddress,
    GetParameter {
        project_id: ProjectId,
        parameter: ParameterKey,
    },

    // FundsManager
    DepositToken {
        project_id: ProjectId,
        token: Address,
        #[serde(with = "decimal")]
        amount: Amount,
    },
    DepositEth {
        project_id: ProjectId,
    },
    ReclaimFunds {
        project_id: ProjectId,
        #[serde(with = "decimal")]
        amount: Amount,
        tokens: Vec<Address>,
    },
    SendOrphanTokensToGitSwarm {
        token: Address,
    },
    SendToken {
        project_id: ProjectId,
        token: Address,
        to: Address,
        #[serde(with = "decimal")]
        amount: Amount,
    },
    SendEther {
        project_id: ProjectId,
        to: Address,
        #[serde(with = "decimal")]
        amount: Amount,
    },
    UpdateBalance {
        project_id: ProjectId,
        token: Address,
        #[serde(with = "decimal")]
        amount: Amount,
    },
    ProposeTransaction {
        project_id: ProjectId,
        tokens: Vec<Address>,
        #[serde(with = "decimal::list")]
        amounts: Vec<Amount>,
        to: Vec<Address>,
        deposit_to_project_ids: Vec<ProjectId>,
    },
    Balances {
        project_id: ProjectId,
        token: Address,
    },

    // GasStation
    BuyGasForProject {
        project_id: ProjectId,
    },
    ProposeTransferToGasAddress {
        #[serde(with = "decimal")]
        amount: Amount,
        to: Address,
    },

    // TokenSupply
    ProposeCreateTokens {
        project_id: ProjectId,
        #[serde(with = "decimal")]
        amount: Amount,
    },
    ProposeDisableTokenCreation {
        project_id: ProjectId,
    },

    /// Accepted by every module that executes proposals
    ExecuteProposal {
        project_id: ProjectId,
        proposal_id: ProposalId,
    },
}

impl Call {
    /// Module hosting the method, `None` for methods every module exposes
    pub fn module(&self) -> Option<ModuleKind> {
        let module = match self {
            Call::CreateProject { .. }
            | Call::DeployProjectToken { .. }
            | Call::ProposeChangeVotingToken { .. }
            | Call::ProposeAddBurnAddress { .. }
            | Call::ProposeUpgradeContracts { .. }
            | Call::CirculatingSupply { .. } => ModuleKind::ContractsManager,
            Call::Delegate { .. }
            | Call::Undelegate { .. }
            | Call::UndelegateAllFromAddress { .. }
            | Call::RemoveSpamDelegates { .. }
            | Call::GetSpamDelegates { .. }
            | Call::GetDelegatedVotingPower { .. } => ModuleKind::Delegates,
            Call::Vote { .. }
            | Call::LockVoteCount { .. }
            | Call::ContestProposal { .. }
            | Call::RemoveSpamVoters { .. }
            | Call::GetSpamVoters { .. }
            | Call::GetVoteCount { .. }
            | Call::GetVotes { .. }
            | Call::NextProposalId { .. } => ModuleKind::Proposal,
            Call::ProposeParameterChange { .. }
            | Call::ProposeChangeTrustedAddress { .. }
            | Call::RemoveGitSwarmAddress
            | Call::GetParameter { .. } => ModuleKind::Parameters,
            Call::DepositToken { .. }
            | Call::DepositEth { .. }
            | Call::ReclaimFunds { .. }
            | Call::SendOrphanTokensToGitSwarm { .. }
            | Call::SendToken { .. }
            | Call::SendEther { .. }
            | Call::UpdateBalance { .. }
            | Call::ProposeTransaction { .. }
            | Call::Balances { .. } => ModuleKind::FundsManager,
            Call::BuyGasForProject { .. } | Call::ProposeTransferToGasAddress { .. } => {
                ModuleKind::GasStation
            }
            Call::ProposeCreateTokens { .. } | Call::ProposeDisableTokenCreation { .. } => {
                ModuleKind::TokenSupply
            }
            Call::ExecuteProposal { .. } => return None,
        };
        Some(module)
    }

    pub fn is_payable(&self) -> bool {
        matches!(self, Call::DepositEth { .. } | Call::BuyGasForProject { .. })
    }
}

fn amount(value: Amount) -> Value {
    Value::String(value.to_string())
}

/// Decodes `data` and runs it against `target` on behalf of `caller`.
///
/// Empty data is a bare value transfer and is refused as such. Data that
/// names no method of `target` is refused as a fallback call.
pub fn dispatch<C: Clock>(
    platform: &mut Platform<C>,
    caller: Address,
    target: ModuleKind,
    value: Amount,
    data: &[u8],
) -> Result<Value> {
    if data.is_empty() {
        return Err(PlatformError::Receive);
    }
    let call: Call = serde_json::from_slice(data).map_err(|_| PlatformError::Fallback)?;
    if call.module().is_some_and(|module| module != target) {
        return Err(PlatformError::Fallback);
    }
    if value > 0 && !call.is_payable() {
        return Err(PlatformError::NonPayable);
    }
    debug!("{} -> {}: {:?}", caller, target.label(), call);
    execute(platform, caller, target, value, call)
}

fn execute<C: Clock>(
    platform: &mut Platform<C>,
    caller: Address,
    target: ModuleKind,
    value: Amount,
    call: Call,
) -> Result<Value> {
    let result = match call {
        Call::CreateProject { db_id, token } => {
            json!(platform.create_project(caller, &db_id, token)?)
        }
        Call::DeployProjectToken { db_id, token } => {
            let (project, address) = platform.deploy_project_token(caller, &db_id, token)?;
            json!({ "projectId": project, "token": address })
        }
        Call::ProposeChangeVotingToken { project_id, token } => {
            json!(platform.propose_change_voting_token(caller, project_id, token)?)
        }
        Call::ProposeAddBurnAddress { project_id, address } => {
            json!(platform.propose_add_burn_address(caller, project_id, address)?)
        }
        Call::ProposeUpgradeContracts { implementations } => {
            json!(platform.propose_upgrade_contracts(caller, implementations)?)
        }
        Call::CirculatingSupply { project_id } => amount(platform.circulating_supply(project_id)?),

        Call::Delegate { project_id, delegate } => {
            platform.delegate(caller, project_id, delegate)?;
            Value::Null
        }
        Call::Undelegate { project_id } => {
            platform.undelegate(caller, project_id)?;
            Value::Null
        }
        Call::UndelegateAllFromAddress { project_id } => {
            json!(platform.undelegate_all_from_address(caller, project_id)?)
        }
        Call::RemoveSpamDelegates {
            project_id,
            delegate,
            addresses,
            indexes,
        } => {
            let removed =
                platform.remove_spam_delegates(caller, project_id, delegate, &addresses, &indexes)?;
            json!(removed)
        }
        Call::GetSpamDelegates { project_id, delegate } => {
            let (addresses, indexes) = platform.get_spam_delegates(project_id, &delegate)?;
            json!({ "addresses": addresses, "indexes": indexes })
        }
        Call::GetDelegatedVotingPower { project_id, delegate } => {
            amount(platform.get_delegated_voting_power(project_id, &delegate)?)
        }

        Call::Vote {
            project_id,
            proposal_id,
            support,
        } => {
            platform.vote(caller, project_id, proposal_id, support)?;
            Value::Null
        }
        Call::LockVoteCount {
            project_id,
            proposal_id,
        } => json!(platform.lock_vote_count(caller, project_id, proposal_id)?),
        Call::ContestProposal {
            project_id,
            proposal_id,
            support,
        } => json!(platform.contest_proposal(caller, project_id, proposal_id, support)?),
        Call::RemoveSpamVoters {
            project_id,
            proposal_id,
            indexes,
        } => json!(platform.remove_spam_voters(caller, project_id, proposal_id, &indexes)?),
        Call::GetSpamVoters {
            project_id,
            proposal_id,
        } => json!(platform.get_spam_voters(project_id, proposal_id)?),
        Call::GetVoteCount {
            project_id,
            proposal_id,
        } => {
            let tally = platform.get_vote_count(project_id, proposal_id)?;
            json!({ "yes": amount(tally.yes), "no": amount(tally.no), "passed": tally.passed })
        }
        Call::GetVotes {
            project_id,
            proposal_id,
            voter,
        } => {
            let (voted, support) = platform.get_votes(project_id, proposal_id, &voter);
            json!({ "voted": voted, "support": support })
        }
        Call::NextProposalId { project_id } => json!(platform.next_proposal_id(project_id)),

        Call::ProposeParameterChange {
            project_id,
            parameter,
            value: proposed,
        } => json!(platform.propose_parameter_change(caller, project_id, parameter, proposed)?),
        Call::ProposeChangeTrustedAddress {
            project_id,
            address,
            add,
        } => json!(platform.propose_change_trusted_address(caller, project_id, address, add)?),
        Call::RemoveGitSwarmAddress => {
            platform.remove_gitswarm_address(caller)?;
            Value::Null
        }
        Call::GetParameter {
            project_id,
            parameter,
        } => amount(platform.parameter(project_id, parameter)),

        Call::DepositToken {
            project_id,
            token,
            amount: deposited,
        } => {
            platform.deposit_token(caller, project_id, token, deposited)?;
            Value::Null
        }
        Call::DepositEth { project_id } => {
            platform.deposit_eth(caller, project_id, value)?;
            Value::Null
        }
        Call::ReclaimFunds {
            project_id,
            amount: burned,
            tokens,
        } => {
            let payouts = platform.reclaim_funds(caller, project_id, burned, &tokens)?;
            let payouts: Vec<Value> = payouts
                .into_iter()
                .map(|(token, paid)| json!({ "token": token, "amount": amount(paid) }))
                .collect();
            Value::Array(payouts)
        }
        Call::SendOrphanTokensToGitSwarm { token } => {
            amount(platform.send_orphan_tokens_to_gitswarm(caller, token)?)
        }
        Call::SendToken {
            project_id,
            token,
            to,
            amount: sent,
        } => {
            platform.send_token(caller, project_id, token, to, sent)?;
            Value::Null
        }
        Call::SendEther {
            project_id,
            to,
            amount: sent,
        } => {
            platform.send_ether(caller, project_id, to, sent)?;
            Value::Null
        }
        Call::UpdateBalance {
            project_id,
            token,
            amount: debited,
        } => {
            platform.update_balance(caller, project_id, token, debited)?;
            Value::Null
        }
        Call::ProposeTransaction {
            project_id,
            tokens,
            amounts,
            to,
            deposit_to_project_ids,
        } => json!(platform.propose_transaction(
            caller,
            project_id,
            &tokens,
            &amounts,
            &to,
            &deposit_to_project_ids
        )?),
        Call::Balances { project_id, token } => {
            amount(platform.treasury_balance(project_id, &token))
        }

        Call::BuyGasForProject { project_id } => {
            platform.buy_gas_for_project(caller, project_id, value)?;
            Value::Null
        }
        Call::ProposeTransferToGasAddress { amount: paid, to } => {
            json!(platform.propose_transfer_to_gas_address(caller, paid, to)?)
        }

        Call::ProposeCreateTokens {
            project_id,
            amount: minted,
        } => json!(platform.propose_create_tokens(caller, project_id, minted)?),
        Call::ProposeDisableTokenCreation { project_id } => {
            json!(platform.propose_disable_token_creation(caller, project_id)?)
        }

        Call::ExecuteProposal {
            project_id,
            proposal_id,
        } => {
            platform.execute_proposal(caller, target, project_id, proposal_id)?;
            Value::Null
        }
    };
    Ok(result)
}
