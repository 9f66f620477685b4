//! Proposal actions
//!
//! Every proposal carries exactly one action. The action decides which
//! module is allowed to execute it.

use gitswarm_core::{Address, Amount, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parameters::ParameterKey;

/// Platform modules. Each has a fixed address and a swappable implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleKind {
    ContractsManager,
    Delegates,
    FundsManager,
    GasStation,
    Parameters,
    Proposal,
    TokenSupply,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 7] = [
        ModuleKind::ContractsManager,
        ModuleKind::Delegates,
        ModuleKind::FundsManager,
        ModuleKind::GasStation,
        ModuleKind::Parameters,
        ModuleKind::Proposal,
        ModuleKind::TokenSupply,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModuleKind::ContractsManager => "ContractsManager",
            ModuleKind::Delegates => "Delegates",
            ModuleKind::FundsManager => "FundsManager",
            ModuleKind::GasStation => "GasStation",
            ModuleKind::Parameters => "Parameters",
            ModuleKind::Proposal => "Proposal",
            ModuleKind::TokenSupply => "TokenSupply",
        }
    }

    /// Stable address the module acts under
    pub fn address(&self) -> Address {
        Address::from_label(&format!("gitswarm/{}", self.label()))
    }
}

/// One leg of a batched treasury transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    /// Token to move, zero for the native coin
    pub token: Address,
    pub amount: Amount,
    pub to: Address,
    /// Non-zero to credit another project's ledger instead of paying out
    pub deposit_to_project_id: ProjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalAction {
    Transaction { entries: Vec<TransferEntry> },
    CreateTokens { token: Address, amount: Amount },
    ChangeParameter { key: ParameterKey, value: Amount },
    ChangeTrustedAddress { address: Address, add: bool },
    TransferToGasAddress { to: Address, amount: Amount },
    AddBurnAddress { address: Address },
    UpgradeContracts { implementations: BTreeMap<ModuleKind, Address> },
    ChangeVotingToken { token: Address },
    DisableCreateMoreTokens { token: Address },
}

impl ProposalAction {
    /// Numeric proposal type, stable across versions
    pub fn proposal_type(&self) -> u8 {
        match self {
            ProposalAction::Transaction { .. } => 1,
            ProposalAction::CreateTokens { .. } => 3,
            ProposalAction::ChangeParameter { .. } => 5,
            ProposalAction::ChangeTrustedAddress { .. } => 9,
            ProposalAction::TransferToGasAddress { .. } => 10,
            ProposalAction::AddBurnAddress { .. } => 11,
            ProposalAction::UpgradeContracts { .. } => 12,
            ProposalAction::ChangeVotingToken { .. } => 13,
            ProposalAction::DisableCreateMoreTokens { .. } => 14,
        }
    }

    pub fn executed_by(&self) -> ModuleKind {
        match self {
            ProposalAction::Transaction { .. } => ModuleKind::FundsManager,
            ProposalAction::CreateTokens { .. } | ProposalAction::DisableCreateMoreTokens { .. } => {
                ModuleKind::TokenSupply
            }
            ProposalAction::ChangeParameter { .. } | ProposalAction::ChangeTrustedAddress { .. } => {
                ModuleKind::Parameters
            }
            ProposalAction::TransferToGasAddress { .. } => ModuleKind::GasStation,
            ProposalAction::AddBurnAddress { .. }
            | ProposalAction::UpgradeContracts { .. }
            | ProposalAction::ChangeVotingToken { .. } => ModuleKind::ContractsManager,
        }
    }
}
