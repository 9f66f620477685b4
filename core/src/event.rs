//! Events emitted by the governance modules

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::{Amount, ProjectId, ProposalId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ProjectCreated {
        project_id: ProjectId,
        db_id: String,
        token: Address,
    },
    ProposalCreated {
        project_id: ProjectId,
        proposal_id: ProposalId,
        proposer: Address,
        proposal_type: u8,
    },
    VoteCast {
        project_id: ProjectId,
        proposal_id: ProposalId,
        voter: Address,
        support: bool,
    },
    VoteCountLocked {
        project_id: ProjectId,
        proposal_id: ProposalId,
        will_execute: bool,
    },
    ProposalContested {
        project_id: ProjectId,
        proposal_id: ProposalId,
        contester: Address,
        will_execute: bool,
    },
    ProposalExecuted {
        project_id: ProjectId,
        proposal_id: ProposalId,
    },
    Delegated {
        project_id: ProjectId,
        delegator: Address,
        delegate: Address,
    },
    Undelegated {
        project_id: ProjectId,
        delegator: Address,
        delegate: Address,
    },
    Deposited {
        project_id: ProjectId,
        token: Address,
        amount: Amount,
    },
    FundsReclaimed {
        project_id: ProjectId,
        account: Address,
        burned: Amount,
    },
    OrphansSwept {
        token: Address,
        amount: Amount,
    },
    BuyGasEvent {
        project_id: ProjectId,
        amount: Amount,
    },
    TransferredGas {
        to: Address,
        amount: Amount,
    },
    ContractsUpgraded {
        proposal_id: ProposalId,
    },
}

/// Append-only event log, rolled back together with the state it belongs to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
