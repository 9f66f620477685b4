//! Governance error types

use gitswarm_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Restricted function")]
    RestrictedFunction,

    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Project does not exist")]
    UnknownProject,

    #[error("Proposal does not exist or is inactive")]
    ProposalInactive,

    #[error("Proposal voting period has ended")]
    VotingPeriodEnded,

    #[error("Voting is ongoing")]
    VotingOngoing,

    #[error("Proposal expired")]
    ProposalExpired,

    #[error("Proposal does not exist")]
    ProposalDoesNotExist,

    #[error("Can't execute proposal, buffer time did not end yet")]
    BufferNotEnded,

    #[error("Can't execute proposal, execute period has expired")]
    ExecutePeriodExpired,

    #[error("Can't execute, proposal was rejected or vote count was not locked")]
    NotApproved,

    #[error("Can not contest this proposal, it is not in the phase of contesting")]
    NotContestable,

    #[error("Not delegated")]
    NotDelegated,

    #[error("Can't delegate to yourself")]
    SelfDelegation,

    #[error("Value out of range")]
    ValueOutOfRange,

    #[error("Unknown parameter")]
    UnknownParameter(String),

    #[error("Index out of bounds")]
    IndexOutOfBounds,

    #[error("Unsorted indexes")]
    UnsortedIndexes,

    #[error("Wrong index for address.")]
    WrongIndexForAddress,

    #[error("addresses and indexes must have same length")]
    LengthMismatch,

    #[error("Unexpected proposal type")]
    UnexpectedProposalType,

    #[error("Not enough voting power.")]
    NotEnoughVotingPower,

    #[error("Not enough direct voting power")]
    NotEnoughDirectVotingPower,

    #[error("Max number of delegators reached")]
    TooManyDelegators,

    #[error("Core module address can't be removed")]
    CoreModuleNotRemovable,

    #[error("Address is already trusted")]
    AlreadyTrusted,

    #[error("Address is not trusted")]
    NotTrusted,

    #[error("RequiredVotingPowerPercentageToCreateTokens not met")]
    CreateTokensThresholdNotMet,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            RestrictedFunction => ErrorKind::Authorization,
            AlreadyInitialized | NotInitialized | UnknownProject | ProposalInactive
            | VotingPeriodEnded | VotingOngoing | ProposalExpired | ProposalDoesNotExist
            | BufferNotEnded | ExecutePeriodExpired | NotApproved | NotContestable
            | NotDelegated => ErrorKind::Lifecycle,
            SelfDelegation | ValueOutOfRange | UnknownParameter(_) | IndexOutOfBounds
            | UnsortedIndexes | WrongIndexForAddress | LengthMismatch
            | UnexpectedProposalType => ErrorKind::Validation,
            NotEnoughVotingPower | NotEnoughDirectVotingPower | TooManyDelegators => {
                ErrorKind::InsufficientResource
            }
            CoreModuleNotRemovable | AlreadyTrusted | NotTrusted
            | CreateTokensThresholdNotMet => ErrorKind::EconomicInvariant,
            Core(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
