//! Treasury error types

use gitswarm_core::{CoreError, ErrorKind};
use governance::GovernanceError;
use thiserror::Error;

/// Funds manager and gas station errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Not enough tokens on FundsManager")]
    NotEnoughTokens,

    #[error("Not enough Ether on FundsManager")]
    NotEnoughEther,

    #[error("Amount can't be an empty list.")]
    EmptyAmounts,

    #[error("'amount', 'to' and 'depositToProjectId' arrays must have equal length")]
    LengthMismatch,

    #[error("Amount must be greater than 0.")]
    ZeroAmount,

    #[error("Value must be greater than zero")]
    ZeroValue,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TreasuryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreasuryError::NotEnoughTokens
            | TreasuryError::NotEnoughEther
            | TreasuryError::InsufficientBalance => ErrorKind::InsufficientResource,
            TreasuryError::EmptyAmounts
            | TreasuryError::LengthMismatch
            | TreasuryError::ZeroAmount
            | TreasuryError::ZeroValue => ErrorKind::Validation,
            TreasuryError::Governance(err) => err.kind(),
            TreasuryError::Core(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
