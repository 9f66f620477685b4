//! Core error types and the error taxonomy shared by every crate

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

/// Classification of every failure an external caller can observe.
///
/// Callers match on the kind to decide remediation: wait for a window,
/// approve more tokens, or fix the arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Authorization,
    Lifecycle,
    Validation,
    InsufficientResource,
    ExternalCallFailure,
    EconomicInvariant,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Token: sending to null is forbidden")]
    TransferToZeroAddress,

    #[error("Token: insufficient balance")]
    InsufficientTokenBalance,

    #[error("Token: insufficient allowance")]
    InsufficientTokenAllowance,

    #[error("SafeERC20FailedOperation: {0}")]
    SafeTransferFailed(Address),

    #[error("Insufficient balance")]
    InsufficientNativeBalance,

    #[error("Address is not an ERC20 token contract")]
    NotAToken(Address),

    #[error("Contract address can't be 0x0")]
    ZeroAddress,

    #[error("Address already in use: {0}")]
    AddressInUse(Address),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InsufficientTokenBalance
            | CoreError::InsufficientTokenAllowance
            | CoreError::InsufficientNativeBalance => ErrorKind::InsufficientResource,
            CoreError::SafeTransferFailed(_) => ErrorKind::ExternalCallFailure,
            CoreError::TransferToZeroAddress
            | CoreError::NotAToken(_)
            | CoreError::ZeroAddress
            | CoreError::AddressInUse(_)
            | CoreError::Overflow
            | CoreError::InvalidAddress(_) => ErrorKind::Validation,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
