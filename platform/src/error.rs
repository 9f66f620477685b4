//! Platform error types

use gitswarm_core::{CoreError, ErrorKind};
use governance::GovernanceError;
use thiserror::Error;
use treasury::TreasuryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Fallback function is not supported")]
    Fallback,

    #[error("Receive function is not supported")]
    Receive,

    #[error("Function is not payable")]
    NonPayable,

    #[error("Duplicate burn address not allowed")]
    DuplicateBurnAddress,

    #[error("Increasing token supply is permanently disabled")]
    TokenCreationDisabled,

    #[error("Token supply is fixed")]
    FixedSupply,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PlatformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::AlreadyInitialized => ErrorKind::Lifecycle,
            PlatformError::Fallback
            | PlatformError::Receive
            | PlatformError::NonPayable
            | PlatformError::Encoding(_) => ErrorKind::Validation,
            PlatformError::DuplicateBurnAddress
            | PlatformError::TokenCreationDisabled
            | PlatformError::FixedSupply => ErrorKind::EconomicInvariant,
            PlatformError::Treasury(err) => err.kind(),
            PlatformError::Governance(err) => err.kind(),
            PlatformError::Core(err) => err.kind(),
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Encoding(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_guards_are_distinct() {
        assert_ne!(PlatformError::Fallback.to_string(), PlatformError::Receive.to_string());
        assert_eq!(PlatformError::Fallback.kind(), ErrorKind::Validation);
        assert_eq!(PlatformError::Receive.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_wrapped_errors_keep_reason() {
        let err: PlatformError = TreasuryError::from(GovernanceError::RestrictedFunction).into();
        assert_eq!(err.to_string(), "Restricted function");
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err: PlatformError = CoreError::InsufficientTokenAllowance.into();
        assert_eq!(err.kind(), ErrorKind::InsufficientResource);
        assert_eq!(PlatformError::DuplicateBurnAddress.kind(), ErrorKind::EconomicInvariant);
    }
}
