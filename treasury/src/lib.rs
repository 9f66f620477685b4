//! GitSwarm Treasury Module
//!
//! Custody of project funds:
//! - the Funds Manager keeps a per-project ledger of native coin and tokens
//!   it physically holds, pays out through trusted callers and executed
//!   transaction proposals, and lets holders reclaim a share by burning
//!   governance tokens
//! - the Gas Station converts contributed native coin into per-project gas
//!
//! Both are gated by the governance proposal engine.

pub mod error;
pub mod funds;
pub mod gas;

pub use error::{Result, TreasuryError};
pub use funds::{FundsManager, NATIVE_COIN};
pub use gas::GasStation;
