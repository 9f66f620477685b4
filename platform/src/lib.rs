//! GitSwarm Platform
//!
//! Ties the governance and treasury modules into one deployable unit:
//! - the Contracts Manager registers projects, their voting tokens and
//!   burn addresses, and tracks module implementations
//! - Token Supply deploys project tokens and mints or freezes supply
//!   through proposals
//! - [`Platform`] runs every public operation as an atomic transaction
//! - [`rpc::dispatch`] decodes JSON calls addressed to a module

pub mod config;
pub mod error;
pub mod platform;
pub mod registry;
pub mod rpc;
pub mod supply;

pub use config::{ConfigError, ParameterOverride, PlatformConfig, TokenConfig};
pub use error::{PlatformError, Result};
pub use platform::{Platform, PlatformState, SharedPlatform};
pub use registry::{ContractsManager, Implementation, Project};
pub use rpc::{dispatch, Call};
pub use supply::{SupplyPolicy, TokenSpec, TokenSupply};
