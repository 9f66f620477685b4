//! Fungible token capability
//!
//! Governance modules only ever see a token through [`TokenCapability`].
//! [`Erc20Token`] is the in-process ledger behind it; its [`TokenBehavior`]
//! switch lets a deployment model tokens that report transfer failure or
//! lack part of the standard surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::amount::Amount;
use crate::error::{CoreError, Result};

/// Methods probed when deciding whether an address is a usable token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenMethod {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf,
    Allowance,
}

impl TokenMethod {
    pub const ALL: [TokenMethod; 6] = [
        TokenMethod::Name,
        TokenMethod::Symbol,
        TokenMethod::Decimals,
        TokenMethod::TotalSupply,
        TokenMethod::BalanceOf,
        TokenMethod::Allowance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenBehavior {
    #[default]
    Standard,
    /// `transfer` and `transfer_from` return `false` without moving funds
    RejectTransfers,
    /// The token does not answer the given method
    Missing(TokenMethod),
}

/// Minimal ERC20-like surface consumed by the governance modules.
///
/// `transfer`, `transfer_from` and `approve` return `Ok(false)` when the
/// token reports failure instead of reverting; callers that need a hard
/// guarantee go through [`crate::Chain::safe_transfer`].
pub trait TokenCapability {
    fn supports(&self, method: TokenMethod) -> bool;

    fn name(&self) -> &str;

    fn symbol(&self) -> &str;

    fn decimals(&self) -> u8;

    fn total_supply(&self) -> Amount;

    fn balance_of(&self, owner: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<bool>;

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<bool>;

    fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<bool>;

    fn mint(&mut self, to: Address, amount: Amount) -> Result<()>;

    fn burn(&mut self, from: Address, amount: Amount) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20Token {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    behavior: TokenBehavior,
}

impl Erc20Token {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            behavior: TokenBehavior::Standard,
        }
    }

    pub fn with_behavior(mut self, behavior: TokenBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn set_behavior(&mut self, behavior: TokenBehavior) {
        self.behavior = behavior;
    }

    pub fn behavior(&self) -> TokenBehavior {
        self.behavior
    }

    /// Moves `amount` between holders after the caller has checked the recipient.
    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(CoreError::InsufficientTokenBalance);
        }
        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance_of(&to);
        let credited = to_balance.checked_add(amount).ok_or(CoreError::Overflow)?;
        self.balances.insert(to, credited);
        Ok(())
    }

    fn rejects_transfers(&self) -> bool {
        self.behavior == TokenBehavior::RejectTransfers
    }
}

impl TokenCapability for Erc20Token {
    fn supports(&self, method: TokenMethod) -> bool {
        self.behavior != TokenBehavior::Missing(method)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<bool> {
        if to.is_zero() {
            return Err(CoreError::TransferToZeroAddress);
        }
        if self.rejects_transfers() {
            return Ok(false);
        }
        self.move_balance(from, to, amount)?;
        Ok(true)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<bool> {
        if to.is_zero() {
            return Err(CoreError::TransferToZeroAddress);
        }
        let allowed = self.allowance(&from, &spender);
        if allowed < amount {
            return Err(CoreError::InsufficientTokenAllowance);
        }
        if self.rejects_transfers() {
            return Ok(false);
        }
        self.move_balance(from, to, amount)?;
        // Unlimited approvals are never consumed
        if allowed != Amount::MAX {
            self.allowances
                .entry(from)
                .or_default()
                .insert(spender, allowed - amount);
        }
        Ok(true)
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<bool> {
        if spender.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        self.allowances.entry(owner).or_default().insert(spender, amount);
        Ok(true)
    }

    fn mint(&mut self, to: Address, amount: Amount) -> Result<()> {
        if to.is_zero() {
            return Err(CoreError::TransferToZeroAddress);
        }
        let supply = self.total_supply.checked_add(amount).ok_or(CoreError::Overflow)?;
        let balance = self.balance_of(&to).checked_add(amount).ok_or(CoreError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(CoreError::InsufficientTokenBalance);
        }
        self.balances.insert(from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }
}
