//! Simulated chain state: native coin balances and deployed token contracts

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::amount::Amount;
use crate::error::{CoreError, Result};
use crate::token::{Erc20Token, TokenCapability, TokenMethod};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chain {
    native: HashMap<Address, Amount>,
    tokens: HashMap<Address, Erc20Token>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn native_balance(&self, address: &Address) -> Amount {
        self.native.get(address).copied().unwrap_or(0)
    }

    /// Credits native coin from outside the system (faucet, genesis)
    pub fn fund_native(&mut self, address: Address, amount: Amount) -> Result<()> {
        let balance = self
            .native_balance(&address)
            .checked_add(amount)
            .ok_or(CoreError::Overflow)?;
        self.native.insert(address, balance);
        Ok(())
    }

    pub fn transfer_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let from_balance = self.native_balance(&from);
        if from_balance < amount {
            return Err(CoreError::InsufficientNativeBalance);
        }
        self.native.insert(from, from_balance - amount);
        let to_balance = self
            .native_balance(&to)
            .checked_add(amount)
            .ok_or(CoreError::Overflow)?;
        self.native.insert(to, to_balance);
        debug!("native transfer {} -> {}: {}", from, to, amount);
        Ok(())
    }

    pub fn deploy_token(&mut self, address: Address, token: Erc20Token) -> Result<()> {
        if address.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        if self.tokens.contains_key(&address) {
            return Err(CoreError::AddressInUse(address));
        }
        debug!("token {} ({}) deployed at {}", token.name(), token.symbol(), address);
        self.tokens.insert(address, token);
        Ok(())
    }

    pub fn token(&self, address: &Address) -> Result<&Erc20Token> {
        self.tokens.get(address).ok_or(CoreError::NotAToken(*address))
    }

    pub fn token_mut(&mut self, address: &Address) -> Result<&mut Erc20Token> {
        self.tokens.get_mut(address).ok_or(CoreError::NotAToken(*address))
    }

    /// Balance of `owner` in `token`, zero when no token lives there
    pub fn token_balance(&self, token: &Address, owner: &Address) -> Amount {
        self.tokens
            .get(token)
            .map(|t| t.balance_of(owner))
            .unwrap_or(0)
    }

    /// True when `address` hosts a token answering the whole probed surface
    pub fn is_erc20_token(&self, address: &Address) -> bool {
        match self.tokens.get(address) {
            Some(token) => TokenMethod::ALL.iter().all(|m| token.supports(*m)),
            None => false,
        }
    }

    /// Token transfer that turns a reported failure into an error
    pub fn safe_transfer(
        &mut self,
        token: &Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if !self.token_mut(token)?.transfer(from, to, amount)? {
            return Err(CoreError::SafeTransferFailed(*token));
        }
        Ok(())
    }

    pub fn safe_transfer_from(
        &mut self,
        token: &Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if !self.token_mut(token)?.transfer_from(spender, from, to, amount)? {
            return Err(CoreError::SafeTransferFailed(*token));
        }
        Ok(())
    }
}
