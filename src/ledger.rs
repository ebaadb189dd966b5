//! Single-asset token ledger backing every simulated account.

use crate::error::{LedgerError, Result};
use alloy::primitives::{Address, U256};
use std::collections::BTreeMap;

pub trait TokenLedger {
    fn balance_of(&self, holder: Address) -> U256;

    /// Moves `amount` from `from` to `to`. Fails without side effects when `from` is short.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()>;

    fn mint(&mut self, to: Address, amount: U256) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or(U256::ZERO)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                balance,
                amount,
            }
            .into());
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        self.balances.insert(from, balance - amount);
        self.balances.insert(to, credited);
        Ok(())
    }

    fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        self.balances.insert(to, credited);
        self.total_supply = supply;
        Ok(())
    }
}
