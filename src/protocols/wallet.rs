//! Threshold wallets and the factory that creates them.

use crate::core::Principal;
use crate::error::{Result, WalletError};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeWallet {
    address: Address,
    template: Address,
    owners: Vec<Principal>,
    threshold: U256,
    fallback_handler: Option<Address>,
    modules: Vec<Address>,
}

impl SafeWallet {
    /// Validates the owner set and threshold the way `setup` does before anything is stored.
    pub fn configure(
        address: Address,
        template: Address,
        owners: Vec<Principal>,
        threshold: U256,
        fallback_handler: Address,
    ) -> Result<Self> {
        if owners.is_empty() {
            return Err(WalletError::NoOwners.into());
        }
        let mut seen = BTreeSet::new();
        for owner in &owners {
            if owner.is_zero() || *owner == address || !seen.insert(*owner) {
                return Err(WalletError::InvalidOwner(*owner).into());
            }
        }
        if threshold.is_zero() || threshold > U256::from(owners.len()) {
            return Err(WalletError::ThresholdOutOfRange {
                threshold,
                owners: owners.len(),
            }
            .into());
        }
        Ok(Self {
            address,
            template,
            owners,
            threshold,
            fallback_handler: (!fallback_handler.is_zero()).then_some(fallback_handler),
            modules: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn template(&self) -> Address {
        self.template
    }

    pub fn owners(&self) -> &[Principal] {
        &self.owners
    }

    pub fn threshold(&self) -> U256 {
        self.threshold
    }

    pub fn fallback_handler(&self) -> Option<Address> {
        self.fallback_handler
    }

    pub fn modules(&self) -> &[Address] {
        &self.modules
    }

    pub fn is_owner(&self, who: Principal) -> bool {
        self.owners.contains(&who)
    }

    pub fn is_module(&self, who: Address) -> bool {
        self.modules.contains(&who)
    }

    /// Any extension point that can act for or intercept the wallet: the fallback handler,
    /// otherwise the first enabled module.
    pub fn delegation_hook(&self) -> Option<Address> {
        self.fallback_handler
            .or_else(|| self.modules.first().copied())
    }

    fn require_self(&self, caller: Address) -> Result<()> {
        if caller == self.address {
            Ok(())
        } else {
            Err(WalletError::Unauthorized(caller).into())
        }
    }

    pub fn enable_module(&mut self, caller: Address, module: Address) -> Result<()> {
        self.require_self(caller)?;
        if module.is_zero() || module == self.address {
            return Err(WalletError::InvalidOwner(module).into());
        }
        if !self.modules.contains(&module) {
            tracing::info!("[WALLET] {:#x} enabled module {:#x}", self.address, module);
            self.modules.push(module);
        }
        Ok(())
    }

    pub fn set_fallback_handler(&mut self, caller: Address, handler: Address) -> Result<()> {
        self.require_self(caller)?;
        self.fallback_handler = (!handler.is_zero()).then_some(handler);
        tracing::info!(
            "[WALLET] {:#x} fallback handler set to {:#x}",
            self.address,
            handler
        );
        Ok(())
    }

    /// Owner-issued transactions are modelled for threshold-1 wallets only.
    pub fn require_sole_signer(&self, caller: Principal) -> Result<()> {
        if self.is_owner(caller) && self.threshold == U256::from(1u64) {
            Ok(())
        } else {
            Err(WalletError::Unauthorized(caller).into())
        }
    }

    pub fn require_module(&self, caller: Address) -> Result<()> {
        if self.is_module(caller) {
            Ok(())
        } else {
            Err(WalletError::Unauthorized(caller).into())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletFactory {
    address: Address,
    created: u64,
}

impl WalletFactory {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            created: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn record_creation(&mut self) {
        self.created += 1;
    }

    /// CREATE2-style address: the initializer and nonce pick the salt, the template the code.
    pub fn wallet_address(
        factory: Address,
        template: Address,
        initializer: &Bytes,
        salt_nonce: U256,
    ) -> Address {
        let mut salt_input = Vec::with_capacity(64);
        salt_input.extend_from_slice(keccak256(initializer).as_slice());
        salt_input.extend_from_slice(&salt_nonce.to_be_bytes::<32>());
        let salt = keccak256(&salt_input);
        let code_hash: B256 = keccak256(template.as_slice());
        factory.create2(salt.0, code_hash.0)
    }
}
