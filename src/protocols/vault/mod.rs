//! Upgradeable vault owned through an [`Authorizer`], normally the scheduler.

pub mod logic;

pub use logic::{DrainableVaultLogic, StandardVaultLogic, VaultLogic};

use crate::core::{Principal, Timestamp};
use crate::error::{Result, VaultError};
use crate::ledger::TokenLedger;
use alloy::primitives::{Address, U256};

pub trait Authorizer {
    fn is_authorized(&self, caller: Principal) -> bool;
}

/// Who may act as the vault owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAuthority {
    Principal(Principal),
    /// The scheduler at this address; it only ever calls through executed batches.
    Scheduler(Address),
}

impl Authorizer for OwnerAuthority {
    fn is_authorized(&self, caller: Principal) -> bool {
        match self {
            Self::Principal(owner) => *owner == caller,
            Self::Scheduler(scheduler) => *scheduler == caller,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub limit: U256,
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAccount {
    address: Address,
    owner: OwnerAuthority,
    sweeper: Principal,
    last_withdrawal: Timestamp,
    implementation: Address,
    policy: WithdrawalPolicy,
}

impl VaultAccount {
    /// The withdrawal window starts at deployment.
    pub fn new(
        address: Address,
        owner: OwnerAuthority,
        sweeper: Principal,
        implementation: Address,
        policy: WithdrawalPolicy,
        deployed_at: Timestamp,
    ) -> Self {
        Self {
            address,
            owner,
            sweeper,
            last_withdrawal: deployed_at,
            implementation,
            policy,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> OwnerAuthority {
        self.owner
    }

    pub fn sweeper(&self) -> Principal {
        self.sweeper
    }

    pub fn last_withdrawal(&self) -> Timestamp {
        self.last_withdrawal
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    pub fn policy(&self) -> WithdrawalPolicy {
        self.policy
    }

    pub fn balance(&self, ledger: &dyn TokenLedger) -> U256 {
        ledger.balance_of(self.address)
    }

    pub fn require_owner(&self, caller: Principal) -> Result<()> {
        if self.owner.is_authorized(caller) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized(caller).into())
        }
    }

    pub fn require_sweeper(&self, caller: Principal) -> Result<()> {
        if caller == self.sweeper {
            Ok(())
        } else {
            Err(VaultError::Unauthorized(caller).into())
        }
    }

    /// Stamps the withdrawal clock and returns the previous value for rollback.
    pub(crate) fn stamp_withdrawal(&mut self, now: Timestamp) -> Timestamp {
        std::mem::replace(&mut self.last_withdrawal, now)
    }

    pub(crate) fn restore_withdrawal(&mut self, previous: Timestamp) {
        self.last_withdrawal = previous;
    }

    /// Owner-only. `is_deployed` says whether `new_implementation` holds vault logic.
    pub fn upgrade_to(
        &mut self,
        caller: Principal,
        new_implementation: Address,
        is_deployed: bool,
    ) -> Result<()> {
        self.require_owner(caller)?;
        if !is_deployed {
            return Err(VaultError::UnknownImplementation(new_implementation).into());
        }
        tracing::info!(
            "[VAULT] {:#x} upgraded {:#x} -> {:#x}",
            self.address,
            self.implementation,
            new_implementation
        );
        self.implementation = new_implementation;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    const VAULT: Address = Address::repeat_byte(0x7a);
    const SCHEDULER: Address = Address::repeat_byte(0x71);
    const SWEEPER: Address = Address::repeat_byte(0x5e);
    const LOGIC: Address = Address::repeat_byte(0x10);

    fn vault() -> VaultAccount {
        VaultAccount::new(
            VAULT,
            OwnerAuthority::Scheduler(SCHEDULER),
            SWEEPER,
            LOGIC,
            WithdrawalPolicy {
                limit: U256::from(1u64),
                cooldown_secs: 10,
            },
            0,
        )
    }

    #[test]
    fn test_authorizer_variants() {
        assert!(OwnerAuthority::Scheduler(SCHEDULER).is_authorized(SCHEDULER));
        assert!(!OwnerAuthority::Scheduler(SCHEDULER).is_authorized(SWEEPER));
        assert!(OwnerAuthority::Principal(SWEEPER).is_authorized(SWEEPER));
    }

    #[test]
    fn test_upgrade_requires_owner_and_deployed_logic() {
        let mut v = vault();
        let next = Address::repeat_byte(0x11);
        assert!(matches!(
            v.upgrade_to(SWEEPER, next, true),
            Err(SimError::Vault(VaultError::Unauthorized(_)))
        ));
        assert!(matches!(
            v.upgrade_to(SCHEDULER, next, false),
            Err(SimError::Vault(VaultError::UnknownImplementation(_)))
        ));
        v.upgrade_to(SCHEDULER, next, true).unwrap();
        assert_eq!(v.implementation(), next);
        assert_eq!(v.owner(), OwnerAuthority::Scheduler(SCHEDULER));
    }
}
