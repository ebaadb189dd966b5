use super::VaultAccount;
use crate::core::{Principal, Timestamp};
use crate::error::{Result, VaultError};
use crate::ledger::TokenLedger;
use alloy::primitives::{Address, U256};
use std::fmt::Debug;

/// Behavior behind the vault proxy. Storage lives in [`VaultAccount`]; a logic only decides
/// what withdraw and sweep do with it.
pub trait VaultLogic: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn withdraw(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
        recipient: Address,
        amount: U256,
        now: Timestamp,
    ) -> Result<()>;

    /// Returns the swept amount.
    fn sweep_funds(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
    ) -> Result<U256>;
}

/// Owner withdrawals capped per cooldown window; the sweeper may take everything at any time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardVaultLogic;

impl VaultLogic for StandardVaultLogic {
    fn name(&self) -> &str {
        "standard"
    }

    fn withdraw(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
        recipient: Address,
        amount: U256,
        now: Timestamp,
    ) -> Result<()> {
        vault.require_owner(caller)?;
        let policy = vault.policy();
        if amount > policy.limit {
            return Err(VaultError::ExceedsWithdrawalLimit {
                amount,
                limit: policy.limit,
            }
            .into());
        }
        let ready_after = vault.last_withdrawal().saturating_add(policy.cooldown_secs);
        if now <= ready_after {
            return Err(VaultError::CooldownActive { now, ready_after }.into());
        }

        // The stamp lands before the transfer so a nested withdraw sees the new window.
        let previous = vault.stamp_withdrawal(now);
        if let Err(err) = ledger.transfer(vault.address(), recipient, amount) {
            vault.restore_withdrawal(previous);
            return Err(err);
        }
        tracing::info!(
            "[VAULT] withdraw {} to {:#x} at {}",
            amount,
            recipient,
            now
        );
        Ok(())
    }

    fn sweep_funds(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
    ) -> Result<U256> {
        vault.require_sweeper(caller)?;
        let amount = vault.balance(&*ledger);
        ledger.transfer(vault.address(), vault.sweeper(), amount)?;
        tracing::info!("[VAULT] swept {} to sweeper {:#x}", amount, vault.sweeper());
        Ok(amount)
    }
}

/// Replacement logic an attacker installs after taking over the owner: no limit, no cooldown,
/// and sweeping pays whoever calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrainableVaultLogic;

impl VaultLogic for DrainableVaultLogic {
    fn name(&self) -> &str {
        "drainable"
    }

    fn withdraw(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
        recipient: Address,
        amount: U256,
        now: Timestamp,
    ) -> Result<()> {
        vault.require_owner(caller)?;
        vault.stamp_withdrawal(now);
        ledger.transfer(vault.address(), recipient, amount)
    }

    fn sweep_funds(
        &self,
        vault: &mut VaultAccount,
        ledger: &mut dyn TokenLedger,
        caller: Principal,
    ) -> Result<U256> {
        let amount = vault.balance(&*ledger);
        ledger.transfer(vault.address(), caller, amount)?;
        tracing::warn!("[VAULT] drained {} to {:#x}", amount, caller);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RejectionKind, SimError};
    use crate::ledger::InMemoryLedger;
    use crate::protocols::vault::{OwnerAuthority, WithdrawalPolicy};

    const VAULT: Address = Address::repeat_byte(0x7a);
    const OWNER: Address = Address::repeat_byte(0x71);
    const SWEEPER: Address = Address::repeat_byte(0x5e);
    const RECIPIENT: Address = Address::repeat_byte(0xbe);
    const COOLDOWN: u64 = 15 * 86_400;

    fn fixture() -> (VaultAccount, InMemoryLedger) {
        let vault = VaultAccount::new(
            VAULT,
            OwnerAuthority::Principal(OWNER),
            SWEEPER,
            Address::ZERO,
            WithdrawalPolicy {
                limit: U256::from(100u64),
                cooldown_secs: COOLDOWN,
            },
            1_000,
        );
        let mut ledger = InMemoryLedger::new();
        ledger.mint(VAULT, U256::from(1_000u64)).unwrap();
        (vault, ledger)
    }

    fn kind(result: Result<()>) -> RejectionKind {
        result.map(|_| RejectionKind::Other).unwrap_or_else(|e| e.kind())
    }

    #[test]
    fn test_limit_withdrawal_once_per_window() {
        let (mut vault, mut ledger) = fixture();
        let logic = StandardVaultLogic;
        let amount = U256::from(100u64);

        // The window opens strictly after deployment + cooldown.
        let at_boundary = 1_000 + COOLDOWN;
        let r = logic.withdraw(&mut vault, &mut ledger, OWNER, RECIPIENT, amount, at_boundary);
        assert_eq!(kind(r), RejectionKind::CooldownActive);

        let t = at_boundary + 1;
        logic
            .withdraw(&mut vault, &mut ledger, OWNER, RECIPIENT, amount, t)
            .unwrap();
        assert_eq!(ledger.balance_of(RECIPIENT), amount);
        assert_eq!(vault.last_withdrawal(), t);

        let r = logic.withdraw(&mut vault, &mut ledger, OWNER, RECIPIENT, amount, t + 10);
        assert_eq!(kind(r), RejectionKind::CooldownActive);
        assert_eq!(ledger.balance_of(RECIPIENT), amount);
    }

    #[test]
    fn test_over_limit_and_non_owner_are_rejected() {
        let (mut vault, mut ledger) = fixture();
        let logic = StandardVaultLogic;
        let late = 10 * COOLDOWN;
        let r = logic.withdraw(
            &mut vault,
            &mut ledger,
            OWNER,
            RECIPIENT,
            U256::from(101u64),
            late,
        );
        assert_eq!(kind(r), RejectionKind::ExceedsWithdrawalLimit);
        let r = logic.withdraw(
            &mut vault,
            &mut ledger,
            SWEEPER,
            RECIPIENT,
            U256::from(1u64),
            late,
        );
        assert_eq!(kind(r), RejectionKind::Unauthorized);
        assert_eq!(vault.last_withdrawal(), 1_000);
    }

    #[test]
    fn test_failed_transfer_restores_withdrawal_stamp() {
        let (mut vault, _) = fixture();
        let mut empty = InMemoryLedger::new();
        let r = StandardVaultLogic.withdraw(
            &mut vault,
            &mut empty,
            OWNER,
            RECIPIENT,
            U256::from(1u64),
            10 * COOLDOWN,
        );
        assert!(matches!(r, Err(SimError::Ledger(_))));
        assert_eq!(vault.last_withdrawal(), 1_000);
    }

    #[test]
    fn test_sweep_ignores_limit_and_cooldown() {
        let (mut vault, mut ledger) = fixture();
        let logic = StandardVaultLogic;
        assert!(logic.sweep_funds(&mut vault, &mut ledger, OWNER).is_err());

        let swept = logic.sweep_funds(&mut vault, &mut ledger, SWEEPER).unwrap();
        assert_eq!(swept, U256::from(1_000u64));
        assert_eq!(ledger.balance_of(SWEEPER), swept);

        ledger.mint(VAULT, U256::from(5u64)).unwrap();
        let swept = logic.sweep_funds(&mut vault, &mut ledger, SWEEPER).unwrap();
        assert_eq!(swept, U256::from(5u64));
    }

    #[test]
    fn test_drainable_sweep_pays_any_caller() {
        let (mut vault, mut ledger) = fixture();
        let swept = DrainableVaultLogic
            .sweep_funds(&mut vault, &mut ledger, RECIPIENT)
            .unwrap();
        assert_eq!(swept, U256::from(1_000u64));
        assert_eq!(ledger.balance_of(RECIPIENT), swept);
        assert_eq!(DrainableVaultLogic.name(), "drainable");
    }
}
