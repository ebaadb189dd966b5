//! Single-use registration payouts for wallets created by a trusted factory.

pub mod descriptor;

pub use descriptor::WalletDescriptor;

use crate::abi::{declared_fallback_handler, selector_of, IWallet};
use crate::core::Principal;
use crate::error::{RegistryError, Result};
use crate::ledger::TokenLedger;
use crate::utils::constants::{EXPECTED_OWNERS_COUNT, EXPECTED_THRESHOLD};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::collections::{BTreeMap, BTreeSet};

/// How the registry looks for a delegation hook on a new wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationCheck {
    /// Inspect the wallet after setup, catching hooks installed by nested setup calls.
    FinalState,
    /// Inspect only the fallback handler argument of the initializer bytes.
    DeclaredOnly,
    /// No check at all.
    Disabled,
}

impl DelegationCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FinalState => "final_state",
            Self::DeclaredOnly => "declared_only",
            Self::Disabled => "disabled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "final_state" | "final" => Some(Self::FinalState),
            "declared_only" | "declared" => Some(Self::DeclaredOnly),
            "disabled" | "off" | "none" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub admin: Principal,
    pub template: Address,
    pub factory: Address,
    pub payout: U256,
    pub delegation_check: DelegationCheck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGatedRegistry {
    address: Address,
    settings: RegistrySettings,
    beneficiaries: BTreeSet<Principal>,
    registered_wallets: BTreeMap<Principal, Address>,
}

impl AccessGatedRegistry {
    pub fn new(
        address: Address,
        settings: RegistrySettings,
        initial_beneficiaries: &[Principal],
    ) -> Self {
        Self {
            address,
            settings,
            beneficiaries: initial_beneficiaries.iter().copied().collect(),
            registered_wallets: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_beneficiary(&self, principal: Principal) -> bool {
        self.beneficiaries.contains(&principal)
    }

    pub fn beneficiaries(&self) -> impl Iterator<Item = &Principal> {
        self.beneficiaries.iter()
    }

    pub fn registered_wallet(&self, principal: Principal) -> Option<Address> {
        self.registered_wallets.get(&principal).copied()
    }

    /// Admin-only set insert. A principal that already registered stays consumed; the call
    /// returns `false` for it just as for an existing entry.
    pub fn add_beneficiary(&mut self, caller: Principal, principal: Principal) -> Result<bool> {
        if caller != self.settings.admin {
            return Err(RegistryError::Unauthorized(caller).into());
        }
        if self.registered_wallets.contains_key(&principal) {
            tracing::warn!(
                "[REGISTRY] {:#x} already consumed its registration; not re-added",
                principal
            );
            return Ok(false);
        }
        let inserted = self.beneficiaries.insert(principal);
        if inserted {
            tracing::info!("[REGISTRY] beneficiary added {:#x}", principal);
        }
        Ok(inserted)
    }

    /// Every check runs before any write; the first failing check decides the error.
    fn validate(
        &self,
        ledger: &dyn TokenLedger,
        descriptor: &WalletDescriptor,
        creating_factory: Address,
    ) -> Result<Principal> {
        let balance = ledger.balance_of(self.address);
        if balance < self.settings.payout {
            return Err(RegistryError::InsufficientFunds {
                balance,
                payout: self.settings.payout,
            }
            .into());
        }
        if creating_factory != self.settings.factory {
            return Err(RegistryError::UnauthorizedFactory {
                expected: self.settings.factory,
                actual: creating_factory,
            }
            .into());
        }
        if descriptor.template != self.settings.template {
            return Err(RegistryError::UntrustedTemplate {
                expected: self.settings.template,
                actual: descriptor.template,
            }
            .into());
        }
        if descriptor.initializer.len() < 4
            || selector_of(&descriptor.initializer) != IWallet::setupCall::SELECTOR
        {
            return Err(RegistryError::MalformedInitializer.into());
        }
        if descriptor.threshold != U256::from(EXPECTED_THRESHOLD) {
            return Err(RegistryError::InvalidThreshold(descriptor.threshold).into());
        }
        if descriptor.owners.len() != EXPECTED_OWNERS_COUNT {
            return Err(RegistryError::InvalidOwnerCount(descriptor.owners.len()).into());
        }
        let owner = descriptor
            .sole_owner()
            .ok_or(RegistryError::InvalidOwnerCount(descriptor.owners.len()))?;
        if !self.beneficiaries.contains(&owner) {
            return Err(RegistryError::NotABeneficiary(owner).into());
        }
        if let Some(hook) = self.detect_delegation_hook(descriptor) {
            return Err(RegistryError::UnauthorizedDelegation(hook).into());
        }
        Ok(owner)
    }

    fn detect_delegation_hook(&self, descriptor: &WalletDescriptor) -> Option<Address> {
        match self.settings.delegation_check {
            DelegationCheck::FinalState => descriptor.delegation_hook,
            DelegationCheck::DeclaredOnly => {
                declared_fallback_handler(&descriptor.initializer).filter(|h| !h.is_zero())
            }
            DelegationCheck::Disabled => None,
        }
    }

    /// Registration entry point, driven by the wallet factory right after setup.
    /// On success the owner's slot is consumed, the wallet recorded, and the payout sent.
    pub fn on_wallet_created(
        &mut self,
        ledger: &mut dyn TokenLedger,
        descriptor: &WalletDescriptor,
        creating_factory: Address,
    ) -> Result<U256> {
        let owner = match self.validate(&*ledger, descriptor, creating_factory) {
            Ok(owner) => owner,
            Err(err) => {
                tracing::warn!(
                    "[REGISTRY] rejected wallet {:#x}: {}",
                    descriptor.wallet,
                    err
                );
                return Err(err);
            }
        };

        self.beneficiaries.remove(&owner);
        self.registered_wallets.insert(owner, descriptor.wallet);
        if let Err(err) = ledger.transfer(self.address, descriptor.wallet, self.settings.payout) {
            self.registered_wallets.remove(&owner);
            self.beneficiaries.insert(owner);
            return Err(err);
        }

        tracing::info!(
            "[REGISTRY] registered wallet {:#x} for {:#x} payout={}",
            descriptor.wallet,
            owner,
            self.settings.payout
        );
        Ok(self.settings.payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::wallet_setup;
    use crate::error::{RejectionKind, SimError};
    use crate::ledger::InMemoryLedger;
    use alloy::primitives::Bytes;

    const REGISTRY: Address = Address::repeat_byte(0xe0);
    const ADMIN: Address = Address::repeat_byte(0xe1);
    const TEMPLATE: Address = Address::repeat_byte(0xe2);
    const FACTORY: Address = Address::repeat_byte(0xe3);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const MALLORY: Address = Address::repeat_byte(0xa9);
    const WALLET: Address = Address::repeat_byte(0x5a);

    fn payout() -> U256 {
        U256::from(10u64)
    }

    fn setup(check: DelegationCheck) -> (AccessGatedRegistry, InMemoryLedger) {
        let registry = AccessGatedRegistry::new(
            REGISTRY,
            RegistrySettings {
                admin: ADMIN,
                template: TEMPLATE,
                factory: FACTORY,
                payout: payout(),
                delegation_check: check,
            },
            &[ALICE],
        );
        let mut ledger = InMemoryLedger::new();
        ledger.mint(REGISTRY, U256::from(40u64)).unwrap();
        (registry, ledger)
    }

    fn descriptor(owner: Address) -> WalletDescriptor {
        WalletDescriptor {
            wallet: WALLET,
            owners: vec![owner],
            threshold: U256::from(1u64),
            template: TEMPLATE,
            initializer: wallet_setup(vec![owner], 1, Address::ZERO, Bytes::new(), Address::ZERO),
            delegation_hook: None,
        }
    }

    fn kind_of(result: Result<U256>) -> RejectionKind {
        match result {
            Ok(_) => panic!("expected rejection"),
            Err(err) => err.kind(),
        }
    }

    #[test]
    fn test_valid_registration_pays_once() {
        let (mut registry, mut ledger) = setup(DelegationCheck::FinalState);
        let paid = registry
            .on_wallet_created(&mut ledger, &descriptor(ALICE), FACTORY)
            .unwrap();
        assert_eq!(paid, payout());
        assert_eq!(ledger.balance_of(WALLET), payout());
        assert_eq!(registry.registered_wallet(ALICE), Some(WALLET));
        assert!(!registry.is_beneficiary(ALICE));

        let again = registry.on_wallet_created(&mut ledger, &descriptor(ALICE), FACTORY);
        assert_eq!(kind_of(again), RejectionKind::NotABeneficiary);
    }

    #[test]
    fn test_checks_fire_in_order() {
        let (mut registry, _) = setup(DelegationCheck::FinalState);
        let mut poor_ledger = InMemoryLedger::new();
        poor_ledger.mint(REGISTRY, U256::from(1u64)).unwrap();
        // A descriptor wrong in every way still reports the balance first.
        let mut bad = descriptor(MALLORY);
        bad.template = Address::repeat_byte(0x01);
        bad.threshold = U256::from(2u64);
        let result = registry.on_wallet_created(&mut poor_ledger, &bad, Address::ZERO);
        assert_eq!(kind_of(result), RejectionKind::InsufficientFunds);

        let (mut registry, mut ledger) = setup(DelegationCheck::FinalState);
        let result = registry.on_wallet_created(&mut ledger, &bad, Address::ZERO);
        assert_eq!(kind_of(result), RejectionKind::UnauthorizedFactory);
        let result = registry.on_wallet_created(&mut ledger, &bad, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::UntrustedTemplate);

        bad.template = TEMPLATE;
        let mut malformed = bad.clone();
        malformed.initializer = Bytes::from_static(&[0xff, 0xff, 0xff, 0xff]);
        let result = registry.on_wallet_created(&mut ledger, &malformed, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::MalformedInitializer);

        let result = registry.on_wallet_created(&mut ledger, &bad, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::InvalidThreshold);

        bad.threshold = U256::from(1u64);
        bad.owners = vec![MALLORY, ALICE];
        let result = registry.on_wallet_created(&mut ledger, &bad, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::InvalidOwnerCount);

        bad.owners = vec![MALLORY];
        let result = registry.on_wallet_created(&mut ledger, &bad, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::NotABeneficiary);

        assert_eq!(ledger.balance_of(REGISTRY), U256::from(40u64));
        assert!(registry.is_beneficiary(ALICE));
    }

    #[test]
    fn test_final_state_hook_blocks_without_side_effects() {
        let (mut registry, mut ledger) = setup(DelegationCheck::FinalState);
        let before = (registry.clone(), ledger.clone());
        let mut hooked = descriptor(ALICE);
        hooked.delegation_hook = Some(MALLORY);

        let result = registry.on_wallet_created(&mut ledger, &hooked, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::UnauthorizedDelegation);
        assert_eq!((registry, ledger), before);
    }

    #[test]
    fn test_declared_only_misses_hooks_installed_during_setup() {
        let (mut registry, mut ledger) = setup(DelegationCheck::DeclaredOnly);
        let mut hooked = descriptor(ALICE);
        hooked.delegation_hook = Some(MALLORY);
        assert!(registry
            .on_wallet_created(&mut ledger, &hooked, FACTORY)
            .is_ok());

        let (mut registry, mut ledger) = setup(DelegationCheck::DeclaredOnly);
        let mut declared = descriptor(ALICE);
        declared.initializer = wallet_setup(vec![ALICE], 1, Address::ZERO, Bytes::new(), MALLORY);
        let result = registry.on_wallet_created(&mut ledger, &declared, FACTORY);
        assert_eq!(kind_of(result), RejectionKind::UnauthorizedDelegation);
    }

    #[test]
    fn test_disabled_check_accepts_hooked_wallet() {
        let (mut registry, mut ledger) = setup(DelegationCheck::Disabled);
        let mut hooked = descriptor(ALICE);
        hooked.delegation_hook = Some(MALLORY);
        assert!(registry
            .on_wallet_created(&mut ledger, &hooked, FACTORY)
            .is_ok());
    }

    #[test]
    fn test_add_beneficiary_is_admin_only_and_idempotent() {
        let (mut registry, mut ledger) = setup(DelegationCheck::FinalState);
        let err = registry.add_beneficiary(MALLORY, MALLORY).unwrap_err();
        assert!(matches!(
            err,
            SimError::Registry(RegistryError::Unauthorized(_))
        ));
        assert!(registry.add_beneficiary(ADMIN, MALLORY).unwrap());
        assert!(!registry.add_beneficiary(ADMIN, MALLORY).unwrap());
        let listed: Vec<Principal> = registry.beneficiaries().copied().collect();
        assert_eq!(listed, vec![ALICE, MALLORY]);

        registry
            .on_wallet_created(&mut ledger, &descriptor(ALICE), FACTORY)
            .unwrap();
        assert!(!registry.add_beneficiary(ADMIN, ALICE).unwrap());
        assert!(!registry.is_beneficiary(ALICE));
        assert_eq!(registry.beneficiaries().count(), 1);
    }
}
