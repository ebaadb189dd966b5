//! Call routing: decode the payload against the target account's interface and run it.

use super::{Account, CallFrame, World};
use crate::abi::{self, IRegistry, IScheduler, IToken, IVault, IWallet, IWalletFactory};
use crate::core::{Principal, Role};
use crate::error::{DispatchError, Result, SchedulerError, SimError, WalletError};
use crate::ledger::TokenLedger;
use crate::protocols::registry::{AccessGatedRegistry, WalletDescriptor};
use crate::protocols::timelock::{Batch, Scheduler};
use crate::protocols::vault::VaultAccount;
use crate::protocols::wallet::{SafeWallet, WalletFactory};
use crate::utils::constants::MAX_CALL_DEPTH;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolInterface};

fn decode<C: SolInterface>(target: Address, payload: &[u8]) -> Result<C> {
    C::abi_decode(payload, true).map_err(|e| {
        SimError::from(DispatchError::Decode {
            target,
            reason: e.to_string(),
        })
    })
}

fn success() -> Bytes {
    abi::encode_word(U256::from(1u64))
}

impl World {
    pub(crate) fn call_at_depth(
        &mut self,
        caller: Principal,
        target: Address,
        value: U256,
        payload: Bytes,
        depth: usize,
    ) -> Result<Bytes> {
        if depth > MAX_CALL_DEPTH {
            return Err(DispatchError::DepthExceeded(MAX_CALL_DEPTH).into());
        }
        if !value.is_zero() {
            self.ledger.transfer(caller, target, value)?;
        }
        let frame = CallFrame {
            this: target,
            caller,
            value,
            payload,
            depth,
        };

        let Some(account) = self.accounts.get(&target) else {
            // Plain address: only bare value transfers land.
            if frame.payload.is_empty() {
                return Ok(Bytes::new());
            }
            return Err(DispatchError::UnknownAccount(target).into());
        };

        match account {
            Account::Token => self.dispatch_token(&frame),
            Account::Factory(_) => self.dispatch_factory(&frame),
            Account::Wallet(_) => self.dispatch_wallet(&frame),
            Account::Registry(_) => self.dispatch_registry(&frame),
            Account::Scheduler(_) => self.dispatch_scheduler(&frame),
            Account::Vault(_) => self.dispatch_vault(&frame),
            Account::Actor(actor) => {
                let actor = actor.clone();
                actor.on_call(self, &frame)
            }
            Account::WalletTemplate | Account::VaultLogic(_) => {
                Err(DispatchError::WrongAccountKind(target, "callable account").into())
            }
        }
    }

    fn wallet_mut(&mut self, address: Address) -> Result<&mut SafeWallet> {
        match self.accounts.get_mut(&address) {
            Some(Account::Wallet(wallet)) => Ok(wallet),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "wallet").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    fn scheduler_mut(&mut self, address: Address) -> Result<&mut Scheduler> {
        match self.accounts.get_mut(&address) {
            Some(Account::Scheduler(scheduler)) => Ok(scheduler),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "scheduler").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    fn registry_mut(&mut self, address: Address) -> Result<&mut AccessGatedRegistry> {
        match self.accounts.get_mut(&address) {
            Some(Account::Registry(registry)) => Ok(registry),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "registry").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    fn dispatch_token(&mut self, frame: &CallFrame) -> Result<Bytes> {
        match decode::<IToken::ITokenCalls>(frame.this, &frame.payload)? {
            IToken::ITokenCalls::transfer(call) => {
                self.ledger.transfer(frame.caller, call.to, call.amount)?;
                Ok(success())
            }
            IToken::ITokenCalls::balanceOf(call) => {
                Ok(abi::encode_word(self.ledger.balance_of(call.holder)))
            }
        }
    }

    fn dispatch_wallet(&mut self, frame: &CallFrame) -> Result<Bytes> {
        let selector = abi::selector_of(&frame.payload);
        if !IWallet::IWalletCalls::valid_selector(selector) {
            let handler = self.wallet(frame.this)?.fallback_handler();
            return match handler {
                Some(handler) => {
                    self.call_from_frame(frame, handler, U256::ZERO, frame.payload.clone())
                }
                None => Err(WalletError::UnknownSelector(selector).into()),
            };
        }

        match decode::<IWallet::IWalletCalls>(frame.this, &frame.payload)? {
            IWallet::IWalletCalls::setup(_) => Err(WalletError::AlreadyInitialized.into()),
            IWallet::IWalletCalls::enableModule(call) => {
                self.wallet_mut(frame.this)?
                    .enable_module(frame.caller, call.module)?;
                Ok(Bytes::new())
            }
            IWallet::IWalletCalls::setFallbackHandler(call) => {
                self.wallet_mut(frame.this)?
                    .set_fallback_handler(frame.caller, call.handler)?;
                Ok(Bytes::new())
            }
            IWallet::IWalletCalls::execTransactionFromModule(call) => {
                self.wallet(frame.this)?.require_module(frame.caller)?;
                tracing::debug!(
                    "[WALLET] module {:#x} executing through {:#x} -> {:#x}",
                    frame.caller,
                    frame.this,
                    call.to
                );
                self.call_from_frame(frame, call.to, call.value, call.data)?;
                Ok(success())
            }
            IWallet::IWalletCalls::execTransaction(call) => {
                self.wallet(frame.this)?.require_sole_signer(frame.caller)?;
                self.call_from_frame(frame, call.to, call.value, call.data)?;
                Ok(success())
            }
        }
    }

    fn dispatch_factory(&mut self, frame: &CallFrame) -> Result<Bytes> {
        let IWalletFactory::IWalletFactoryCalls::createProxyWithCallback(call) =
            decode::<IWalletFactory::IWalletFactoryCalls>(frame.this, &frame.payload)?;

        self.ensure_template(call.singleton)?;
        let wallet_address = WalletFactory::wallet_address(
            frame.this,
            call.singleton,
            &call.initializer,
            call.saltNonce,
        );
        if self.accounts.contains_key(&wallet_address) {
            return Err(WalletError::AddressCollision(wallet_address).into());
        }

        let setup = IWallet::setupCall::abi_decode(&call.initializer, true).map_err(|e| {
            SimError::from(DispatchError::Decode {
                target: wallet_address,
                reason: e.to_string(),
            })
        })?;
        let wallet = SafeWallet::configure(
            wallet_address,
            call.singleton,
            setup.owners,
            setup.threshold,
            setup.fallbackHandler,
        )?;
        self.accounts.insert(wallet_address, Account::Wallet(wallet));
        if let Some(Account::Factory(factory)) = self.accounts.get_mut(&frame.this) {
            factory.record_creation();
        }
        tracing::info!(
            "[WALLET] factory {:#x} created wallet {:#x}",
            frame.this,
            wallet_address
        );

        // Setup sub-call runs with the wallet's own authority. Targeting the template means
        // "apply this payload to myself".
        if setup.to == call.singleton {
            let self_call = CallFrame {
                this: wallet_address,
                caller: wallet_address,
                value: U256::ZERO,
                payload: setup.data,
                depth: frame.depth + 1,
            };
            self.dispatch_wallet(&self_call)?;
        } else if !setup.to.is_zero() {
            self.call_at_depth(
                wallet_address,
                setup.to,
                U256::ZERO,
                setup.data,
                frame.depth + 1,
            )?;
        }

        if !call.callback.is_zero() {
            self.call_from_frame(
                frame,
                call.callback,
                U256::ZERO,
                abi::registry_proxy_created(
                    wallet_address,
                    call.singleton,
                    call.initializer,
                    call.saltNonce,
                ),
            )?;
        }
        Ok(abi::encode_address(wallet_address))
    }

    fn dispatch_registry(&mut self, frame: &CallFrame) -> Result<Bytes> {
        match decode::<IRegistry::IRegistryCalls>(frame.this, &frame.payload)? {
            IRegistry::IRegistryCalls::addBeneficiary(call) => {
                self.registry_mut(frame.this)?
                    .add_beneficiary(frame.caller, call.beneficiary)?;
                Ok(Bytes::new())
            }
            IRegistry::IRegistryCalls::proxyCreated(call) => {
                let wallet = self.wallet(call.proxy)?;
                let descriptor = WalletDescriptor {
                    wallet: call.proxy,
                    owners: wallet.owners().to_vec(),
                    threshold: wallet.threshold(),
                    template: wallet.template(),
                    initializer: call.initializer,
                    delegation_hook: wallet.delegation_hook(),
                };
                let Some(Account::Registry(registry)) = self.accounts.get_mut(&frame.this) else {
                    return Err(DispatchError::WrongAccountKind(frame.this, "registry").into());
                };
                let paid = registry.on_wallet_created(&mut self.ledger, &descriptor, frame.caller)?;
                Ok(abi::encode_word(paid))
            }
        }
    }

    fn dispatch_scheduler(&mut self, frame: &CallFrame) -> Result<Bytes> {
        let now = self.now;
        match decode::<IScheduler::ISchedulerCalls>(frame.this, &frame.payload)? {
            IScheduler::ISchedulerCalls::schedule(call) => {
                let batch =
                    Batch::from_parts(call.targets, call.values, call.dataElements, call.salt)?;
                let id = self.scheduler_mut(frame.this)?.propose(frame.caller, &batch, now)?;
                Ok(Bytes::from(id.to_vec()))
            }
            IScheduler::ISchedulerCalls::execute(call) => {
                let batch =
                    Batch::from_parts(call.targets, call.values, call.dataElements, call.salt)?;
                let id = self.scheduler_mut(frame.this)?.begin_execution(&batch, now)?;
                for op in batch.operations {
                    self.call_from_frame(frame, op.target, op.value, op.payload)?;
                }
                self.scheduler_mut(frame.this)?.finish_execution(id, now)?;
                Ok(Bytes::from(id.to_vec()))
            }
            IScheduler::ISchedulerCalls::updateDelay(call) => {
                self.scheduler_mut(frame.this)?
                    .update_delay(frame.caller, call.newDelay)?;
                Ok(Bytes::new())
            }
            IScheduler::ISchedulerCalls::grantRole(call) => {
                let role = Role::from_id(call.role).ok_or(SchedulerError::UnknownRole(call.role))?;
                self.scheduler_mut(frame.this)?
                    .grant_role(frame.caller, role, call.account)?;
                Ok(Bytes::new())
            }
            IScheduler::ISchedulerCalls::revokeRole(call) => {
                let role = Role::from_id(call.role).ok_or(SchedulerError::UnknownRole(call.role))?;
                self.scheduler_mut(frame.this)?
                    .revoke_role(frame.caller, role, call.account)?;
                Ok(Bytes::new())
            }
        }
    }

    fn dispatch_vault(&mut self, frame: &CallFrame) -> Result<Bytes> {
        let now = self.now;
        match decode::<IVault::IVaultCalls>(frame.this, &frame.payload)? {
            IVault::IVaultCalls::upgradeTo(call) => {
                let deployed = matches!(
                    self.accounts.get(&call.newImplementation),
                    Some(Account::VaultLogic(_))
                );
                self.vault_mut(frame.this)?
                    .upgrade_to(frame.caller, call.newImplementation, deployed)?;
                Ok(Bytes::new())
            }
            IVault::IVaultCalls::withdraw(call) => {
                let logic = self.vault_logic(self.vault(frame.this)?.implementation())?;
                let Some(Account::Vault(vault)) = self.accounts.get_mut(&frame.this) else {
                    return Err(DispatchError::WrongAccountKind(frame.this, "vault").into());
                };
                logic.withdraw(
                    vault,
                    &mut self.ledger,
                    frame.caller,
                    call.recipient,
                    call.amount,
                    now,
                )?;
                Ok(Bytes::new())
            }
            IVault::IVaultCalls::sweepFunds(_) => {
                let logic = self.vault_logic(self.vault(frame.this)?.implementation())?;
                let Some(Account::Vault(vault)) = self.accounts.get_mut(&frame.this) else {
                    return Err(DispatchError::WrongAccountKind(frame.this, "vault").into());
                };
                let swept = logic.sweep_funds(vault, &mut self.ledger, frame.caller)?;
                Ok(abi::encode_word(swept))
            }
        }
    }

    fn vault_mut(&mut self, address: Address) -> Result<&mut VaultAccount> {
        match self.accounts.get_mut(&address) {
            Some(Account::Vault(vault)) => Ok(vault),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "vault").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }
}
