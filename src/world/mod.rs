//! In-process execution substrate: one clock, one token ledger, and an address-keyed account
//! table. Every entry point is a call `(caller, target, value, payload)` with ABI call data.

pub mod actors;
mod dispatch;
pub mod shared;

pub use actors::{Actor, CallFrame, CallSequence, ScheduleRelay};
pub use shared::SharedWorld;

use crate::core::{Principal, Timestamp};
use crate::error::{DispatchError, Result, VaultError, WalletError};
use crate::ledger::{InMemoryLedger, TokenLedger};
use crate::protocols::registry::{AccessGatedRegistry, RegistrySettings};
use crate::protocols::timelock::{ReadinessCheck, Scheduler};
use crate::protocols::vault::{OwnerAuthority, VaultAccount, VaultLogic, WithdrawalPolicy};
use crate::protocols::wallet::{SafeWallet, WalletFactory};
use alloy::primitives::{Address, Bytes, U256};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Account {
    Token,
    WalletTemplate,
    Factory(WalletFactory),
    Wallet(SafeWallet),
    Registry(AccessGatedRegistry),
    Scheduler(Scheduler),
    Vault(VaultAccount),
    VaultLogic(Arc<dyn VaultLogic>),
    Actor(Arc<dyn Actor>),
}

impl Account {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::WalletTemplate => "wallet template",
            Self::Factory(_) => "wallet factory",
            Self::Wallet(_) => "wallet",
            Self::Registry(_) => "registry",
            Self::Scheduler(_) => "scheduler",
            Self::Vault(_) => "vault",
            Self::VaultLogic(_) => "vault logic",
            Self::Actor(_) => "actor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct World {
    now: Timestamp,
    token: Address,
    ledger: InMemoryLedger,
    accounts: BTreeMap<Address, Account>,
    nonces: BTreeMap<Address, u64>,
}

impl World {
    pub fn new(start: Timestamp) -> Self {
        let mut world = Self {
            now: start,
            token: Address::ZERO,
            ledger: InMemoryLedger::new(),
            accounts: BTreeMap::new(),
            nonces: BTreeMap::new(),
        };
        world.token = world.install(Address::ZERO, Account::Token);
        world
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn warp(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
        tracing::debug!("[WORLD] clock warped +{}s to {}", secs, self.now);
    }

    pub fn set_time(&mut self, at: Timestamp) {
        self.now = at;
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.ledger.balance_of(holder)
    }

    pub fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        self.ledger.mint(to, amount)
    }

    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// Address the next deployment by `deployer` will land on.
    pub fn predict_address(&self, deployer: Address) -> Address {
        deployer.create(self.nonces.get(&deployer).copied().unwrap_or(0))
    }

    fn install(&mut self, deployer: Address, account: Account) -> Address {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let address = deployer.create(*nonce);
        *nonce += 1;
        tracing::debug!(
            "[WORLD] deployed {} at {:#x} by {:#x}",
            account.kind(),
            address,
            deployer
        );
        self.accounts.insert(address, account);
        address
    }

    pub fn deploy_wallet_template(&mut self, deployer: Address) -> Address {
        self.install(deployer, Account::WalletTemplate)
    }

    pub fn deploy_factory(&mut self, deployer: Address) -> Address {
        let address = self.predict_address(deployer);
        self.install(deployer, Account::Factory(WalletFactory::new(address)))
    }

    pub fn deploy_registry(
        &mut self,
        deployer: Address,
        settings: RegistrySettings,
        initial_beneficiaries: &[Principal],
    ) -> Address {
        let address = self.predict_address(deployer);
        let registry = AccessGatedRegistry::new(address, settings, initial_beneficiaries);
        self.install(deployer, Account::Registry(registry))
    }

    pub fn deploy_scheduler(
        &mut self,
        deployer: Address,
        proposer: Principal,
        delay: u64,
        max_delay: u64,
        readiness: ReadinessCheck,
    ) -> Result<Address> {
        let address = self.predict_address(deployer);
        let scheduler = Scheduler::new(address, proposer, delay, max_delay, readiness)?;
        Ok(self.install(deployer, Account::Scheduler(scheduler)))
    }

    pub fn deploy_vault_logic(&mut self, deployer: Address, logic: Arc<dyn VaultLogic>) -> Address {
        self.install(deployer, Account::VaultLogic(logic))
    }

    pub fn deploy_vault(
        &mut self,
        deployer: Address,
        owner: OwnerAuthority,
        sweeper: Principal,
        implementation: Address,
        policy: WithdrawalPolicy,
    ) -> Result<Address> {
        self.vault_logic(implementation)?;
        let address = self.predict_address(deployer);
        let vault = VaultAccount::new(address, owner, sweeper, implementation, policy, self.now);
        Ok(self.install(deployer, Account::Vault(vault)))
    }

    pub fn deploy_actor(&mut self, deployer: Address, actor: Arc<dyn Actor>) -> Address {
        self.install(deployer, Account::Actor(actor))
    }

    pub fn wallet(&self, address: Address) -> Result<&SafeWallet> {
        match self.accounts.get(&address) {
            Some(Account::Wallet(wallet)) => Ok(wallet),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "wallet").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    pub fn factory(&self, address: Address) -> Result<&WalletFactory> {
        match self.accounts.get(&address) {
            Some(Account::Factory(factory)) => Ok(factory),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "wallet factory").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    pub fn registry(&self, address: Address) -> Result<&AccessGatedRegistry> {
        match self.accounts.get(&address) {
            Some(Account::Registry(registry)) => Ok(registry),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "registry").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    pub fn scheduler(&self, address: Address) -> Result<&Scheduler> {
        match self.accounts.get(&address) {
            Some(Account::Scheduler(scheduler)) => Ok(scheduler),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "scheduler").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    pub fn vault(&self, address: Address) -> Result<&VaultAccount> {
        match self.accounts.get(&address) {
            Some(Account::Vault(vault)) => Ok(vault),
            Some(_) => Err(DispatchError::WrongAccountKind(address, "vault").into()),
            None => Err(DispatchError::UnknownAccount(address).into()),
        }
    }

    pub fn vault_logic(&self, address: Address) -> Result<Arc<dyn VaultLogic>> {
        match self.accounts.get(&address) {
            Some(Account::VaultLogic(logic)) => Ok(Arc::clone(logic)),
            _ => Err(VaultError::UnknownImplementation(address).into()),
        }
    }

    fn is_template(&self, address: Address) -> bool {
        matches!(self.accounts.get(&address), Some(Account::WalletTemplate))
    }

    pub(crate) fn ensure_template(&self, address: Address) -> Result<()> {
        if self.is_template(address) {
            Ok(())
        } else {
            Err(WalletError::TemplateNotDeployed(address).into())
        }
    }

    /// Runs `f` as one all-or-nothing unit: any error restores the world as it was.
    pub fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut World) -> Result<T>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(out) => Ok(out),
            Err(err) => {
                *self = snapshot;
                tracing::debug!("[WORLD] reverted to snapshot: {}", err);
                Err(err)
            }
        }
    }

    /// Top-level transaction. Nested calls share its fate.
    pub fn transact(
        &mut self,
        caller: Principal,
        target: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<Bytes> {
        self.atomically(|world| world.call_at_depth(caller, target, value, payload, 0))
    }

    pub fn call(&mut self, caller: Principal, target: Address, payload: Bytes) -> Result<Bytes> {
        self.transact(caller, target, U256::ZERO, payload)
    }

    /// Nested call issued by the account handling `frame`.
    pub fn call_from_frame(
        &mut self,
        frame: &CallFrame,
        target: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<Bytes> {
        self.call_at_depth(frame.this, target, value, payload, frame.depth + 1)
    }
}
