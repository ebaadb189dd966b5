use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("scheduler: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("vault: {0}")]
    Vault(#[from] VaultError),
    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry balance {balance} below payout {payout}")]
    InsufficientFunds { balance: U256, payout: U256 },
    #[error("wallet created by {actual:#x}, expected factory {expected:#x}")]
    UnauthorizedFactory { expected: Address, actual: Address },
    #[error("wallet template {actual:#x} is not the trusted template {expected:#x}")]
    UntrustedTemplate { expected: Address, actual: Address },
    #[error("initializer does not start with the setup selector")]
    MalformedInitializer,
    #[error("threshold {0} must be 1")]
    InvalidThreshold(U256),
    #[error("owner count {0} must be 1")]
    InvalidOwnerCount(usize),
    #[error("{0:#x} is not a beneficiary")]
    NotABeneficiary(Address),
    #[error("wallet installed delegation hook {0:#x}")]
    UnauthorizedDelegation(Address),
    #[error("{0:#x} is not the registry administrator")]
    Unauthorized(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("batch {id} is not ready for execution")]
    NotYetReady { id: B256 },
    #[error("batch {id} was already executed")]
    AlreadyExecuted { id: B256 },
    #[error("batch has no operations")]
    EmptyBatch,
    #[error("batch arrays disagree: targets={targets} values={values} payloads={payloads}")]
    MismatchedLengths {
        targets: usize,
        values: usize,
        payloads: usize,
    },
    #[error("delay {requested}s above maximum {max}s")]
    DelayAboveMax { requested: u64, max: u64 },
    #[error("unknown role id {0}")]
    UnknownRole(B256),
    #[error("{caller:#x} lacks the required authority: {reason}")]
    Unauthorized { caller: Address, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("withdrawal {amount} exceeds limit {limit}")]
    ExceedsWithdrawalLimit { amount: U256, limit: U256 },
    #[error("cooldown active until {ready_after}, now {now}")]
    CooldownActive { now: u64, ready_after: u64 },
    #[error("implementation {0:#x} is not a deployed vault logic")]
    UnknownImplementation(Address),
    #[error("{0:#x} is not authorized for this vault operation")]
    Unauthorized(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet already initialized")]
    AlreadyInitialized,
    #[error("owner list is empty")]
    NoOwners,
    #[error("owner {0:#x} is zero or duplicated")]
    InvalidOwner(Address),
    #[error("threshold {threshold} outside 1..={owners}")]
    ThresholdOutOfRange { threshold: U256, owners: usize },
    #[error("template {0:#x} is not deployed")]
    TemplateNotDeployed(Address),
    #[error("wallet {0:#x} already exists")]
    AddressCollision(Address),
    #[error("{0:#x} may not perform this wallet action")]
    Unauthorized(Address),
    #[error("no handler for selector {0:?}")]
    UnknownSelector([u8; 4]),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{holder:#x} holds {balance}, cannot move {amount}")]
    InsufficientBalance {
        holder: Address,
        balance: U256,
        amount: U256,
    },
    #[error("balance overflow crediting {0:#x}")]
    Overflow(Address),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no account at {0:#x}")]
    UnknownAccount(Address),
    #[error("{0:#x} is not a {1}")]
    WrongAccountKind(Address, &'static str),
    #[error("payload for {target:#x} could not be decoded: {reason}")]
    Decode { target: Address, reason: String },
    #[error("call depth limit {0} reached")]
    DepthExceeded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Flat rejection taxonomy shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RejectionKind {
    InsufficientFunds,
    UnauthorizedFactory,
    UntrustedTemplate,
    MalformedInitializer,
    InvalidThreshold,
    InvalidOwnerCount,
    NotABeneficiary,
    UnauthorizedDelegation,
    NotYetReady,
    ExceedsWithdrawalLimit,
    CooldownActive,
    Unauthorized,
    Other,
}

impl SimError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::Registry(err) => match err {
                RegistryError::InsufficientFunds { .. } => RejectionKind::InsufficientFunds,
                RegistryError::UnauthorizedFactory { .. } => RejectionKind::UnauthorizedFactory,
                RegistryError::UntrustedTemplate { .. } => RejectionKind::UntrustedTemplate,
                RegistryError::MalformedInitializer => RejectionKind::MalformedInitializer,
                RegistryError::InvalidThreshold(_) => RejectionKind::InvalidThreshold,
                RegistryError::InvalidOwnerCount(_) => RejectionKind::InvalidOwnerCount,
                RegistryError::NotABeneficiary(_) => RejectionKind::NotABeneficiary,
                RegistryError::UnauthorizedDelegation(_) => RejectionKind::UnauthorizedDelegation,
                RegistryError::Unauthorized(_) => RejectionKind::Unauthorized,
            },
            Self::Scheduler(SchedulerError::NotYetReady { .. }) => RejectionKind::NotYetReady,
            Self::Scheduler(SchedulerError::Unauthorized { .. }) => RejectionKind::Unauthorized,
            Self::Vault(VaultError::ExceedsWithdrawalLimit { .. }) => {
                RejectionKind::ExceedsWithdrawalLimit
            }
            Self::Vault(VaultError::CooldownActive { .. }) => RejectionKind::CooldownActive,
            Self::Vault(VaultError::Unauthorized(_)) => RejectionKind::Unauthorized,
            Self::Wallet(WalletError::Unauthorized(_)) => RejectionKind::Unauthorized,
            _ => RejectionKind::Other,
        }
    }
}
