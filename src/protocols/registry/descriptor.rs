use crate::core::Principal;
use alloy::primitives::{Address, Bytes, U256};

/// Snapshot of a freshly created wallet as seen by the registry.
///
/// Shape fields come from the wallet's state after setup finished, not from the initializer,
/// because setup may run arbitrary sub-calls. `initializer` keeps the literal bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub wallet: Address,
    pub owners: Vec<Principal>,
    pub threshold: U256,
    pub template: Address,
    pub initializer: Bytes,
    pub delegation_hook: Option<Address>,
}

impl WalletDescriptor {
    pub fn sole_owner(&self) -> Option<Principal> {
        match self.owners.as_slice() {
            [owner] => Some(*owner),
            _ => None,
        }
    }
}
