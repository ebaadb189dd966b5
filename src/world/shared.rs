use super::World;
use crate::core::Principal;
use crate::error::Result;
use alloy::primitives::{Address, Bytes, U256};
use std::sync::{Arc, Mutex, MutexGuard};

/// A world shared across threads. Every transaction runs under the one lock, so calls touching
/// the same ledger are serialized.
#[derive(Debug, Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    pub fn lock(&self, label: &str) -> MutexGuard<'_, World> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(
                    "[WORLD] world lock poisoned in {}; recovering last committed state.",
                    label
                );
                poisoned.into_inner()
            }
        }
    }

    pub fn transact(
        &self,
        caller: Principal,
        target: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<Bytes> {
        self.lock("SharedWorld::transact")
            .transact(caller, target, value, payload)
    }

    pub fn read<T>(&self, f: impl FnOnce(&World) -> T) -> T {
        f(&self.lock("SharedWorld::read"))
    }

    pub fn warp(&self, secs: u64) {
        self.lock("SharedWorld::warp").warp(secs);
    }
}
