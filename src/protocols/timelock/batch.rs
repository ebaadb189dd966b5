use crate::error::{Result, SchedulerError};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolValue;

/// One call issued by the scheduler when a batch executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
}

impl Operation {
    pub fn call(target: Address, payload: Bytes) -> Self {
        Self {
            target,
            value: U256::ZERO,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub operations: Vec<Operation>,
    pub salt: B256,
}

impl Batch {
    pub fn new(operations: Vec<Operation>, salt: B256) -> Self {
        Self { operations, salt }
    }

    /// Rebuilds a batch from parallel call arrays, rejecting length mismatches.
    pub fn from_parts(
        targets: Vec<Address>,
        values: Vec<U256>,
        payloads: Vec<Bytes>,
        salt: B256,
    ) -> Result<Self> {
        if targets.len() != values.len() || targets.len() != payloads.len() {
            return Err(SchedulerError::MismatchedLengths {
                targets: targets.len(),
                values: values.len(),
                payloads: payloads.len(),
            }
            .into());
        }
        let operations = targets
            .into_iter()
            .zip(values)
            .zip(payloads)
            .map(|((target, value), payload)| Operation {
                target,
                value,
                payload,
            })
            .collect();
        Ok(Self { operations, salt })
    }

    pub fn to_parts(&self) -> (Vec<Address>, Vec<U256>, Vec<Bytes>, B256) {
        let targets = self.operations.iter().map(|op| op.target).collect();
        let values = self.operations.iter().map(|op| op.value).collect();
        let payloads = self.operations.iter().map(|op| op.payload.clone()).collect();
        (targets, values, payloads, self.salt)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Content key: keccak256 of the ABI-encoded (targets, values, payloads, salt).
    pub fn id(&self) -> B256 {
        keccak256(self.to_parts().abi_encode_params())
    }
}
