//! Call-data layouts for every simulated account, plus payload builders.
//!
//! Payloads follow Solidity ABI encoding (4-byte selector + arguments) so a batch can carry
//! calls to any account as opaque bytes and be hashed deterministically.

use crate::core::Role;
use crate::protocols::timelock::Batch;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

alloy::sol! {
    interface IToken {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address holder) external view returns (uint256);
    }

    interface IWallet {
        function setup(
            address[] calldata owners,
            uint256 threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;
        function enableModule(address module) external;
        function setFallbackHandler(address handler) external;
        function execTransactionFromModule(address to, uint256 value, bytes calldata data) external returns (bool);
        function execTransaction(address to, uint256 value, bytes calldata data) external returns (bool);
    }

    interface IWalletFactory {
        function createProxyWithCallback(
            address singleton,
            bytes calldata initializer,
            uint256 saltNonce,
            address callback
        ) external returns (address proxy);
    }

    interface IRegistry {
        function addBeneficiary(address beneficiary) external;
        function proxyCreated(address proxy, address singleton, bytes calldata initializer, uint256 saltNonce) external;
    }

    interface IScheduler {
        function schedule(address[] calldata targets, uint256[] calldata values, bytes[] calldata dataElements, bytes32 salt) external;
        function execute(address[] calldata targets, uint256[] calldata values, bytes[] calldata dataElements, bytes32 salt) external payable;
        function updateDelay(uint64 newDelay) external;
        function grantRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;
    }

    interface IVault {
        function withdraw(address recipient, uint256 amount) external;
        function sweepFunds() external;
        function upgradeTo(address newImplementation) external;
    }
}

pub fn selector_of(payload: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    if payload.len() >= 4 {
        out.copy_from_slice(&payload[..4]);
    }
    out
}

pub fn token_transfer(to: Address, amount: U256) -> Bytes {
    Bytes::from(IToken::transferCall { to, amount }.abi_encode())
}

pub fn token_balance_of(holder: Address) -> Bytes {
    Bytes::from(IToken::balanceOfCall { holder }.abi_encode())
}

/// Wallet initializer with no payment fields.
pub fn wallet_setup(
    owners: Vec<Address>,
    threshold: u64,
    to: Address,
    data: Bytes,
    fallback_handler: Address,
) -> Bytes {
    Bytes::from(
        IWallet::setupCall {
            owners,
            threshold: U256::from(threshold),
            to,
            data,
            fallbackHandler: fallback_handler,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        }
        .abi_encode(),
    )
}

pub fn wallet_enable_module(module: Address) -> Bytes {
    Bytes::from(IWallet::enableModuleCall { module }.abi_encode())
}

pub fn wallet_set_fallback_handler(handler: Address) -> Bytes {
    Bytes::from(IWallet::setFallbackHandlerCall { handler }.abi_encode())
}

pub fn wallet_exec_from_module(to: Address, value: U256, data: Bytes) -> Bytes {
    Bytes::from(IWallet::execTransactionFromModuleCall { to, value, data }.abi_encode())
}

pub fn wallet_exec(to: Address, value: U256, data: Bytes) -> Bytes {
    Bytes::from(IWallet::execTransactionCall { to, value, data }.abi_encode())
}

pub fn factory_create_with_callback(
    singleton: Address,
    initializer: Bytes,
    salt_nonce: U256,
    callback: Address,
) -> Bytes {
    Bytes::from(
        IWalletFactory::createProxyWithCallbackCall {
            singleton,
            initializer,
            saltNonce: salt_nonce,
            callback,
        }
        .abi_encode(),
    )
}

pub fn registry_add_beneficiary(beneficiary: Address) -> Bytes {
    Bytes::from(IRegistry::addBeneficiaryCall { beneficiary }.abi_encode())
}

pub fn registry_proxy_created(
    proxy: Address,
    singleton: Address,
    initializer: Bytes,
    salt_nonce: U256,
) -> Bytes {
    Bytes::from(
        IRegistry::proxyCreatedCall {
            proxy,
            singleton,
            initializer,
            saltNonce: salt_nonce,
        }
        .abi_encode(),
    )
}

pub fn scheduler_schedule(batch: &Batch) -> Bytes {
    let (targets, values, data_elements, salt) = batch.to_parts();
    Bytes::from(
        IScheduler::scheduleCall {
            targets,
            values,
            dataElements: data_elements,
            salt,
        }
        .abi_encode(),
    )
}

pub fn scheduler_execute(batch: &Batch) -> Bytes {
    let (targets, values, data_elements, salt) = batch.to_parts();
    Bytes::from(
        IScheduler::executeCall {
            targets,
            values,
            dataElements: data_elements,
            salt,
        }
        .abi_encode(),
    )
}

pub fn scheduler_update_delay(new_delay: u64) -> Bytes {
    Bytes::from(IScheduler::updateDelayCall { newDelay: new_delay }.abi_encode())
}

pub fn scheduler_grant_role(role: Role, account: Address) -> Bytes {
    Bytes::from(
        IScheduler::grantRoleCall {
            role: role.id(),
            account,
        }
        .abi_encode(),
    )
}

pub fn scheduler_revoke_role(role: Role, account: Address) -> Bytes {
    Bytes::from(
        IScheduler::revokeRoleCall {
            role: role.id(),
            account,
        }
        .abi_encode(),
    )
}

pub fn vault_withdraw(recipient: Address, amount: U256) -> Bytes {
    Bytes::from(IVault::withdrawCall { recipient, amount }.abi_encode())
}

pub fn vault_sweep_funds() -> Bytes {
    Bytes::from(IVault::sweepFundsCall {}.abi_encode())
}

pub fn vault_upgrade_to(new_implementation: Address) -> Bytes {
    Bytes::from(
        IVault::upgradeToCall {
            newImplementation: new_implementation,
        }
        .abi_encode(),
    )
}

/// Decodes the `fallbackHandler` argument declared in a wallet initializer.
pub fn declared_fallback_handler(initializer: &[u8]) -> Option<Address> {
    let decoded = IWallet::setupCall::abi_decode(initializer, true).ok()?;
    Some(decoded.fallbackHandler)
}

/// Right-aligned 32-byte word, the ABI return layout for scalar values.
pub fn encode_word(value: U256) -> Bytes {
    Bytes::from(B256::from(value.to_be_bytes::<32>()).to_vec())
}

pub fn encode_address(value: Address) -> Bytes {
    Bytes::from(value.into_word().to_vec())
}
