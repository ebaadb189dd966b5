use alloy::primitives::U256;

/// Standard WAD (10^18)
pub const WAD_U256: U256 = U256::from_limbs([1000000000000000000, 0, 0, 0]);

/// Registry payout per beneficiary (10 tokens).
pub const DEFAULT_PAYOUT_AMOUNT: U256 = U256::from_limbs([10000000000000000000, 0, 0, 0]);

/// Expected wallet shape for a registration.
pub const EXPECTED_OWNERS_COUNT: usize = 1;
pub const EXPECTED_THRESHOLD: u64 = 1;

pub const HOUR_SECS: u64 = 3_600;
pub const DAY_SECS: u64 = 86_400;

/// Scheduler delay at deployment and its ceiling.
pub const DEFAULT_TIMELOCK_DELAY_SECS: u64 = HOUR_SECS;
pub const MAX_TIMELOCK_DELAY_SECS: u64 = 14 * DAY_SECS;

/// Vault withdrawal window: 1 token every 15 days.
pub const DEFAULT_WITHDRAWAL_LIMIT: U256 = WAD_U256;
pub const DEFAULT_WITHDRAWAL_COOLDOWN_SECS: u64 = 15 * DAY_SECS;

/// Nested call ceiling for one transaction.
pub const MAX_CALL_DEPTH: usize = 64;
