use crate::error::{ConfigError, Result};
use crate::protocols::registry::DelegationCheck;
use crate::protocols::timelock::ReadinessCheck;
use crate::utils::constants::{
    DEFAULT_PAYOUT_AMOUNT, DEFAULT_TIMELOCK_DELAY_SECS, DEFAULT_WITHDRAWAL_COOLDOWN_SECS,
    DEFAULT_WITHDRAWAL_LIMIT, MAX_TIMELOCK_DELAY_SECS,
};
use alloy::primitives::U256;
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub payout_amount: U256,
    pub timelock_delay_secs: u64,
    pub max_timelock_delay_secs: u64,
    pub withdrawal_limit: U256,
    pub withdrawal_cooldown_secs: u64,
    pub delegation_check: DelegationCheck,
    pub readiness_check: ReadinessCheck,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            payout_amount: DEFAULT_PAYOUT_AMOUNT,
            timelock_delay_secs: DEFAULT_TIMELOCK_DELAY_SECS,
            max_timelock_delay_secs: MAX_TIMELOCK_DELAY_SECS,
            withdrawal_limit: DEFAULT_WITHDRAWAL_LIMIT,
            withdrawal_cooldown_secs: DEFAULT_WITHDRAWAL_COOLDOWN_SECS,
            delegation_check: DelegationCheck::FinalState,
            readiness_check: ReadinessCheck::BeforeOperations,
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_u256(name: &str, raw: &str) -> Result<U256> {
    raw.parse::<U256>().map_err(|e| {
        ConfigError::Invalid(format!("{name} must be an unsigned integer, got `{raw}`: {e}")).into()
    })
}

fn parse_u64(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!("{name} must be a valid u64, got `{raw}`")).into()
    })
}

impl SimConfig {
    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup("SIM_PAYOUT_AMOUNT")) {
            config.payout_amount = parse_u256("SIM_PAYOUT_AMOUNT", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("SIM_TIMELOCK_DELAY_SECS")) {
            config.timelock_delay_secs = parse_u64("SIM_TIMELOCK_DELAY_SECS", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("SIM_WITHDRAWAL_LIMIT")) {
            config.withdrawal_limit = parse_u256("SIM_WITHDRAWAL_LIMIT", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("SIM_WITHDRAWAL_COOLDOWN_SECS")) {
            config.withdrawal_cooldown_secs = parse_u64("SIM_WITHDRAWAL_COOLDOWN_SECS", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("SIM_DELEGATION_CHECK")) {
            config.delegation_check = DelegationCheck::parse(&raw).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "SIM_DELEGATION_CHECK must be one of final_state|declared_only|disabled, got `{raw}`"
                ))
            })?;
        }
        if let Some(raw) = non_empty(lookup("SIM_READINESS_CHECK")) {
            config.readiness_check = ReadinessCheck::parse(&raw).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "SIM_READINESS_CHECK must be one of before_operations|after_operations, got `{raw}`"
                ))
            })?;
        }

        config.validate()?;
        tracing::debug!(
            "[CONFIG] payout={} delay={}s limit={} cooldown={}s delegation_check={} readiness_check={}",
            config.payout_amount,
            config.timelock_delay_secs,
            config.withdrawal_limit,
            config.withdrawal_cooldown_secs,
            config.delegation_check.as_str(),
            config.readiness_check.as_str()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timelock_delay_secs > self.max_timelock_delay_secs {
            return Err(ConfigError::Invalid(format!(
                "timelock delay {}s exceeds maximum {}s",
                self.timelock_delay_secs, self.max_timelock_delay_secs
            ))
            .into());
        }
        if self.payout_amount.is_zero() {
            return Err(ConfigError::Invalid("payout amount must be non-zero".to_string()).into());
        }
        Ok(())
    }

    /// Preset reproducing the vulnerable deployments: no delegation hook check and the
    /// readiness check deferred until after the batch ran.
    pub fn vulnerable() -> Self {
        Self {
            delegation_check: DelegationCheck::Disabled,
            readiness_check: ReadinessCheck::AfterOperations,
            ..Self::default()
        }
    }
}
