//! Role-gated, delay-enforced batch scheduler.
//!
//! A batch moves `Proposed -> Ready -> Executed`. Readiness is checked exactly once per
//! `execute`, never per operation, so operations later in a batch observe the effects of earlier
//! ones (a zeroed delay, a fresh role grant, a new schedule). That ordering is the behavior under
//! study and is kept as-is; see [`ReadinessCheck`].

pub mod batch;
pub mod roles;

pub use batch::{Batch, Operation};
pub use roles::{RoleStore, RoleTable};

use crate::core::{Principal, Role, Timestamp};
use crate::error::{Result, SchedulerError};
use alloy::primitives::{Address, B256};
use std::collections::BTreeMap;

/// Where the single readiness check of `execute` happens.
///
/// Hazard: both variants check once and then run every operation against live state.
/// `AfterOperations` additionally lets an unscheduled batch schedule itself before the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessCheck {
    BeforeOperations,
    AfterOperations,
}

impl ReadinessCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeOperations => "before_operations",
            Self::AfterOperations => "after_operations",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "before_operations" | "before" => Some(Self::BeforeOperations),
            "after_operations" | "after" => Some(Self::AfterOperations),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Never scheduled.
    Invalid,
    Proposed,
    Ready,
    Executed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledBatch {
    pub proposed_at: Timestamp,
    pub ready_at: Timestamp,
    pub executed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    address: Address,
    delay: u64,
    max_delay: u64,
    readiness: ReadinessCheck,
    roles: RoleTable,
    operations: BTreeMap<B256, ScheduledBatch>,
}

impl Scheduler {
    /// The scheduler administers itself; `proposer` is the only initial proposer.
    pub fn new(
        address: Address,
        proposer: Principal,
        delay: u64,
        max_delay: u64,
        readiness: ReadinessCheck,
    ) -> Result<Self> {
        if delay > max_delay {
            return Err(SchedulerError::DelayAboveMax {
                requested: delay,
                max: max_delay,
            }
            .into());
        }
        let mut roles = RoleTable::new();
        roles.grant_role(Role::Admin, address);
        roles.grant_role(Role::Proposer, proposer);
        Ok(Self {
            address,
            delay,
            max_delay,
            readiness,
            roles,
            operations: BTreeMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn readiness(&self) -> ReadinessCheck {
        self.readiness
    }

    pub fn has_role(&self, principal: Principal, role: Role) -> bool {
        self.roles.has_role(principal, role)
    }

    pub fn scheduled(&self, id: B256) -> Option<&ScheduledBatch> {
        self.operations.get(&id)
    }

    pub fn operation_state(&self, id: B256, now: Timestamp) -> OperationState {
        match self.operations.get(&id) {
            None => OperationState::Invalid,
            Some(op) if op.executed => OperationState::Executed,
            Some(op) if now >= op.ready_at => OperationState::Ready,
            Some(_) => OperationState::Proposed,
        }
    }

    /// Registers `batch` with `ready_at = now + delay`, using the delay in effect right now.
    /// Known content is left untouched and its id returned.
    pub fn propose(&mut self, caller: Principal, batch: &Batch, now: Timestamp) -> Result<B256> {
        if !self.roles.has_role(caller, Role::Proposer) {
            return Err(SchedulerError::Unauthorized {
                caller,
                reason: "missing proposer role",
            }
            .into());
        }
        if batch.is_empty() {
            return Err(SchedulerError::EmptyBatch.into());
        }
        let id = batch.id();
        if self.operations.contains_key(&id) {
            tracing::debug!("[TIMELOCK] batch {} already known; proposal is a no-op", id);
            return Ok(id);
        }
        let ready_at = now.saturating_add(self.delay);
        self.operations.insert(
            id,
            ScheduledBatch {
                proposed_at: now,
                ready_at,
                executed: false,
            },
        );
        tracing::info!(
            "[TIMELOCK] scheduled batch {} ops={} proposer={:#x} ready_at={}",
            id,
            batch.len(),
            caller,
            ready_at
        );
        Ok(id)
    }

    fn require_ready(&self, id: B256, now: Timestamp) -> Result<()> {
        match self.operation_state(id, now) {
            OperationState::Ready => Ok(()),
            OperationState::Executed => Err(SchedulerError::AlreadyExecuted { id }.into()),
            OperationState::Invalid | OperationState::Proposed => {
                Err(SchedulerError::NotYetReady { id }.into())
            }
        }
    }

    fn mark_executed(&mut self, id: B256) {
        if let Some(op) = self.operations.get_mut(&id) {
            op.executed = true;
        }
    }

    /// First half of `execute`. Under `BeforeOperations` this is the one readiness check and the
    /// batch is consumed here, so a reentrant execute of the same batch fails.
    pub fn begin_execution(&mut self, batch: &Batch, now: Timestamp) -> Result<B256> {
        if batch.is_empty() {
            return Err(SchedulerError::EmptyBatch.into());
        }
        let id = batch.id();
        if self.readiness == ReadinessCheck::BeforeOperations {
            self.require_ready(id, now)?;
            self.mark_executed(id);
        }
        Ok(id)
    }

    /// Second half of `execute`, after every operation ran. Under `AfterOperations` this is the
    /// one readiness check, evaluated against whatever the operations left behind.
    pub fn finish_execution(&mut self, id: B256, now: Timestamp) -> Result<()> {
        if self.readiness == ReadinessCheck::AfterOperations {
            self.require_ready(id, now)?;
            self.mark_executed(id);
        }
        tracing::info!("[TIMELOCK] executed batch {} at {}", id, now);
        Ok(())
    }

    /// Only the scheduler itself, i.e. an executed batch, may change the delay.
    pub fn update_delay(&mut self, caller: Principal, new_delay: u64) -> Result<()> {
        if caller != self.address {
            return Err(SchedulerError::Unauthorized {
                caller,
                reason: "delay changes must come from the scheduler",
            }
            .into());
        }
        if new_delay > self.max_delay {
            return Err(SchedulerError::DelayAboveMax {
                requested: new_delay,
                max: self.max_delay,
            }
            .into());
        }
        tracing::info!("[TIMELOCK] delay {}s -> {}s", self.delay, new_delay);
        self.delay = new_delay;
        Ok(())
    }

    pub fn grant_role(&mut self, caller: Principal, role: Role, account: Principal) -> Result<()> {
        self.require_admin(caller, role)?;
        if self.roles.grant_role(role, account) {
            tracing::info!("[TIMELOCK] granted {} to {:#x}", role.as_str(), account);
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: Principal, role: Role, account: Principal) -> Result<()> {
        self.require_admin(caller, role)?;
        if self.roles.revoke_role(role, account) {
            tracing::info!("[TIMELOCK] revoked {} from {:#x}", role.as_str(), account);
        }
        Ok(())
    }

    fn require_admin(&self, caller: Principal, role: Role) -> Result<()> {
        if self.roles.has_role(caller, RoleTable::admin_of(role)) {
            Ok(())
        } else {
            Err(SchedulerError::Unauthorized {
                caller,
                reason: "missing admin role",
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use alloy::primitives::Bytes;

    const SELF_ADDR: Address = Address::repeat_byte(0x71);
    const PROPOSER: Address = Address::repeat_byte(0x72);
    const STRANGER: Address = Address::repeat_byte(0x73);

    fn scheduler(readiness: ReadinessCheck) -> Scheduler {
        Scheduler::new(SELF_ADDR, PROPOSER, 3_600, 14 * 86_400, readiness).unwrap()
    }

    fn batch(tag: u8) -> Batch {
        Batch::new(
            vec![Operation::call(
                Address::repeat_byte(tag),
                Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            )],
            B256::ZERO,
        )
    }

    #[test]
    fn test_schedule_requires_proposer() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        let err = s.propose(STRANGER, &batch(1), 0).unwrap_err();
        assert!(matches!(
            err,
            SimError::Scheduler(SchedulerError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_state_transitions_with_time() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        let b = batch(1);
        let id = s.propose(PROPOSER, &b, 100).unwrap();
        assert_eq!(s.operation_state(id, 100), OperationState::Proposed);
        assert_eq!(s.operation_state(id, 3_699), OperationState::Proposed);
        assert_eq!(s.operation_state(id, 3_700), OperationState::Ready);

        let err = s.begin_execution(&b, 3_699).unwrap_err();
        assert!(matches!(
            err,
            SimError::Scheduler(SchedulerError::NotYetReady { .. })
        ));
        assert_eq!(s.operation_state(id, 3_700), OperationState::Ready);

        s.begin_execution(&b, 3_700).unwrap();
        s.finish_execution(id, 3_700).unwrap();
        assert_eq!(s.operation_state(id, 3_700), OperationState::Executed);

        let err = s.begin_execution(&b, 9_999).unwrap_err();
        assert!(matches!(
            err,
            SimError::Scheduler(SchedulerError::AlreadyExecuted { .. })
        ));
    }

    #[test]
    fn test_rescheduling_known_content_changes_nothing() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        let b = batch(2);
        let id = s.propose(PROPOSER, &b, 0).unwrap();
        let first = *s.scheduled(id).unwrap();
        assert_eq!(s.propose(PROPOSER, &b, 500).unwrap(), id);
        assert_eq!(*s.scheduled(id).unwrap(), first);
    }

    #[test]
    fn test_unscheduled_batch_is_not_ready() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        let b = batch(3);
        assert_eq!(s.operation_state(b.id(), 0), OperationState::Invalid);
        assert!(s.begin_execution(&b, 10_000).is_err());
    }

    #[test]
    fn test_after_operations_defers_the_check() {
        let mut s = scheduler(ReadinessCheck::AfterOperations);
        assert_eq!(s.readiness(), ReadinessCheck::AfterOperations);
        let b = batch(4);
        let id = s.begin_execution(&b, 0).unwrap();
        assert!(s.finish_execution(id, 0).is_err());
    }

    #[test]
    fn test_update_delay_only_from_self_and_bounded() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        assert!(s.update_delay(PROPOSER, 0).is_err());
        let err = s.update_delay(SELF_ADDR, 15 * 86_400).unwrap_err();
        assert!(matches!(
            err,
            SimError::Scheduler(SchedulerError::DelayAboveMax { .. })
        ));
        s.update_delay(SELF_ADDR, 0).unwrap();
        assert_eq!(s.delay(), 0);
    }

    #[test]
    fn test_role_grants_require_admin() {
        let mut s = scheduler(ReadinessCheck::BeforeOperations);
        assert!(s.grant_role(PROPOSER, Role::Proposer, STRANGER).is_err());
        s.grant_role(SELF_ADDR, Role::Proposer, STRANGER).unwrap();
        assert!(s.has_role(STRANGER, Role::Proposer));
        s.revoke_role(SELF_ADDR, Role::Proposer, STRANGER).unwrap();
        assert!(!s.has_role(STRANGER, Role::Proposer));
    }

    #[test]
    fn test_readiness_check_parse() {
        assert_eq!(
            ReadinessCheck::parse(" After "),
            Some(ReadinessCheck::AfterOperations)
        );
        assert_eq!(ReadinessCheck::parse("never"), None);
    }
}
