//! Scripted accounts that stand in for attacker contracts.

use super::World;
use crate::abi;
use crate::core::Principal;
use crate::error::Result;
use crate::protocols::timelock::Batch;
use alloy::primitives::{Address, Bytes, U256};
use std::fmt::Debug;

/// The call an actor is currently handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub this: Address,
    pub caller: Principal,
    pub value: U256,
    pub payload: Bytes,
    pub depth: usize,
}

pub trait Actor: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Runs when any call reaches the actor. Nested calls go through
    /// [`World::call_from_frame`] so depth and caller identity stay consistent.
    fn on_call(&self, world: &mut World, frame: &CallFrame) -> Result<Bytes>;
}

/// Schedules a stored batch on `scheduler`, calling as itself.
///
/// Placed as the last operation of that very batch, it makes an unscheduled batch schedule
/// itself mid-execution, once earlier operations have granted it the proposer role and zeroed
/// the delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRelay {
    scheduler: Address,
    batch: Batch,
}

impl ScheduleRelay {
    pub fn new(scheduler: Address, batch: Batch) -> Self {
        Self { scheduler, batch }
    }
}

impl Actor for ScheduleRelay {
    fn name(&self) -> &str {
        "schedule_relay"
    }

    fn on_call(&self, world: &mut World, frame: &CallFrame) -> Result<Bytes> {
        tracing::debug!(
            "[WORLD] relay {:#x} scheduling batch {} on {:#x}",
            frame.this,
            self.batch.id(),
            self.scheduler
        );
        world.call_from_frame(
            frame,
            self.scheduler,
            U256::ZERO,
            abi::scheduler_schedule(&self.batch),
        )
    }
}

/// Replays a fixed list of calls as itself, inside whatever transaction reached it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallSequence {
    calls: Vec<(Address, U256, Bytes)>,
}

impl CallSequence {
    pub fn new(calls: Vec<(Address, U256, Bytes)>) -> Self {
        Self { calls }
    }
}

impl Actor for CallSequence {
    fn name(&self) -> &str {
        "call_sequence"
    }

    fn on_call(&self, world: &mut World, frame: &CallFrame) -> Result<Bytes> {
        let mut last = Bytes::new();
        for (target, value, payload) in &self.calls {
            last = world.call_from_frame(frame, *target, *value, payload.clone())?;
        }
        Ok(last)
    }
}
