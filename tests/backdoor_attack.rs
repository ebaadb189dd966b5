
use alloy::primitives::{Address, Bytes, U256};
use custody_sim::abi;
use custody_sim::error::RejectionKind;
use custody_sim::protocols::registry::DelegationCheck;
use custody_sim::scenarios::{backdoor, Outcome, ScenarioReport};
use custody_sim::utils::config::SimConfig;
use sim_utils::{RegistryFixture, ALICE, MALLORY};

fn module_backdoor(fx: &RegistryFixture, module: Address) -> Bytes {
    abi::wallet_setup(
        vec![ALICE],
        1,
        fx.template,
        abi::wallet_enable_module(module),
        Address::ZERO,
    )
}

#[test]
fn test_module_installed_during_setup_is_caught_in_final_state() {
    let mut fx = RegistryFixture::new(DelegationCheck::FinalState, &[ALICE]);
    let before = fx.world.ledger().clone();
    let init = module_backdoor(&fx, MALLORY);

    let err = fx.create_wallet(MALLORY, init.clone(), 0).unwrap_err();
    assert_eq!(err.kind(), RejectionKind::UnauthorizedDelegation);
    assert_eq!(fx.world.ledger(), &before);
    assert!(fx.world.wallet(fx.predict_wallet(&init, 0)).is_err());
}

#[test]
fn test_fallback_handler_set_by_nested_setup_call_is_caught() {
    let mut fx = RegistryFixture::new(DelegationCheck::FinalState, &[ALICE]);
    let init = abi::wallet_setup(
        vec![ALICE],
        1,
        fx.template,
        abi::wallet_set_fallback_handler(MALLORY),
        Address::ZERO,
    );
    let err = fx.create_wallet(MALLORY, init, 0).unwrap_err();
    assert_eq!(err.kind(), RejectionKind::UnauthorizedDelegation);
}

#[test]
fn test_declared_only_check_sees_only_initializer_argument() {
    let mut fx = RegistryFixture::new(DelegationCheck::DeclaredOnly, &[ALICE]);
    let declared = abi::wallet_setup(vec![ALICE], 1, Address::ZERO, Bytes::new(), MALLORY);
    let err = fx.create_wallet(MALLORY, declared, 0).unwrap_err();
    assert_eq!(err.kind(), RejectionKind::UnauthorizedDelegation);

    // The same hook smuggled in through the setup sub-call slips past.
    let init = module_backdoor(&fx, MALLORY);
    let wallet = fx.create_wallet(MALLORY, init, 1).unwrap();
    assert!(fx.world.wallet(wallet).unwrap().is_module(MALLORY));
    assert_eq!(fx.world.balance_of(wallet), fx.payout);
}

#[test]
fn test_installed_module_drains_registered_wallet() {
    let mut fx = RegistryFixture::new(DelegationCheck::Disabled, &[ALICE]);
    let wallet = fx
        .create_wallet(MALLORY, module_backdoor(&fx, MALLORY), 0)
        .unwrap();
    let token = fx.world.token();

    // Owner-issued transactions stay with the owner; the module path does not.
    let steal = abi::wallet_exec(token, U256::ZERO, abi::token_transfer(MALLORY, fx.payout));
    let err = fx.world.call(MALLORY, wallet, steal).unwrap_err();
    assert_eq!(err.kind(), RejectionKind::Unauthorized);

    let steal = abi::wallet_exec_from_module(
        token,
        U256::ZERO,
        abi::token_transfer(MALLORY, fx.payout),
    );
    fx.world.call(MALLORY, wallet, steal).unwrap();
    assert_eq!(fx.world.balance_of(MALLORY), fx.payout);
    assert!(fx.world.balance_of(wallet).is_zero());
}

#[test]
fn test_owner_can_spend_payout_of_clean_wallet() {
    let mut fx = RegistryFixture::new(DelegationCheck::FinalState, &[ALICE]);
    let wallet = fx
        .create_wallet(ALICE, sim_utils::plain_initializer(vec![ALICE], 1), 0)
        .unwrap();
    let token = fx.world.token();
    let spend = abi::wallet_exec(token, U256::ZERO, abi::token_transfer(ALICE, fx.payout));
    fx.world.call(ALICE, wallet, spend).unwrap();
    assert_eq!(fx.world.balance_of(ALICE), fx.payout);
}

#[test]
fn test_scenario_outcome_per_delegation_check() {
    let cases = [
        (DelegationCheck::FinalState, Outcome::Blocked),
        (DelegationCheck::DeclaredOnly, Outcome::Drained),
        (DelegationCheck::Disabled, Outcome::Drained),
    ];
    for (check, expected) in cases {
        let config = SimConfig {
            delegation_check: check,
            ..SimConfig::default()
        };
        let report = backdoor::run(&config).unwrap();
        assert_eq!(report.outcome, expected, "check={}", check.as_str());
        assert_eq!(report.attacker_gain, report.victim_loss);
    }
}

#[test]
fn test_vulnerable_report_serializes_amounts_as_strings() {
    let report = backdoor::run(&SimConfig::vulnerable()).unwrap();
    let json = report.to_json().unwrap();
    let parsed: ScenarioReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["outcome"], "drained");
    assert_eq!(value["attacker_gain"], "40000000000000000000");
    assert!(value["rejection"].is_null());
}
