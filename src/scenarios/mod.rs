//! End-to-end attack demonstrations against a freshly assembled world.

pub mod backdoor;
pub mod timelock_takeover;

use crate::core::Principal;
use crate::error::{RejectionKind, SimError};
use crate::world::World;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploitStep {
    pub label: &'static str,
    pub caller: Principal,
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
}

impl ExploitStep {
    pub fn call(label: &'static str, caller: Principal, target: Address, payload: Bytes) -> Self {
        Self {
            label,
            caller,
            target,
            value: U256::ZERO,
            payload,
        }
    }
}

/// Steps run in order, each as its own transaction. The first failing step ends the plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExploitPlan {
    pub steps: Vec<ExploitStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRun {
    pub steps_run: usize,
    pub failure: Option<(&'static str, SimError)>,
}

impl ExploitPlan {
    pub fn new(steps: Vec<ExploitStep>) -> Self {
        Self { steps }
    }

    pub fn execute(&self, world: &mut World) -> PlanRun {
        for (idx, step) in self.steps.iter().enumerate() {
            match world.transact(step.caller, step.target, step.value, step.payload.clone()) {
                Ok(_) => tracing::debug!("[SCENARIO] step `{}` ok", step.label),
                Err(err) => {
                    tracing::info!("[SCENARIO] step `{}` rejected: {}", step.label, err);
                    return PlanRun {
                        steps_run: idx,
                        failure: Some((step.label, err)),
                    };
                }
            }
        }
        PlanRun {
            steps_run: self.steps.len(),
            failure: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Drained,
    Blocked,
}

/// Serializable summary. Amounts are decimal strings so 256-bit values survive JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub outcome: Outcome,
    pub steps_run: usize,
    pub steps_total: usize,
    pub attacker_gain: String,
    pub victim_loss: String,
    pub failed_step: Option<String>,
    pub rejection: Option<RejectionKind>,
    pub error: Option<String>,
}

impl ScenarioReport {
    pub(crate) fn from_run(
        scenario: &str,
        plan: &ExploitPlan,
        run: PlanRun,
        attacker_gain: U256,
        victim_loss: U256,
    ) -> Self {
        let outcome = if run.failure.is_none() && !attacker_gain.is_zero() {
            Outcome::Drained
        } else {
            Outcome::Blocked
        };
        let (failed_step, rejection, error) = match run.failure {
            Some((label, err)) => (
                Some(label.to_string()),
                Some(err.kind()),
                Some(err.to_string()),
            ),
            None => (None, None, None),
        };
        Self {
            scenario: scenario.to_string(),
            outcome,
            steps_run: run.steps_run,
            steps_total: plan.steps.len(),
            attacker_gain: attacker_gain.to_string(),
            victim_loss: victim_loss.to_string(),
            failed_step,
            rejection,
            error,
        }
    }

    pub fn drained(&self) -> bool {
        self.outcome == Outcome::Drained
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
