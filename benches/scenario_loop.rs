use custody_sim::scenarios::{backdoor, timelock_takeover};
use custody_sim::utils::config::SimConfig;
use std::time::Instant;

const PERF_BUDGET_MS: u128 = 250;
const BENCH_ROUNDS: usize = 7;
const SCENARIO_FANOUT: usize = 16;

fn median_ms(mut samples: Vec<u128>) -> u128 {
    if samples.is_empty() {
        return 0;
    }
    samples.sort_unstable();
    samples[samples.len() / 2]
}

fn run_single_round(configs: &[SimConfig]) -> Result<u128, String> {
    let started = Instant::now();
    for _ in 0..SCENARIO_FANOUT {
        for config in configs {
            backdoor::run(config).map_err(|err| format!("backdoor: {err:#}"))?;
            timelock_takeover::run(config).map_err(|err| format!("timelock: {err:#}"))?;
        }
    }
    Ok(started.elapsed().as_millis())
}

fn main() {
    let configs = [SimConfig::default(), SimConfig::vulnerable()];

    let mut rounds = Vec::with_capacity(BENCH_ROUNDS);
    for _ in 0..BENCH_ROUNDS {
        match run_single_round(&configs) {
            Ok(elapsed_ms) => rounds.push(elapsed_ms),
            Err(err) => {
                eprintln!("[BENCH][FAIL] scenario replay errored: {err}");
                std::process::exit(1);
            }
        }
    }

    let median = median_ms(rounds.clone());
    println!(
        "[BENCH] scenario_loop rounds_ms={:?} median_ms={} budget_ms={}",
        rounds, median, PERF_BUDGET_MS
    );

    if median > PERF_BUDGET_MS {
        eprintln!(
            "[BENCH][FAIL] scenario loop median {}ms exceeded {}ms budget",
            median, PERF_BUDGET_MS
        );
        std::process::exit(1);
    }

    println!(
        "[BENCH][PASS] scenario loop median {}ms within {}ms budget",
        median, PERF_BUDGET_MS
    );
}
