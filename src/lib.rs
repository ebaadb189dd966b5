//! Custody simulator library surface.
//!
//! Models an access-gated payout registry and a timelock-governed vault on an in-process
//! account world, together with the two attacks that break their invariants when the
//! delegation check or the readiness check is weakened.

pub mod abi;
pub mod core;
pub mod error;
pub mod ledger;
pub mod protocols;
pub mod scenarios;
pub mod utils;
pub mod world;
