pub mod registry;
pub mod timelock;
pub mod vault;
pub mod wallet;
