//! Shared vocabulary for the simulated accounts.

use alloy::primitives::{keccak256, Address, B256, U256};

/// Opaque account identity.
pub type Principal = Address;
pub type Amount = U256;
/// Seconds on the simulated clock.
pub type Timestamp = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    Proposer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Proposer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN_ROLE",
            Self::Proposer => "PROPOSER_ROLE",
        }
    }

    /// Role identifier used in call payloads.
    pub fn id(self) -> B256 {
        keccak256(self.as_str().as_bytes())
    }

    pub fn from_id(id: B256) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ids_round_trip_and_differ() {
        assert_ne!(Role::Admin.id(), Role::Proposer.id());
        assert_eq!(Role::from_id(Role::Proposer.id()), Some(Role::Proposer));
        assert_eq!(Role::from_id(B256::ZERO), None);
    }
}
