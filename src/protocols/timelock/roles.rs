use crate::core::{Principal, Role};
use std::collections::{BTreeMap, BTreeSet};

/// Role membership consulted by the scheduler.
pub trait RoleStore {
    fn has_role(&self, principal: Principal, role: Role) -> bool;
    /// Returns `true` when the grant changed membership.
    fn grant_role(&mut self, role: Role, principal: Principal) -> bool;
    fn revoke_role(&mut self, role: Role, principal: Principal) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    members: BTreeMap<Role, BTreeSet<Principal>>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self, role: Role) -> impl Iterator<Item = &Principal> {
        self.members.get(&role).into_iter().flatten()
    }

    /// Every role administers itself and the other role through `Admin`.
    pub fn admin_of(_role: Role) -> Role {
        Role::Admin
    }
}

impl RoleStore for RoleTable {
    fn has_role(&self, principal: Principal, role: Role) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(&principal))
    }

    fn grant_role(&mut self, role: Role, principal: Principal) -> bool {
        self.members.entry(role).or_default().insert(principal)
    }

    fn revoke_role(&mut self, role: Role, principal: Principal) -> bool {
        self.members
            .get_mut(&role)
            .is_some_and(|set| set.remove(&principal))
    }
}
