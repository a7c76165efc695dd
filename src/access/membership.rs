//! Group membership provider.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::types::{GroupId, UserId};

/// Many-to-many user/group membership, owned by an external identity system.
///
/// Membership is single-level: groups never contain other groups.
pub trait GroupMembership: Send + Sync + Debug {
    fn groups_of(&self, user: UserId) -> Result<BTreeSet<GroupId>, StoreError>;

    fn members_of(&self, group: GroupId) -> Result<BTreeSet<UserId>, StoreError>;
}

#[derive(Debug, Default)]
struct MembershipMaps {
    groups_by_user: BTreeMap<UserId, BTreeSet<GroupId>>,
    users_by_group: BTreeMap<GroupId, BTreeSet<UserId>>,
}

/// Thread-safe in-memory membership, indexed in both directions.
#[derive(Debug, Default)]
pub struct InMemoryMembership {
    maps: RwLock<MembershipMaps>,
}

impl InMemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user` to `group`. Returns `false` if already a member.
    pub fn add_member(&self, group: GroupId, user: UserId) -> Result<bool, StoreError> {
        let mut maps = self.maps.write().map_err(|e| poisoned("add_member", e))?;
        let added = maps.groups_by_user.entry(user).or_default().insert(group);
        maps.users_by_group.entry(group).or_default().insert(user);
        Ok(added)
    }

    /// Removes `user` from `group`. Returns `false` if not a member.
    pub fn remove_member(&self, group: GroupId, user: UserId) -> Result<bool, StoreError> {
        let mut maps = self.maps.write().map_err(|e| poisoned("remove_member", e))?;
        let removed = match maps.groups_by_user.get_mut(&user) {
            Some(groups) => groups.remove(&group),
            None => false,
        };
        if let Some(users) = maps.users_by_group.get_mut(&group) {
            users.remove(&user);
        }
        Ok(removed)
    }
}

impl GroupMembership for InMemoryMembership {
    fn groups_of(&self, user: UserId) -> Result<BTreeSet<GroupId>, StoreError> {
        let maps = self.maps.read().map_err(|e| poisoned("groups_of", e))?;
        Ok(maps.groups_by_user.get(&user).cloned().unwrap_or_default())
    }

    fn members_of(&self, group: GroupId) -> Result<BTreeSet<UserId>, StoreError> {
        let maps = self.maps.read().map_err(|e| poisoned("members_of", e))?;
        Ok(maps.users_by_group.get(&group).cloned().unwrap_or_default())
    }
}

fn poisoned(op: &str, err: impl std::fmt::Display) -> StoreError {
    tracing::error!("membership: lock poisoned on {op}: {err}");
    StoreError::LockPoisoned {
        context: format!("membership.{op}"),
    }
}
