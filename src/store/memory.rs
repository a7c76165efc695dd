//! Thread-safe in-memory grant store.

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::table::GrantTable;
use super::GrantStore;
use crate::error::StoreError;
use crate::primitives::{EntityRef, GrantRow, GroupGrant, ObjectGrant, Subject, UserGrant};
use crate::types::{GroupId, PermissionKindId, UserId};

/// Generic user and group grant tables, each behind its own `RwLock`.
///
/// Read-heavy workloads (permission checks) take shared locks; inserts and
/// deletes take the write lock of a single table, which is where the unique
/// constraint is enforced.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    users: RwLock<GrantTable<UserId>>,
    groups: RwLock<GrantTable<GroupId>>,
}

/// Serializable copy of both tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GrantSnapshot {
    pub user_grants: Vec<UserGrant>,
    pub group_grants: Vec<GroupGrant>,
}

impl GrantSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self, op: &str) -> Result<RwLockReadGuard<'_, GrantTable<UserId>>, StoreError> {
        self.users.read().map_err(|e| poisoned("users", op, e))
    }

    fn users_mut(&self, op: &str) -> Result<RwLockWriteGuard<'_, GrantTable<UserId>>, StoreError> {
        self.users.write().map_err(|e| poisoned("users", op, e))
    }

    fn groups(&self, op: &str) -> Result<RwLockReadGuard<'_, GrantTable<GroupId>>, StoreError> {
        self.groups.read().map_err(|e| poisoned("groups", op, e))
    }

    fn groups_mut(&self, op: &str) -> Result<RwLockWriteGuard<'_, GrantTable<GroupId>>, StoreError> {
        self.groups.write().map_err(|e| poisoned("groups", op, e))
    }

    /// Copies every row of both tables, in table order.
    pub fn snapshot(&self) -> Result<GrantSnapshot, StoreError> {
        Ok(GrantSnapshot {
            user_grants: self.users("snapshot")?.iter().cloned().collect(),
            group_grants: self.groups("snapshot")?.iter().cloned().collect(),
        })
    }

    /// Merges a snapshot into the store. Existing rows are kept; returns the
    /// number of rows actually added.
    pub fn restore(&self, snapshot: &GrantSnapshot) -> Result<usize, StoreError> {
        let mut added = 0;
        {
            let mut users = self.users_mut("restore")?;
            added += snapshot.user_grants.iter().filter(|row| users.insert((*row).clone())).count();
        }
        {
            let mut groups = self.groups_mut("restore")?;
            added += snapshot.group_grants.iter().filter(|row| groups.insert((*row).clone())).count();
        }
        tracing::debug!(added, "restored grant snapshot");
        Ok(added)
    }
}

impl GrantStore for InMemoryGrantStore {
    fn insert(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        Ok(match grant.subject {
            Subject::User(user) => self.users_mut("insert")?.insert(row(grant, user)),
            Subject::Group(group) => self.groups_mut("insert")?.insert(row(grant, group)),
        })
    }

    fn delete(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        Ok(match grant.subject {
            Subject::User(user) => self.users_mut("delete")?.remove(&row(grant, user)),
            Subject::Group(group) => self.groups_mut("delete")?.remove(&row(grant, group)),
        })
    }

    fn contains(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        Ok(match grant.subject {
            Subject::User(user) => self.users("contains")?.contains(&row(grant, user)),
            Subject::Group(group) => self.groups("contains")?.contains(&row(grant, group)),
        })
    }

    fn user_grants_for_object(&self, object: &EntityRef) -> Result<Vec<UserGrant>, StoreError> {
        Ok(self.users("user_grants_for_object")?.rows_for_object(object))
    }

    fn group_grants_for_object(&self, object: &EntityRef) -> Result<Vec<GroupGrant>, StoreError> {
        Ok(self.groups("group_grants_for_object")?.rows_for_object(object))
    }

    fn objects_for_subject(
        &self,
        subject: &Subject,
        permission: PermissionKindId,
    ) -> Result<BTreeSet<EntityRef>, StoreError> {
        Ok(match subject {
            Subject::User(user) => self.users("objects_for_subject")?.objects_for(user, permission),
            Subject::Group(group) => self.groups("objects_for_subject")?.objects_for(group, permission),
        })
    }

    fn permissions_on(&self, subject: &Subject, object: &EntityRef) -> Result<BTreeSet<PermissionKindId>, StoreError> {
        Ok(match subject {
            Subject::User(user) => self.users("permissions_on")?.permissions_on(user, object),
            Subject::Group(group) => self.groups("permissions_on")?.permissions_on(group, object),
        })
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.users("len")?.len() + self.groups("len")?.len())
    }
}

fn row<K>(grant: &ObjectGrant, holder: K) -> GrantRow<K> {
    GrantRow {
        permission: grant.permission,
        object: grant.object.clone(),
        holder,
    }
}

fn poisoned(table: &str, op: &str, err: impl std::fmt::Display) -> StoreError {
    tracing::error!("grant_store: {table} lock poisoned on {op}: {err}");
    StoreError::LockPoisoned {
        context: format!("{table}.{op}"),
    }
}
