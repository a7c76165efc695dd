//!
//! Records shared by the catalog, the grant stores and the engine.
//!

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::{EntityType, GroupId, InstanceId, PermissionKindId, UserId};

// --- Entity references ------------------------------------------------------

/// Opaque `(entity type, instance id)` pair identifying the target of a grant.
///
/// Ordering is lexicographic on `(entity_type, instance_id)`; every query that
/// returns references relies on it for a stable result order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub instance_id: InstanceId,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<EntityType>, instance_id: impl Into<InstanceId>) -> Self {
        EntityRef {
            entity_type: entity_type.into(),
            instance_id: instance_id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.instance_id)
    }
}

// --- Permission kinds -------------------------------------------------------

/// An action scoped to one entity type, e.g. `change_project` on `project`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PermissionKind {
    pub id: PermissionKindId,
    pub entity_type: EntityType,
    pub codename: String,
    /// Human readable label, e.g. "Can change project".
    pub name: String,
}

// --- Subjects ---------------------------------------------------------------

/// Holder of a grant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    User(UserId),
    Group(GroupId),
}

impl From<UserId> for Subject {
    fn from(user: UserId) -> Self {
        Subject::User(user)
    }
}

impl From<GroupId> for Subject {
    fn from(group: GroupId) -> Self {
        Subject::Group(group)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(u) => fmt::Display::fmt(u, f),
            Subject::Group(g) => fmt::Display::fmt(g, f),
        }
    }
}

// --- Grants -----------------------------------------------------------------

/// One row of a grant table. `K` is the holder id: [`UserId`] for the user
/// table, [`GroupId`] for the group table.
///
/// A row is unique per `(permission, object, holder)`; tables store rows in a
/// set so a second insert of the same triple is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct GrantRow<K> {
    pub permission: PermissionKindId,
    pub object: EntityRef,
    pub holder: K,
}

/// Row of the user grant table.
pub type UserGrant = GrantRow<UserId>;
/// Row of the group grant table.
pub type GroupGrant = GrantRow<GroupId>;

/// Unified view over both grant tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ObjectGrant {
    pub permission: PermissionKindId,
    pub object: EntityRef,
    pub subject: Subject,
}

impl ObjectGrant {
    pub fn new(permission: PermissionKindId, object: EntityRef, subject: impl Into<Subject>) -> Self {
        ObjectGrant {
            permission,
            object,
            subject: subject.into(),
        }
    }
}

impl From<UserGrant> for ObjectGrant {
    fn from(row: UserGrant) -> Self {
        ObjectGrant {
            permission: row.permission,
            object: row.object,
            subject: Subject::User(row.holder),
        }
    }
}

impl From<GroupGrant> for ObjectGrant {
    fn from(row: GroupGrant) -> Self {
        ObjectGrant {
            permission: row.permission,
            object: row.object,
            subject: Subject::Group(row.holder),
        }
    }
}

// --- Query results ----------------------------------------------------------

/// Result of `get_users_with_perms` / `get_groups_with_perms`.
///
/// `Holders` is returned when permissions were not requested, `WithPerms` maps
/// each holder to its deduplicated codenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectPerms<K: Ord> {
    Holders(BTreeSet<K>),
    WithPerms(BTreeMap<K, BTreeSet<String>>),
}

impl<K: Ord + Clone> SubjectPerms<K> {
    /// Holders regardless of whether permissions were attached.
    pub fn holders(&self) -> BTreeSet<K> {
        match self {
            SubjectPerms::Holders(set) => set.clone(),
            SubjectPerms::WithPerms(map) => map.keys().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SubjectPerms::Holders(set) => set.is_empty(),
            SubjectPerms::WithPerms(map) => map.is_empty(),
        }
    }
}

/// How several codenames combine in multi-permission object queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PermMatch {
    /// The object must carry every requested permission.
    #[default]
    All,
    /// Any one of the requested permissions suffices.
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_refs_order_by_type_then_instance() {
        let mut refs = vec![
            EntityRef::new("task", "1"),
            EntityRef::new("project", "b"),
            EntityRef::new("project", "a"),
        ];
        refs.sort();
        assert_eq!(
            refs,
            vec![
                EntityRef::new("project", "a"),
                EntityRef::new("project", "b"),
                EntityRef::new("task", "1"),
            ]
        );
    }

    #[test]
    fn rows_convert_into_unified_grants() {
        let user = UserId::new();
        let row = UserGrant {
            permission: PermissionKindId(1),
            object: EntityRef::new("project", "1"),
            holder: user,
        };
        let grant: ObjectGrant = row.into();
        assert_eq!(grant.subject, Subject::User(user));
    }

    #[test]
    fn subject_perms_holders_ignores_attached_codenames() {
        let mut map = BTreeMap::new();
        map.insert(1u8, BTreeSet::from(["add".to_string()]));
        let perms = SubjectPerms::WithPerms(map);
        assert_eq!(perms.holders(), BTreeSet::from([1u8]));
        assert!(!perms.is_empty());
        assert!(SubjectPerms::<u8>::Holders(BTreeSet::new()).is_empty());
    }
}
