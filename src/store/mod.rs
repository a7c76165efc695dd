//!
//! Grant storage.
//!
//! Two logical tables hold grants: one keyed by user, one keyed by group. Each
//! is unique over `(permission, entity type, instance id, holder)` and indexed
//! by object (reverse lookups) and by holder (forward lookups).
//!
//! [`GrantStore`] is the seam to the persistence layer. Two in-process
//! implementations satisfy the same contract:
//! - [`InMemoryGrantStore`]: one pair of generic tables for all entity types.
//! - [`PartitionedGrantStore`]: dedicated tables per registered entity type,
//!   with a generic fallback.

pub mod memory;
pub mod partitioned;
pub mod table;

pub use memory::{GrantSnapshot, InMemoryGrantStore};
pub use partitioned::PartitionedGrantStore;
pub use table::GrantTable;

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::error::StoreError;
use crate::primitives::{EntityRef, GroupGrant, ObjectGrant, Subject, UserGrant};
use crate::types::PermissionKindId;

/// Storage backend for grants.
///
/// Uniqueness of the `(permission, object, subject)` triple must be enforced by
/// the store itself (unique index), so concurrent inserts of the same grant
/// never produce two rows.
pub trait GrantStore: Send + Sync + Debug {
    /// Inserts the grant. `Ok(false)` means the triple already existed.
    fn insert(&self, grant: &ObjectGrant) -> Result<bool, StoreError>;

    /// Deletes the grant. `Ok(false)` means there was nothing to delete.
    fn delete(&self, grant: &ObjectGrant) -> Result<bool, StoreError>;

    fn contains(&self, grant: &ObjectGrant) -> Result<bool, StoreError>;

    fn user_grants_for_object(&self, object: &EntityRef) -> Result<Vec<UserGrant>, StoreError>;

    fn group_grants_for_object(&self, object: &EntityRef) -> Result<Vec<GroupGrant>, StoreError>;

    /// Objects on which `subject` directly holds `permission`.
    fn objects_for_subject(
        &self,
        subject: &Subject,
        permission: PermissionKindId,
    ) -> Result<BTreeSet<EntityRef>, StoreError>;

    /// Permission kinds `subject` directly holds on `object`.
    fn permissions_on(&self, subject: &Subject, object: &EntityRef) -> Result<BTreeSet<PermissionKindId>, StoreError>;

    /// Total number of rows across both tables.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Both tables' rows for `object`, users first.
    fn grants_for_object(&self, object: &EntityRef) -> Result<Vec<ObjectGrant>, StoreError> {
        let mut grants: Vec<ObjectGrant> = self
            .user_grants_for_object(object)?
            .into_iter()
            .map(ObjectGrant::from)
            .collect();
        grants.extend(self.group_grants_for_object(object)?.into_iter().map(ObjectGrant::from));
        Ok(grants)
    }
}
