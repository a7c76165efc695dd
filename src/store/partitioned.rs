//! Per-entity-type grant tables.
//!
//! Entity types registered with [`PartitionedGrantStore::with_table`] get their
//! own pair of user/group tables (the equivalent of a dedicated
//! `ProjectUserGrant` / `ProjectGroupGrant` table). Everything else lands in
//! the generic fallback tables. Callers see a single [`GrantStore`].

use std::collections::{BTreeMap, BTreeSet};

use super::memory::InMemoryGrantStore;
use super::GrantStore;
use crate::error::StoreError;
use crate::primitives::{EntityRef, GroupGrant, ObjectGrant, Subject, UserGrant};
use crate::types::{EntityType, PermissionKindId};

#[derive(Debug, Default)]
pub struct PartitionedGrantStore {
    tables: BTreeMap<EntityType, InMemoryGrantStore>,
    fallback: InMemoryGrantStore,
}

impl PartitionedGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `entity_type` dedicated tables.
    pub fn with_table(mut self, entity_type: impl Into<EntityType>) -> Self {
        self.tables.entry(entity_type.into()).or_default();
        self
    }

    /// The dedicated tables of `entity_type`, if it has any.
    pub fn table(&self, entity_type: &EntityType) -> Option<&InMemoryGrantStore> {
        self.tables.get(entity_type)
    }

    /// The generic tables used for entity types without dedicated ones.
    pub fn fallback(&self) -> &InMemoryGrantStore {
        &self.fallback
    }

    fn route(&self, object: &EntityRef) -> &InMemoryGrantStore {
        self.tables.get(&object.entity_type).unwrap_or(&self.fallback)
    }

    fn all(&self) -> impl Iterator<Item = &InMemoryGrantStore> {
        self.tables.values().chain(std::iter::once(&self.fallback))
    }
}

impl GrantStore for PartitionedGrantStore {
    fn insert(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        self.route(&grant.object).insert(grant)
    }

    fn delete(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        self.route(&grant.object).delete(grant)
    }

    fn contains(&self, grant: &ObjectGrant) -> Result<bool, StoreError> {
        self.route(&grant.object).contains(grant)
    }

    fn user_grants_for_object(&self, object: &EntityRef) -> Result<Vec<UserGrant>, StoreError> {
        self.route(object).user_grants_for_object(object)
    }

    fn group_grants_for_object(&self, object: &EntityRef) -> Result<Vec<GroupGrant>, StoreError> {
        self.route(object).group_grants_for_object(object)
    }

    fn objects_for_subject(
        &self,
        subject: &Subject,
        permission: PermissionKindId,
    ) -> Result<BTreeSet<EntityRef>, StoreError> {
        let mut objects = BTreeSet::new();
        for table in self.all() {
            objects.extend(table.objects_for_subject(subject, permission)?);
        }
        Ok(objects)
    }

    fn permissions_on(&self, subject: &Subject, object: &EntityRef) -> Result<BTreeSet<PermissionKindId>, StoreError> {
        self.route(object).permissions_on(subject, object)
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.all().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract::check_store_contract;
    use crate::types::UserId;

    #[test]
    fn satisfies_store_contract_with_and_without_dedicated_tables() {
        check_store_contract(&PartitionedGrantStore::new());
        check_store_contract(&PartitionedGrantStore::new().with_table("project"));
    }

    #[test]
    fn grants_are_routed_by_entity_type() {
        let store = PartitionedGrantStore::new().with_table("project");
        let joe = UserId::new();
        store
            .insert(&ObjectGrant::new(PermissionKindId(1), EntityRef::new("project", "1"), joe))
            .unwrap();
        store
            .insert(&ObjectGrant::new(PermissionKindId(5), EntityRef::new("task", "1"), joe))
            .unwrap();

        let projects = store.table(&EntityType::from("project")).unwrap();
        assert_eq!(projects.len().unwrap(), 1);
        assert_eq!(store.fallback().len().unwrap(), 1);
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.table(&EntityType::from("task")).is_none());
    }
}
