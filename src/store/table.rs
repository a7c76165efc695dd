//! A single grant table with its unique row set and two secondary indexes.

use std::collections::{BTreeMap, BTreeSet};

use crate::primitives::{EntityRef, GrantRow};
use crate::types::PermissionKindId;

/// Grant table keyed by holder id `K`.
///
/// `rows` is the unique constraint; `by_object` and `by_holder` are the
/// reverse and forward indexes. All three are kept in step by `insert` and
/// `remove`, so callers never touch them directly.
#[derive(Debug, Clone)]
pub struct GrantTable<K: Ord> {
    rows: BTreeSet<GrantRow<K>>,
    by_object: BTreeMap<EntityRef, BTreeSet<(K, PermissionKindId)>>,
    by_holder: BTreeMap<K, BTreeSet<(PermissionKindId, EntityRef)>>,
}

impl<K: Ord> Default for GrantTable<K> {
    fn default() -> Self {
        GrantTable {
            rows: BTreeSet::new(),
            by_object: BTreeMap::new(),
            by_holder: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> GrantTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the row already exists.
    pub fn insert(&mut self, row: GrantRow<K>) -> bool {
        if self.rows.contains(&row) {
            return false;
        }
        self.by_object
            .entry(row.object.clone())
            .or_default()
            .insert((row.holder, row.permission));
        self.by_holder
            .entry(row.holder)
            .or_default()
            .insert((row.permission, row.object.clone()));
        self.rows.insert(row)
    }

    /// Returns `false` if the row did not exist.
    pub fn remove(&mut self, row: &GrantRow<K>) -> bool {
        if !self.rows.remove(row) {
            return false;
        }
        if let Some(entries) = self.by_object.get_mut(&row.object) {
            entries.remove(&(row.holder, row.permission));
            if entries.is_empty() {
                self.by_object.remove(&row.object);
            }
        }
        if let Some(entries) = self.by_holder.get_mut(&row.holder) {
            entries.remove(&(row.permission, row.object.clone()));
            if entries.is_empty() {
                self.by_holder.remove(&row.holder);
            }
        }
        true
    }

    pub fn contains(&self, row: &GrantRow<K>) -> bool {
        self.rows.contains(row)
    }

    pub fn rows_for_object(&self, object: &EntityRef) -> Vec<GrantRow<K>> {
        self.by_object
            .get(object)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(holder, permission)| GrantRow {
                        permission: *permission,
                        object: object.clone(),
                        holder: *holder,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn objects_for(&self, holder: &K, permission: PermissionKindId) -> BTreeSet<EntityRef> {
        self.by_holder
            .get(holder)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(p, _)| *p == permission)
                    .map(|(_, object)| object.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn permissions_on(&self, holder: &K, object: &EntityRef) -> BTreeSet<PermissionKindId> {
        self.by_object
            .get(object)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(h, _)| h == holder)
                    .map(|(_, permission)| *permission)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrantRow<K>> {
        self.rows.iter()
    }
}
