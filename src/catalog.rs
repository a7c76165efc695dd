//!
//! Permission catalog: the registry of known permission kinds.
//!
//! A permission kind is identified by `(entity type, codename)`. The same
//! codename may be registered for several entity types, which is why object
//! queries given a bare codename have to check for ambiguity.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::CatalogError;
use crate::primitives::PermissionKind;
use crate::types::{EntityType, PermissionKindId};

/// Default actions registered for every entity type by [`InMemoryCatalog::register_defaults`].
pub mod actions {
    pub const ADD: &str = "add";
    pub const CHANGE: &str = "change";
    pub const DELETE: &str = "delete";
    pub const VIEW: &str = "view";

    pub const DEFAULTS: [&str; 4] = [ADD, CHANGE, DELETE, VIEW];
}

/// Read-only view of the permission catalog consumed by the engine.
pub trait PermissionCatalog: Send + Sync + Debug {
    /// The kind registered under `codename` for `entity_type`, if any.
    fn lookup(&self, codename: &str, entity_type: &EntityType) -> Option<PermissionKind>;

    /// Every kind registered under `codename`, across all entity types,
    /// ordered by entity type.
    fn lookup_by_codename(&self, codename: &str) -> Vec<PermissionKind>;

    fn get(&self, id: PermissionKindId) -> Option<PermissionKind>;
}

/// Builds the conventional codename for an action on an entity type,
/// e.g. `("change", "project") -> "change_project"`.
pub fn default_codename(action: &str, entity_type: &EntityType) -> String {
    format!("{}_{}", action, entity_type)
}

/// Splits `"<entity type><sep><codename>"`. Returns `(None, codename)` when
/// the separator is absent.
///
/// Codenames never contain the separator, so the split is at its last
/// occurrence and entity types such as `blog.post` stay addressable.
pub fn split_qualified(codename: &str, separator: char) -> (Option<EntityType>, &str) {
    match codename.rsplit_once(separator) {
        Some((entity_type, bare)) => (Some(EntityType::new(entity_type)), bare),
        None => (None, codename),
    }
}

/// In-memory catalog. Registration takes `&mut self`; once handed to the
/// engine the catalog is read-only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    kinds: BTreeMap<PermissionKindId, PermissionKind>,
    by_key: BTreeMap<(EntityType, String), PermissionKindId>,
    next_id: u32,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new permission kind and returns its id.
    pub fn register(
        &mut self,
        entity_type: impl Into<EntityType>,
        codename: &str,
        name: &str,
    ) -> Result<PermissionKindId, CatalogError> {
        let entity_type = entity_type.into();
        if codename.is_empty() || !codename.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(CatalogError::InvalidCodename(codename.to_string()));
        }
        let key = (entity_type.clone(), codename.to_string());
        if self.by_key.contains_key(&key) {
            return Err(CatalogError::Duplicate {
                entity_type,
                codename: codename.to_string(),
            });
        }

        self.next_id += 1;
        let id = PermissionKindId(self.next_id);
        tracing::debug!(%id, %entity_type, codename, "registered permission kind");
        self.kinds.insert(
            id,
            PermissionKind {
                id,
                entity_type,
                codename: codename.to_string(),
                name: name.to_string(),
            },
        );
        self.by_key.insert(key, id);
        Ok(id)
    }

    /// Registers `add_<type>`, `change_<type>`, `delete_<type>` and `view_<type>`.
    pub fn register_defaults(&mut self, entity_type: impl Into<EntityType>) -> Result<Vec<PermissionKindId>, CatalogError> {
        let entity_type = entity_type.into();
        actions::DEFAULTS
            .iter()
            .map(|action| {
                let codename = default_codename(action, &entity_type);
                let name = format!("Can {} {}", action, entity_type);
                self.register(entity_type.clone(), &codename, &name)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl PermissionCatalog for InMemoryCatalog {
    fn lookup(&self, codename: &str, entity_type: &EntityType) -> Option<PermissionKind> {
        self.by_key
            .get(&(entity_type.clone(), codename.to_string()))
            .and_then(|id| self.kinds.get(id))
            .cloned()
    }

    fn lookup_by_codename(&self, codename: &str) -> Vec<PermissionKind> {
        // by_key is ordered by entity type first, so the result is too.
        self.by_key
            .iter()
            .filter(|((_, c), _)| c == codename)
            .filter_map(|(_, id)| self.kinds.get(id).cloned())
            .collect()
    }

    fn get(&self, id: PermissionKindId) -> Option<PermissionKind> {
        self.kinds.get(&id).cloned()
    }
}
