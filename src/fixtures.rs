//! Shared test fixtures, compiled for unit tests and the `test-utils` feature.
//!
//! The catalog registers the default actions for `project` and `task` plus an
//! `archive` codename on both, so ambiguity handling can be exercised.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::access::{EntityResolver, InMemoryMembership};
use crate::catalog::InMemoryCatalog;
use crate::engine::Guardian;
use crate::primitives::EntityRef;
use crate::store::{InMemoryGrantStore, PartitionedGrantStore};

pub const PROJECT: &str = "project";
pub const TASK: &str = "task";
pub const ARCHIVE: &str = "archive";

pub type TestGuardian = Guardian<InMemoryCatalog, InMemoryMembership, InMemoryGrantStore>;
pub type PartitionedGuardian = Guardian<InMemoryCatalog, InMemoryMembership, PartitionedGrantStore>;

pub fn catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    for entity_type in [PROJECT, TASK] {
        catalog
            .register_defaults(entity_type)
            .expect("fixture catalog registers defaults once");
        catalog
            .register(entity_type, ARCHIVE, "Can archive")
            .expect("fixture catalog registers archive once per type");
    }
    catalog
}

pub fn guardian() -> TestGuardian {
    Guardian::new(catalog(), InMemoryMembership::new(), InMemoryGrantStore::new())
}

/// Same catalog, with a dedicated table for `project` grants.
pub fn partitioned_guardian() -> PartitionedGuardian {
    Guardian::new(
        catalog(),
        InMemoryMembership::new(),
        PartitionedGrantStore::new().with_table(PROJECT),
    )
}

pub fn project_ref(id: &str) -> EntityRef {
    EntityRef::new(PROJECT, id)
}

pub fn task_ref(id: &str) -> EntityRef {
    EntityRef::new(TASK, id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// Owns projects the way an application model layer would, and resolves
/// project references back to them.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: RwLock<BTreeMap<String, Project>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a project whose id equals its name.
    pub fn create(&self, name: &str) -> Project {
        let project = Project {
            id: name.to_string(),
            name: name.to_string(),
        };
        self.projects
            .write()
            .expect("fixture lock")
            .insert(project.id.clone(), project.clone());
        project
    }

    /// Deletes the project without touching its grants.
    pub fn delete(&self, project: &Project) {
        self.projects.write().expect("fixture lock").remove(&project.id);
    }
}

impl EntityResolver for ProjectRegistry {
    type Object = Project;

    fn resolve(&self, reference: &EntityRef) -> Option<Project> {
        if reference.entity_type.as_str() != PROJECT {
            return None;
        }
        self.projects.read().ok()?.get(&reference.instance_id).cloned()
    }

    fn identify(&self, project: &Project) -> EntityRef {
        project_ref(&project.id)
    }
}
