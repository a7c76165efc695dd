//!
//! Defines error types for guardian-core.
//!
//! Absence is never an error: removing a grant that does not exist and
//! querying an object nobody holds permissions on both succeed.

use crate::types::EntityType;

/// Errors raised by the assignment and resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The codename is not registered for the entity type.
    #[error("Unknown permission '{codename}'{}", fmt_entity_type(.entity_type))]
    UnknownPermission {
        codename: String,
        entity_type: Option<EntityType>,
    },
    /// The codename is registered for several entity types and none was given.
    #[error("Permission '{codename}' is ambiguous across entity types {candidates:?}; qualify it")]
    AmbiguousEntityType {
        codename: String,
        candidates: Vec<EntityType>,
    },
    /// Codenames of a multi-permission query resolve to different entity types.
    #[error("Permissions must share one entity type: expected '{expected}', found '{found}'")]
    MixedEntityTypes { expected: EntityType, found: EntityType },
    /// A multi-permission query was given no codenames.
    #[error("No permissions given")]
    NoPermissionsGiven,
    /// Store failures propagate unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn fmt_entity_type(entity_type: &Option<EntityType>) -> String {
    match entity_type {
        Some(t) => format!(" for entity type '{}'", t),
        None => String::new(),
    }
}

/// Failures of a grant store or membership provider backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An internal lock was poisoned by a panicking writer.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
    /// A constraint other than grant uniqueness was violated.
    #[error("Constraint violation: {0}")]
    Constraint(String),
    /// Connectivity or other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors raised while registering permission kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Permission '{codename}' is already registered for '{entity_type}'")]
    Duplicate { entity_type: EntityType, codename: String },
    #[error("Invalid codename '{0}'")]
    InvalidCodename(String),
}

/// Errors raised while loading a [`GuardianConfig`](crate::config::GuardianConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_permission_mentions_entity_type_when_known() {
        let err = PermissionError::UnknownPermission {
            codename: "fly".into(),
            entity_type: Some(EntityType::from("project")),
        };
        assert_eq!(err.to_string(), "Unknown permission 'fly' for entity type 'project'");

        let bare = PermissionError::UnknownPermission { codename: "fly".into(), entity_type: None };
        assert_eq!(bare.to_string(), "Unknown permission 'fly'");
    }

    #[test]
    fn store_errors_pass_through_transparently() {
        let err: PermissionError = StoreError::Backend("down".into()).into();
        assert_eq!(err.to_string(), "Backend error: down");
    }
}
