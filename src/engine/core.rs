//!
//! The permission engine: codename resolution and the assignment operations.
//!
//! Query operations live in [`super::resolution`]; both extend the same
//! [`Guardian`] type.

use crate::access::GroupMembership;
use crate::catalog::{split_qualified, PermissionCatalog};
use crate::config::GuardianConfig;
use crate::error::{ConfigError, PermissionError};
use crate::primitives::{EntityRef, ObjectGrant, PermissionKind, Subject};
use crate::store::GrantStore;
use crate::types::{EntityType, GroupId, UserId};

/// Object-level permission engine.
///
/// Owns its collaborators: a read-only permission catalog, a membership
/// provider and the grant store. Every operation is a synchronous, stateless
/// call against the store; nothing is cached between calls.
#[derive(Debug)]
pub struct Guardian<C, M, S>
where
    C: PermissionCatalog,
    M: GroupMembership,
    S: GrantStore,
{
    pub(crate) catalog: C,
    pub(crate) membership: M,
    pub(crate) store: S,
    pub(crate) config: GuardianConfig,
}

impl<C, M, S> Guardian<C, M, S>
where
    C: PermissionCatalog,
    M: GroupMembership,
    S: GrantStore,
{
    pub fn new(catalog: C, membership: M, store: S) -> Self {
        Guardian {
            catalog,
            membership,
            store,
            config: GuardianConfig::default(),
        }
    }

    /// Builds an engine with a non-default configuration, rejecting one that
    /// fails [`GuardianConfig::validate`].
    pub fn with_config(catalog: C, membership: M, store: S, config: GuardianConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Guardian {
            catalog,
            membership,
            store,
            config,
        })
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn membership(&self) -> &M {
        &self.membership
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    /// Grants `codename` on `object` to `subject`.
    ///
    /// The codename is resolved against the object's entity type and may be
    /// qualified (`project.change_project`). Assigning a grant that already
    /// exists returns the existing grant and writes nothing.
    pub fn assign(
        &self,
        codename: &str,
        subject: impl Into<Subject>,
        object: &EntityRef,
    ) -> Result<ObjectGrant, PermissionError> {
        let kind = self.kind_for_object(codename, object)?;
        let grant = ObjectGrant::new(kind.id, object.clone(), subject);
        let created = self.store.insert(&grant)?;
        tracing::debug!(
            subject = %grant.subject,
            codename = %kind.codename,
            object = %object,
            created,
            "assigned object permission"
        );
        Ok(grant)
    }

    pub fn assign_to_user(&self, codename: &str, user: UserId, object: &EntityRef) -> Result<ObjectGrant, PermissionError> {
        self.assign(codename, Subject::User(user), object)
    }

    pub fn assign_to_group(&self, codename: &str, group: GroupId, object: &EntityRef) -> Result<ObjectGrant, PermissionError> {
        self.assign(codename, Subject::Group(group), object)
    }

    /// Revokes `codename` on `object` from `subject`. Revoking a grant that
    /// does not exist succeeds.
    pub fn remove_perm(
        &self,
        codename: &str,
        subject: impl Into<Subject>,
        object: &EntityRef,
    ) -> Result<(), PermissionError> {
        let kind = self.kind_for_object(codename, object)?;
        let grant = ObjectGrant::new(kind.id, object.clone(), subject);
        let removed = self.store.delete(&grant)?;
        tracing::debug!(
            subject = %grant.subject,
            codename = %kind.codename,
            object = %object,
            removed,
            "removed object permission"
        );
        Ok(())
    }

    pub fn remove_from_user(&self, codename: &str, user: UserId, object: &EntityRef) -> Result<(), PermissionError> {
        self.remove_perm(codename, Subject::User(user), object)
    }

    pub fn remove_from_group(&self, codename: &str, group: GroupId, object: &EntityRef) -> Result<(), PermissionError> {
        self.remove_perm(codename, Subject::Group(group), object)
    }

    /// Resolves a codename against the entity type of `object`.
    pub(crate) fn kind_for_object(&self, codename: &str, object: &EntityRef) -> Result<PermissionKind, PermissionError> {
        let (qualifier, bare) = split_qualified(codename, self.config.qualifier_separator);
        let unknown = || PermissionError::UnknownPermission {
            codename: codename.to_string(),
            entity_type: Some(object.entity_type.clone()),
        };
        if qualifier.is_some_and(|q| q != object.entity_type) {
            return Err(unknown());
        }
        self.catalog.lookup(bare, &object.entity_type).ok_or_else(unknown)
    }

    /// Resolves a codename for an object query, where the entity type comes
    /// from the codename qualifier, the `entity_type` hint, or the catalog if
    /// the codename is registered for exactly one type.
    pub(crate) fn kind_for_query(
        &self,
        codename: &str,
        entity_type: Option<&EntityType>,
    ) -> Result<PermissionKind, PermissionError> {
        let (qualifier, bare) = split_qualified(codename, self.config.qualifier_separator);
        let entity_type = match (qualifier, entity_type) {
            (Some(q), Some(hint)) if &q != hint => {
                return Err(PermissionError::MixedEntityTypes {
                    expected: hint.clone(),
                    found: q,
                })
            }
            (Some(q), _) => Some(q),
            (None, hint) => hint.cloned(),
        };

        if let Some(entity_type) = entity_type {
            return self
                .catalog
                .lookup(bare, &entity_type)
                .ok_or(PermissionError::UnknownPermission {
                    codename: codename.to_string(),
                    entity_type: Some(entity_type),
                });
        }

        let mut candidates = self.catalog.lookup_by_codename(bare);
        match candidates.len() {
            0 => Err(PermissionError::UnknownPermission {
                codename: codename.to_string(),
                entity_type: None,
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(PermissionError::AmbiguousEntityType {
                codename: codename.to_string(),
                candidates: candidates.into_iter().map(|k| k.entity_type).collect(),
            }),
        }
    }

    /// Resolves several codenames that must share one entity type.
    ///
    /// The type comes from `entity_type`, else from the first qualified
    /// codename, else from the codenames registered for exactly one type.
    /// Ambiguous bare codenames are then resolved against it. Codenames that
    /// land on different types are `MixedEntityTypes` regardless of order.
    pub(crate) fn kinds_for_query(
        &self,
        codenames: &[&str],
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<PermissionKind>, PermissionError> {
        if codenames.is_empty() {
            return Err(PermissionError::NoPermissionsGiven);
        }
        let sep = self.config.qualifier_separator;
        let explicit = entity_type
            .cloned()
            .or_else(|| codenames.iter().find_map(|c| split_qualified(c, sep).0));
        let hint = match explicit {
            Some(hint) => Some(hint),
            None => self.unique_entity_type(codenames)?,
        };

        let mut kinds: Vec<PermissionKind> = Vec::with_capacity(codenames.len());
        for codename in codenames {
            let (qualifier, bare) = split_qualified(codename, sep);
            let kind = match (self.kind_for_query(codename, hint.as_ref()), &hint) {
                (Err(PermissionError::UnknownPermission { .. }), Some(hint))
                    if entity_type.is_none() && qualifier.is_none() =>
                {
                    // A bare codename registered elsewhere: the codenames disagree on the type.
                    match self.catalog.lookup_by_codename(bare).into_iter().next() {
                        Some(other) => {
                            return Err(PermissionError::MixedEntityTypes {
                                expected: hint.clone(),
                                found: other.entity_type,
                            })
                        }
                        None => {
                            return Err(PermissionError::UnknownPermission {
                                codename: codename.to_string(),
                                entity_type: Some(hint.clone()),
                            })
                        }
                    }
                }
                (result, _) => result?,
            };
            if let Some(first) = kinds.first() {
                if first.entity_type != kind.entity_type {
                    return Err(PermissionError::MixedEntityTypes {
                        expected: first.entity_type.clone(),
                        found: kind.entity_type,
                    });
                }
            }
            kinds.push(kind);
        }
        Ok(kinds)
    }

    /// The entity type shared by the bare codenames registered for exactly
    /// one type, or `None` when every codename is ambiguous or unknown.
    fn unique_entity_type(&self, codenames: &[&str]) -> Result<Option<EntityType>, PermissionError> {
        let mut found: Option<EntityType> = None;
        for codename in codenames {
            let mut candidates = self.catalog.lookup_by_codename(codename);
            if candidates.len() != 1 {
                continue;
            }
            let entity_type = candidates.remove(0).entity_type;
            match &found {
                Some(expected) if *expected != entity_type => {
                    return Err(PermissionError::MixedEntityTypes {
                        expected: expected.clone(),
                        found: entity_type,
                    })
                }
                Some(_) => {}
                None => found = Some(entity_type),
            }
        }
        Ok(found)
    }
}
