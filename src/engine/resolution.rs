//! Permission queries.
//!
//! Group membership is folded in for exactly one level: groups hold grants,
//! users inherit them through membership, and groups never inherit from
//! other groups.

use std::collections::{BTreeMap, BTreeSet};

use super::core::Guardian;
use super::objects::Objects;
use crate::access::GroupMembership;
use crate::catalog::PermissionCatalog;
use crate::error::PermissionError;
use crate::primitives::{EntityRef, ObjectGrant, PermMatch, PermissionKind, Subject, SubjectPerms};
use crate::store::GrantStore;
use crate::types::{EntityType, GroupId, PermissionKindId, UserId};

impl<C, M, S> Guardian<C, M, S>
where
    C: PermissionCatalog,
    M: GroupMembership,
    S: GrantStore,
{
    /// Whether `subject` holds `codename` on `object`, directly or (for users)
    /// through a group they belong to.
    ///
    /// A codename the catalog does not know for the object's type is held by
    /// nobody, so it yields `Ok(false)`.
    pub fn has_permission(
        &self,
        subject: impl Into<Subject>,
        codename: &str,
        object: &EntityRef,
    ) -> Result<bool, PermissionError> {
        let subject = subject.into();
        let kind = match self.kind_for_object(codename, object) {
            Ok(kind) => kind,
            Err(PermissionError::UnknownPermission { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };

        for holder in self.effective_subjects(subject)? {
            if self.store.contains(&ObjectGrant::new(kind.id, object.clone(), holder))? {
                tracing::trace!(%subject, via = %holder, codename, %object, "permission granted");
                return Ok(true);
            }
        }
        tracing::trace!(%subject, codename, %object, "permission denied");
        Ok(false)
    }

    /// Every codename `subject` holds on `object`.
    pub fn get_perms(&self, subject: impl Into<Subject>, object: &EntityRef) -> Result<BTreeSet<String>, PermissionError> {
        let mut ids = BTreeSet::new();
        for holder in self.effective_subjects(subject.into())? {
            ids.extend(self.store.permissions_on(&holder, object)?);
        }
        Ok(ids.into_iter().filter_map(|id| self.codename_on(id, object)).collect())
    }

    /// Users holding any permission on `object`, directly or through a group.
    ///
    /// With `attach_perms` each user maps to the union of their direct and
    /// group-derived codenames.
    pub fn get_users_with_perms(
        &self,
        object: &EntityRef,
        attach_perms: bool,
    ) -> Result<SubjectPerms<UserId>, PermissionError> {
        let perms = self.users_with_perms_attached(object)?;
        Ok(if attach_perms {
            SubjectPerms::WithPerms(perms)
        } else {
            SubjectPerms::Holders(perms.into_keys().collect())
        })
    }

    pub fn users_with_perms(&self, object: &EntityRef) -> Result<BTreeSet<UserId>, PermissionError> {
        Ok(self.users_with_perms_attached(object)?.into_keys().collect())
    }

    pub fn users_with_perms_attached(
        &self,
        object: &EntityRef,
    ) -> Result<BTreeMap<UserId, BTreeSet<String>>, PermissionError> {
        let mut perms: BTreeMap<UserId, BTreeSet<String>> = BTreeMap::new();
        for row in self.store.user_grants_for_object(object)? {
            if let Some(codename) = self.codename_on(row.permission, object) {
                perms.entry(row.holder).or_default().insert(codename);
            }
        }

        if self.config.with_group_users {
            for row in self.store.group_grants_for_object(object)? {
                let Some(codename) = self.codename_on(row.permission, object) else {
                    continue;
                };
                for user in self.membership.members_of(row.holder)? {
                    perms.entry(user).or_default().insert(codename.clone());
                }
            }
        }
        tracing::trace!(%object, users = perms.len(), "resolved users with perms");
        Ok(perms)
    }

    /// Groups holding any permission on `object`. Direct group grants only.
    pub fn get_groups_with_perms(
        &self,
        object: &EntityRef,
        attach_perms: bool,
    ) -> Result<SubjectPerms<GroupId>, PermissionError> {
        let perms = self.groups_with_perms_attached(object)?;
        Ok(if attach_perms {
            SubjectPerms::WithPerms(perms)
        } else {
            SubjectPerms::Holders(perms.into_keys().collect())
        })
    }

    pub fn groups_with_perms(&self, object: &EntityRef) -> Result<BTreeSet<GroupId>, PermissionError> {
        Ok(self.groups_with_perms_attached(object)?.into_keys().collect())
    }

    pub fn groups_with_perms_attached(
        &self,
        object: &EntityRef,
    ) -> Result<BTreeMap<GroupId, BTreeSet<String>>, PermissionError> {
        let mut perms: BTreeMap<GroupId, BTreeSet<String>> = BTreeMap::new();
        for row in self.store.group_grants_for_object(object)? {
            if let Some(codename) = self.codename_on(row.permission, object) {
                perms.entry(row.holder).or_default().insert(codename);
            }
        }
        Ok(perms)
    }

    /// Objects on which `user` holds `codename`, directly or through a group.
    ///
    /// A bare codename registered for several entity types must be qualified
    /// or accompanied by `entity_type`.
    pub fn get_objects_for_user(
        &self,
        user: UserId,
        codename: &str,
        entity_type: Option<&EntityType>,
    ) -> Result<Objects, PermissionError> {
        self.get_objects_for_user_with(user, &[codename], PermMatch::All, entity_type)
    }

    /// Like [`get_objects_for_user`](Self::get_objects_for_user) for several
    /// codenames of one entity type, combined according to `mode`.
    pub fn get_objects_for_user_with(
        &self,
        user: UserId,
        codenames: &[&str],
        mode: PermMatch,
        entity_type: Option<&EntityType>,
    ) -> Result<Objects, PermissionError> {
        let kinds = self.kinds_for_query(codenames, entity_type)?;
        let holders = self.effective_subjects(Subject::User(user))?;
        self.objects_for_holders(&holders, &kinds, mode)
    }

    /// Objects on which `group` directly holds `codename`.
    pub fn get_objects_for_group(
        &self,
        group: GroupId,
        codename: &str,
        entity_type: Option<&EntityType>,
    ) -> Result<Objects, PermissionError> {
        self.get_objects_for_group_with(group, &[codename], PermMatch::All, entity_type)
    }

    pub fn get_objects_for_group_with(
        &self,
        group: GroupId,
        codenames: &[&str],
        mode: PermMatch,
        entity_type: Option<&EntityType>,
    ) -> Result<Objects, PermissionError> {
        let kinds = self.kinds_for_query(codenames, entity_type)?;
        self.objects_for_holders(&[Subject::Group(group)], &kinds, mode)
    }

    fn objects_for_holders(
        &self,
        holders: &[Subject],
        kinds: &[PermissionKind],
        mode: PermMatch,
    ) -> Result<Objects, PermissionError> {
        let mut combined: Option<BTreeSet<EntityRef>> = None;
        for kind in kinds {
            let mut objects = BTreeSet::new();
            for holder in holders {
                objects.extend(
                    self.store
                        .objects_for_subject(holder, kind.id)?
                        .into_iter()
                        .filter(|object| object.entity_type == kind.entity_type),
                );
            }
            combined = Some(match (combined, mode) {
                (None, _) => objects,
                (Some(acc), PermMatch::All) => acc.intersection(&objects).cloned().collect(),
                (Some(mut acc), PermMatch::Any) => {
                    acc.extend(objects);
                    acc
                }
            });
        }
        let objects = combined.unwrap_or_default();
        tracing::trace!(holders = holders.len(), objects = objects.len(), ?mode, "resolved objects");
        Ok(Objects::new(objects))
    }

    /// The subject itself followed, for a user with group inheritance
    /// enabled, by each group the user belongs to.
    fn effective_subjects(&self, subject: Subject) -> Result<Vec<Subject>, PermissionError> {
        let mut subjects = vec![subject];
        if let Subject::User(user) = subject {
            if self.config.group_inheritance {
                subjects.extend(self.membership.groups_of(user)?.into_iter().map(Subject::Group));
            }
        }
        Ok(subjects)
    }

    /// Codename of a grant row on `object`. Rows whose kind is missing from
    /// the catalog or scoped to another entity type are not permissions on
    /// `object` and yield `None`.
    fn codename_on(&self, id: PermissionKindId, object: &EntityRef) -> Option<String> {
        let Some(kind) = self.catalog.get(id) else {
            tracing::warn!(%id, "grant references a permission kind missing from the catalog");
            return None;
        };
        if kind.entity_type != object.entity_type {
            tracing::debug!(%id, kind_type = %kind.entity_type, %object, "skipping grant scoped to another entity type");
            return None;
        }
        Some(kind.codename)
    }
}
