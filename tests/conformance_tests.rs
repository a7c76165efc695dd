#![cfg(test)]

use guardian_core::catalog::PermissionCatalog;
use guardian_core::error::PermissionError;
use guardian_core::fixtures::{self, project_ref, ProjectRegistry};
use guardian_core::store::GrantStore;
use guardian_core::types::{GroupId, UserId};
use guardian_core::{ObjectGrant, Subject, SubjectPerms};
use std::collections::{BTreeMap, BTreeSet};

// Helper: codename set from string literals
fn perms(codenames: &[&str]) -> BTreeSet<String> {
    codenames.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_assign_twice_leaves_one_grant() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let registry = ProjectRegistry::new();
    let foobar = registry.create("Foobar");
    let object = project_ref(&foobar.id);

    guardian.assign("add_project", joe, &object).unwrap();
    guardian.assign("add_project", joe, &object).unwrap();

    let count = guardian
        .store()
        .grants_for_object(&object)
        .unwrap()
        .into_iter()
        .filter(|g| g.subject == Subject::User(joe))
        .count();
    assert_eq!(count, 1, "assign must be idempotent");
}

#[test]
fn test_remove_absent_grant_succeeds_and_leaves_nothing() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let object = project_ref("Foobar");

    guardian.remove_perm("add_project", joe, &object).unwrap();
    assert!(guardian.store().is_empty().unwrap());
}

#[test]
fn test_round_trip_assign_then_remove() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let object = project_ref("Foobar");

    guardian.assign("change_project", joe, &object).unwrap();
    assert!(guardian.has_permission(joe, "change_project", &object).unwrap());
    guardian.remove_perm("change_project", joe, &object).unwrap();
    assert!(!guardian.has_permission(joe, "change_project", &object).unwrap());
}

#[test]
fn test_group_inheritance_follows_membership() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let devs = GroupId::new();
    let object = project_ref("Foobar");
    guardian.membership().add_member(devs, joe).unwrap();

    guardian.assign("change_project", devs, &object).unwrap();
    assert!(guardian.has_permission(joe, "change_project", &object).unwrap());
    assert!(guardian.store().user_grants_for_object(&object).unwrap().is_empty());

    guardian.membership().remove_member(devs, joe).unwrap();
    assert!(!guardian.has_permission(joe, "change_project", &object).unwrap());
}

#[test]
fn test_objects_for_user_scenario() {
    let guardian = fixtures::guardian();
    let registry = ProjectRegistry::new();
    let joe = UserId::new();
    let foo = registry.create("foo");
    let bar = registry.create("bar");

    guardian.assign("add_project", joe, &project_ref(&foo.id)).unwrap();
    guardian.assign("add_project", joe, &project_ref(&bar.id)).unwrap();
    guardian.assign("change_project", joe, &project_ref(&bar.id)).unwrap();

    let ids: BTreeSet<String> = guardian
        .get_objects_for_user(joe, "add_project", None)
        .unwrap()
        .resolve(&registry)
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, BTreeSet::from([foo.id, bar.id]));
}

#[test]
fn test_users_with_perms_merges_direct_and_group_grants() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let devs = GroupId::new();
    let object = project_ref("project");
    guardian.membership().add_member(devs, joe).unwrap();

    guardian.assign("change_project", devs, &object).unwrap();
    guardian.assign("add_project", joe, &object).unwrap();

    assert_eq!(
        guardian.get_users_with_perms(&object, true).unwrap(),
        SubjectPerms::WithPerms(BTreeMap::from([(joe, perms(&["add_project", "change_project"]))]))
    );
    assert_eq!(guardian.groups_with_perms(&object).unwrap().len(), 1);
}

#[test]
fn test_ambiguous_codename_must_be_qualified() {
    let guardian = fixtures::guardian();
    let joe = UserId::new();
    let err = guardian.get_objects_for_group(GroupId::new(), fixtures::ARCHIVE, None).unwrap_err();
    assert!(matches!(err, PermissionError::AmbiguousEntityType { .. }));
    assert!(guardian.get_objects_for_user(joe, "project.archive", None).is_ok());
}

#[test]
fn test_grant_inserted_without_engine_is_honoured() {
    let guardian = fixtures::partitioned_guardian();
    let joe = UserId::new();
    let admins = GroupId::new();
    guardian.membership().add_member(admins, joe).unwrap();
    let object = project_ref("Foobar");
    let kind = guardian
        .catalog()
        .lookup_by_codename("add_project")
        .pop()
        .unwrap();

    guardian.store().insert(&ObjectGrant::new(kind.id, object.clone(), admins)).unwrap();
    assert!(guardian.has_permission(joe, "add_project", &object).unwrap());
    assert_eq!(guardian.groups_with_perms(&object).unwrap().len(), 1);
}
