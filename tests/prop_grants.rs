use proptest::prelude::*;
use guardian_core::access::InMemoryMembership;
use guardian_core::fixtures::{self, project_ref};
use guardian_core::store::{GrantStore, InMemoryGrantStore, PartitionedGrantStore};
use guardian_core::types::{GroupId, UserId};
use guardian_core::{EntityRef, Guardian, PermMatch};
use std::collections::{BTreeMap, BTreeSet};

const PERMS: [&str; 4] = ["add_project", "change_project", "delete_project", "view_project"];
const OBJECTS: usize = 4;
const USERS: usize = 3;
const GROUPS: usize = 2;

#[derive(Debug, Clone)]
enum Op {
    AssignUser { user: usize, perm: usize, object: usize },
    RemoveUser { user: usize, perm: usize, object: usize },
    AssignGroup { group: usize, perm: usize, object: usize },
    RemoveGroup { group: usize, perm: usize, object: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let triple = |n| (0..n, 0..PERMS.len(), 0..OBJECTS);
    prop_oneof![
        triple(USERS).prop_map(|(user, perm, object)| Op::AssignUser { user, perm, object }),
        triple(USERS).prop_map(|(user, perm, object)| Op::RemoveUser { user, perm, object }),
        triple(GROUPS).prop_map(|(group, perm, object)| Op::AssignGroup { group, perm, object }),
        triple(GROUPS).prop_map(|(group, perm, object)| Op::RemoveGroup { group, perm, object }),
    ]
}

fn object(i: usize) -> EntityRef {
    project_ref(&format!("p{}", i))
}

/// Reference model: plain sets of index triples.
#[derive(Default)]
struct Model {
    user_grants: BTreeSet<(usize, usize, usize)>,
    group_grants: BTreeSet<(usize, usize, usize)>,
    memberships: BTreeSet<(usize, usize)>, // (group, user)
}

impl Model {
    fn user_has(&self, user: usize, perm: usize, object: usize) -> bool {
        self.user_grants.contains(&(user, perm, object))
            || (0..GROUPS).any(|g| self.memberships.contains(&(g, user)) && self.group_grants.contains(&(g, perm, object)))
    }
}

fn run_ops<S: GrantStore>(
    guardian: &Guardian<guardian_core::catalog::InMemoryCatalog, InMemoryMembership, S>,
    users: &[UserId],
    groups: &[GroupId],
    ops: &[Op],
    model: &mut Model,
) {
    for op in ops {
        match *op {
            Op::AssignUser { user, perm, object: o } => {
                guardian.assign(PERMS[perm], users[user], &object(o)).unwrap();
                model.user_grants.insert((user, perm, o));
            }
            Op::RemoveUser { user, perm, object: o } => {
                guardian.remove_perm(PERMS[perm], users[user], &object(o)).unwrap();
                model.user_grants.remove(&(user, perm, o));
            }
            Op::AssignGroup { group, perm, object: o } => {
                guardian.assign(PERMS[perm], groups[group], &object(o)).unwrap();
                model.group_grants.insert((group, perm, o));
            }
            Op::RemoveGroup { group, perm, object: o } => {
                guardian.remove_perm(PERMS[perm], groups[group], &object(o)).unwrap();
                model.group_grants.remove(&(group, perm, o));
            }
        }
    }
}

fn check_against_model<S: GrantStore>(
    guardian: &Guardian<guardian_core::catalog::InMemoryCatalog, InMemoryMembership, S>,
    users: &[UserId],
    model: &Model,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(
        guardian.store().len().unwrap(),
        model.user_grants.len() + model.group_grants.len()
    );

    for (u, user) in users.iter().enumerate() {
        for (p, perm) in PERMS.iter().enumerate() {
            let expected: BTreeSet<EntityRef> = (0..OBJECTS).filter(|o| model.user_has(u, p, *o)).map(object).collect();
            let actual: BTreeSet<EntityRef> = guardian.get_objects_for_user(*user, perm, None).unwrap().collect();
            prop_assert_eq!(&actual, &expected);

            for o in 0..OBJECTS {
                prop_assert_eq!(guardian.has_permission(*user, perm, &object(o)).unwrap(), model.user_has(u, p, o));
            }
        }
    }

    for o in 0..OBJECTS {
        let mut expected: BTreeMap<UserId, BTreeSet<String>> = BTreeMap::new();
        for (u, user) in users.iter().enumerate() {
            for (p, perm) in PERMS.iter().enumerate() {
                if model.user_has(u, p, o) {
                    expected.entry(*user).or_default().insert(perm.to_string());
                }
            }
        }
        prop_assert_eq!(guardian.users_with_perms_attached(&object(o)).unwrap(), expected);
    }
    Ok(())
}

fn setup_members(membership: &InMemoryMembership, users: &[UserId], groups: &[GroupId], pairs: &BTreeSet<(usize, usize)>) {
    for (g, u) in pairs {
        membership.add_member(groups[*g], users[*u]).unwrap();
    }
}

proptest! {
    /// Any sequence of assigns and removes leaves the engine agreeing with a set model.
    #[test]
    fn prop_engine_matches_set_model(
        ops in proptest::collection::vec(op_strategy(), 0..40),
        memberships in proptest::collection::btree_set((0..GROUPS, 0..USERS), 0..6),
    ) {
        let users: Vec<UserId> = (0..USERS).map(|_| UserId::new()).collect();
        let groups: Vec<GroupId> = (0..GROUPS).map(|_| GroupId::new()).collect();

        let guardian = Guardian::new(fixtures::catalog(), InMemoryMembership::new(), InMemoryGrantStore::new());
        setup_members(guardian.membership(), &users, &groups, &memberships);
        let mut model = Model { memberships: memberships.clone(), ..Model::default() };
        run_ops(&guardian, &users, &groups, &ops, &mut model);
        check_against_model(&guardian, &users, &model)?;
    }

    /// The per-entity-type store answers exactly like the generic one.
    #[test]
    fn prop_partitioned_store_matches_set_model(
        ops in proptest::collection::vec(op_strategy(), 0..40),
        memberships in proptest::collection::btree_set((0..GROUPS, 0..USERS), 0..6),
    ) {
        let users: Vec<UserId> = (0..USERS).map(|_| UserId::new()).collect();
        let groups: Vec<GroupId> = (0..GROUPS).map(|_| GroupId::new()).collect();

        let guardian = Guardian::new(
            fixtures::catalog(),
            InMemoryMembership::new(),
            PartitionedGrantStore::new().with_table(fixtures::PROJECT),
        );
        setup_members(guardian.membership(), &users, &groups, &memberships);
        let mut model = Model { memberships: memberships.clone(), ..Model::default() };
        run_ops(&guardian, &users, &groups, &ops, &mut model);
        check_against_model(&guardian, &users, &model)?;
    }

    /// PermMatch::All is the intersection and PermMatch::Any the union of single-codename queries.
    #[test]
    fn prop_multi_perm_queries_combine_single_queries(
        ops in proptest::collection::vec(op_strategy(), 0..40),
        picked in proptest::collection::btree_set(0..PERMS.len(), 1..=PERMS.len()),
    ) {
        let users: Vec<UserId> = (0..USERS).map(|_| UserId::new()).collect();
        let groups: Vec<GroupId> = (0..GROUPS).map(|_| GroupId::new()).collect();
        let guardian = fixtures::guardian();
        let mut model = Model::default();
        run_ops(&guardian, &users, &groups, &ops, &mut model);

        let codenames: Vec<&str> = picked.iter().map(|p| PERMS[*p]).collect();
        let user = users[0];
        let singles: Vec<BTreeSet<EntityRef>> = codenames
            .iter()
            .map(|c| guardian.get_objects_for_user(user, c, None).unwrap().collect())
            .collect();

        let union: BTreeSet<EntityRef> = singles.iter().flatten().cloned().collect();
        let intersection: BTreeSet<EntityRef> = union
            .iter()
            .filter(|o| singles.iter().all(|s| s.contains(*o)))
            .cloned()
            .collect();

        let all: BTreeSet<EntityRef> = guardian.get_objects_for_user_with(user, &codenames, PermMatch::All, None).unwrap().collect();
        let any: BTreeSet<EntityRef> = guardian.get_objects_for_user_with(user, &codenames, PermMatch::Any, None).unwrap().collect();
        prop_assert_eq!(all, intersection);
        prop_assert_eq!(any, union);
    }
}
