use gatekeep_access::error::{AccessServiceError, ErrorCategory};
use gatekeep_access::usecase::user::CreateUserInput;

use crate::helpers::{FakeHasher, MemoryStore, create_input, create_user_usecase};

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed_permission("read");
    store.seed_permission("write");
    store.seed_permission("delete");
    store.seed_role("admin");
    store.seed_role("editor");
    store.seed_role("viewer");
    store
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_provision_user_with_role_and_missing_grants() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let user = usecase
        .execute(create_input("ana@x.io", 3, &[1, 2]))
        .await
        .unwrap();

    assert_eq!(user.name, "Ana");
    assert_eq!(user.email, "ana@x.io");
    assert!(user.is_active);

    let db = store.snapshot();
    assert_eq!(db.users.len(), 1);
    assert_eq!(db.user_roles, vec![(user.id, 3)]);
    assert_eq!(store.grants_of(3), vec![1, 2]);
    assert_eq!(hasher.calls(), 1);
}

#[tokio::test]
async fn should_store_hash_instead_of_plaintext() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let input = CreateUserInput {
        password: "secretPassword".into(),
        ..create_input("ana@x.io", 1, &[1])
    };
    usecase.execute(input).await.unwrap();

    let db = store.snapshot();
    assert_eq!(db.users[0].1, "fake-hash:14");
}

#[tokio::test]
async fn should_accept_explicit_inactive_user() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let input = CreateUserInput {
        is_active: Some(false),
        ..create_input("ana@x.io", 1, &[1])
    };
    let user = usecase.execute(input).await.unwrap();

    assert!(!user.is_active);
}

// ── Grant reconciliation ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_only_add_grants_the_role_lacks() {
    let store = seeded_store();
    store.grant(2, 1);
    store.grant(2, 2);
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    usecase
        .execute(create_input("ana@x.io", 2, &[1, 2, 3]))
        .await
        .unwrap();

    assert_eq!(store.grants_of(2), vec![1, 2, 3]);
    assert_eq!(store.snapshot().role_permissions.len(), 3);
}

#[tokio::test]
async fn should_not_duplicate_grants_across_provisionings() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    usecase
        .execute(create_input("ana@x.io", 1, &[1, 2]))
        .await
        .unwrap();
    usecase
        .execute(create_input("bea@x.io", 1, &[1, 2]))
        .await
        .unwrap();

    let db = store.snapshot();
    assert_eq!(db.users.len(), 2);
    assert_eq!(db.user_roles.len(), 2);
    assert_eq!(store.grants_of(1), vec![1, 2]);
}

#[tokio::test]
async fn should_collapse_repeated_permission_ids() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    usecase
        .execute(create_input("ana@x.io", 1, &[2, 2, 2]))
        .await
        .unwrap();

    assert_eq!(store.grants_of(1), vec![2]);
}

#[tokio::test]
async fn should_leave_other_roles_untouched() {
    let store = seeded_store();
    store.grant(3, 1);
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    usecase
        .execute(create_input("ana@x.io", 1, &[2, 3]))
        .await
        .unwrap();

    assert_eq!(store.grants_of(3), vec![1]);
    assert_eq!(store.grants_of(1), vec![2, 3]);
}

// ── Rejections ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_invalid_input_without_touching_store_or_hasher() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let result = usecase.execute(create_input("ana@x.io", 1, &[])).await;

    assert!(
        matches!(result, Err(AccessServiceError::MissingField("permission ids"))),
        "expected MissingField, got {:?}",
        result.map(|_| ())
    );
    assert_eq!(store.calls(), 0);
    assert_eq!(hasher.calls(), 0);
}

#[tokio::test]
async fn should_reject_duplicate_email_without_writing() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);
    usecase
        .execute(create_input("ana@x.io", 1, &[1]))
        .await
        .unwrap();
    let before = store.snapshot();

    let result = usecase.execute(create_input("ana@x.io", 2, &[2])).await;

    let err = result.map(|_| ()).unwrap_err();
    assert!(matches!(err, AccessServiceError::EmailAlreadyRegistered));
    assert_eq!(err.category(), ErrorCategory::Conflict);
    let after = store.snapshot();
    assert_eq!(after.users.len(), before.users.len());
    assert_eq!(after.user_roles, before.user_roles);
    assert_eq!(after.role_permissions, before.role_permissions);
    assert_eq!(hasher.calls(), 1);
}

#[tokio::test]
async fn should_reject_unknown_role_before_hashing() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let result = usecase.execute(create_input("ana@x.io", 42, &[1])).await;

    assert!(matches!(result, Err(AccessServiceError::RoleNotFound)));
    assert_eq!(hasher.calls(), 0);
    assert!(store.snapshot().users.is_empty());
}

#[tokio::test]
async fn should_reject_unknown_permission_before_hashing() {
    let store = seeded_store();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let result = usecase.execute(create_input("ana@x.io", 1, &[1, 99])).await;

    assert!(matches!(result, Err(AccessServiceError::PermissionNotFound)));
    assert_eq!(hasher.calls(), 0);
    assert!(store.snapshot().role_permissions.is_empty());
}

#[tokio::test]
async fn should_roll_back_everything_when_grant_step_fails() {
    let store = seeded_store();
    store.fail_grants();
    let hasher = FakeHasher::default();
    let usecase = create_user_usecase(&store, &hasher);

    let result = usecase.execute(create_input("ana@x.io", 1, &[1, 2])).await;

    let err = result.map(|_| ()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
    let db = store.snapshot();
    assert!(db.users.is_empty());
    assert!(db.user_roles.is_empty());
    assert!(db.role_permissions.is_empty());
}
