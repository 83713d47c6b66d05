//! User facade: directory-backed writes and their failure semantics.

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;

use classhub::{
    AuditFilter, DirectoryCommand, DryRunDirectory, EntityKind, OperationKind, OperationStatus,
    UserRole, UserService,
};
use testutils::fixture::AdminFixture;

#[tokio::test]
async fn create_runs_the_directory_command_then_persists() {
    let fixture = AdminFixture::new();

    let user = fixture
        .users
        .create("Alice Reed", "alice.reed@school.edu", UserRole::Teacher, None)
        .await
        .unwrap()
        .expect("creation succeeds");
    assert_eq!(user.upn, "alice.reed@school.edu");

    let executed = fixture.directory.executed();
    assert_eq!(executed.len(), 1);
    assert!(matches!(
        &executed[0],
        DirectoryCommand::CreateUser { upn, .. } if upn == "alice.reed@school.edu"
    ));

    assert_eq!(fixture.users_repo.len(), 1);
}

#[tokio::test]
async fn invalid_upn_fails_before_any_directory_call() {
    let fixture = AdminFixture::new();

    let created = fixture
        .users
        .create("Bob", "not-a-upn", UserRole::Student, None)
        .await
        .unwrap();
    assert!(created.is_none());

    assert_eq!(fixture.directory.executed_count(), 0);
    assert_eq!(fixture.users_repo.len(), 0);

    let failed = fixture
        .audit
        .search(&AuditFilter::new().status(OperationStatus::Failed))
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("not a valid user principal name"));
}

#[tokio::test]
async fn directory_rejection_leaves_local_state_and_cache_untouched() {
    let fixture = AdminFixture::new();

    // Warm the active-users cache.
    assert!(fixture.users.active_users().await.unwrap().is_empty());
    let generation_before = fixture.generations.current(EntityKind::User);

    fixture.directory.reject_next("licensing quota exceeded");
    let created = fixture
        .users
        .create("Carol", "carol@school.edu", UserRole::Staff, None)
        .await
        .unwrap();
    assert!(created.is_none());

    // No repository write, no invalidation: the cached (still correct)
    // state survives the failed remote call.
    assert_eq!(fixture.users_repo.len(), 0);
    assert_eq!(fixture.generations.current(EntityKind::User), generation_before);

    let message = fixture.sink.last_message().unwrap();
    assert_eq!(message, "licensing quota exceeded");
}

#[tokio::test]
async fn transport_failure_is_recovered_like_a_rejection() {
    let fixture = AdminFixture::new();

    fixture.directory.fail_next("gateway timeout");
    let created = fixture
        .users
        .create("Dan", "dan@school.edu", UserRole::Student, None)
        .await
        .unwrap();
    assert!(created.is_none());

    let failed = fixture
        .audit
        .search(&AuditFilter::new().status(OperationStatus::Failed))
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("gateway timeout"));
}

#[tokio::test]
async fn change_role_is_audited_as_status_change() {
    let fixture = AdminFixture::new();
    let user = fixture.seed_user("Erin", UserRole::Student);

    let changed = fixture
        .users
        .change_role(user.id, UserRole::Staff)
        .await
        .unwrap()
        .expect("role change succeeds");
    assert_eq!(changed.role, UserRole::Staff);

    // Local classification only: no directory involvement.
    assert_eq!(fixture.directory.executed_count(), 0);

    let history = fixture
        .audit
        .search(&AuditFilter::new().kind(OperationKind::StatusChanged))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0]
        .details
        .as_deref()
        .unwrap()
        .contains("from student to staff"));
}

#[tokio::test]
async fn offline_preview_runs_against_the_dry_run_executor() {
    let fixture = AdminFixture::new();
    let dry_run = Arc::new(DryRunDirectory::new());

    let preview = UserService::new(
        fixture.ctx(),
        Arc::clone(&fixture.users_repo) as Arc<dyn classhub::Repository<classhub::SchoolUser>>,
        Arc::clone(&fixture.departments_repo)
            as Arc<dyn classhub::Repository<classhub::Department>>,
        Arc::clone(&dry_run) as Arc<dyn classhub::DirectoryExecutor>,
    );

    let user = preview
        .create("Grace", "grace@school.edu", UserRole::Teacher, None)
        .await
        .unwrap()
        .expect("dry-run accepts everything");
    assert_eq!(user.upn, "grace@school.edu");

    // The command ran against the offline executor, not the fixture's one.
    assert_eq!(dry_run.executed_count(), 1);
    assert_eq!(fixture.directory.executed_count(), 0);
}

#[tokio::test]
async fn deactivate_updates_department_listing() {
    let fixture = AdminFixture::new();
    let dept = fixture.seed_department("Arts");
    let mut user = fixture.seed_user("Frank", UserRole::Teacher);
    user.department_id = Some(dept.id);
    fixture.users_repo.seed(user.clone());

    let members = fixture.users.users_in_department(dept.id).await.unwrap();
    assert_eq!(members.len(), 1);

    assert!(fixture.users.deactivate(user.id).await.unwrap());
    assert!(matches!(
        fixture.directory.executed().last(),
        Some(DirectoryCommand::DeactivateUser { .. })
    ));

    // The generation bump retired the cached department listing.
    let members = fixture.users.users_in_department(dept.id).await.unwrap();
    assert!(members.is_empty());

    // Deactivating twice is refused.
    assert!(!fixture.users.deactivate(user.id).await.unwrap());
}
