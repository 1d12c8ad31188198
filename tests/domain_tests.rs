//! Service-level tests
//!
//! TaskService and UserService over an in-memory store, with identities
//! passed in explicitly the way the HTTP layer does after authentication.

use std::sync::Arc;
use taskgate::auth::jwt::AuthService;
use taskgate::db::{DatabaseClient, TursoClient};
use taskgate::types::{AppError, Identity, RegisterRequest, Role};
use taskgate::{TaskService, UserService};

struct Harness {
    db: Arc<dyn DatabaseClient>,
    auth: Arc<AuthService>,
    tasks: TaskService,
    users: UserService,
}

async fn harness() -> Harness {
    let db: Arc<dyn DatabaseClient> = Arc::new(
        TursoClient::new_memory()
            .await
            .expect("Failed to create in-memory database"),
    );
    let auth = Arc::new(AuthService::new("domain-test-secret", 3600));

    Harness {
        tasks: TaskService::new(db.clone()),
        users: UserService::new(db.clone(), auth.clone()),
        db,
        auth,
    }
}

fn register_request(username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: String::new(),
        password: password.to_string(),
        initial_task: None,
    }
}

async fn register(h: &Harness, username: &str) -> Identity {
    let registered = h
        .users
        .register(register_request(username, "pw1"))
        .await
        .expect("registration should succeed");
    Identity::new(registered.user.id, registered.user.role)
}

// ============= Accounts =============

#[tokio::test]
async fn test_register_then_login_yields_matching_identity() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    assert_eq!(alice.role, Role::User);

    let tokens = h.users.login("alice", "pw1").await.unwrap();
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, 3600);

    let identity = h.auth.validate(&tokens.token).unwrap();
    assert_eq!(identity, alice);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness().await;
    register(&h, "alice").await;

    let unknown = h.users.login("mallory", "pw1").await.unwrap_err();
    let wrong = h.users.login("alice", "nope").await.unwrap_err();

    assert!(matches!(unknown, AppError::Unauthenticated(_)));
    assert!(matches!(wrong, AppError::Unauthenticated(_)));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let h = harness().await;

    for request in [
        register_request("", "pw1"),
        register_request("al ice", "pw1"),
        register_request("alice", ""),
        RegisterRequest {
            email: "not-an-email".to_string(),
            ..register_request("alice", "pw1")
        },
    ] {
        let result = h.users.register(request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let h = harness().await;
    register(&h, "alice").await;

    let result = h.users.register(register_request("alice", "other")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_register_with_initial_task() {
    let h = harness().await;

    let registered = h
        .users
        .register(RegisterRequest {
            initial_task: Some("  unpack  ".to_string()),
            ..register_request("alice", "pw1")
        })
        .await
        .unwrap();

    let task = registered.initial_task.expect("initial task should be created");
    assert_eq!(task.task, "unpack");
    assert_eq!(task.owner_id, registered.user.id);
}

#[tokio::test]
async fn test_register_with_blank_initial_task_creates_nothing() {
    let h = harness().await;

    let result = h
        .users
        .register(RegisterRequest {
            initial_task: Some("   ".to_string()),
            ..register_request("alice", "pw1")
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(h.db.get_user_by_username("alice").await.unwrap().is_none());
}

// ============= Tasks =============

#[tokio::test]
async fn test_task_lifecycle() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    let task = h.tasks.create(&alice, "buy milk").await.unwrap();
    assert_eq!(task.owner_id, alice.user_id);
    assert!(!task.status);

    let updated = h.tasks.update(&alice, task.id, "buy oat milk").await.unwrap();
    assert_eq!(updated.task, "buy oat milk");

    let done = h.tasks.set_status(&alice, task.id, true).await.unwrap();
    assert!(done.status);

    assert_eq!(h.tasks.list(&alice).await.unwrap().len(), 1);

    h.tasks.delete(&alice, task.id).await.unwrap();
    assert!(h.tasks.list(&alice).await.unwrap().is_empty());
    assert!(matches!(
        h.tasks.get(&alice, task.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_foreign_task_is_forbidden_everywhere() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;
    let task = h.tasks.create(&alice, "buy milk").await.unwrap();

    assert!(matches!(
        h.tasks.get(&bob, task.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.tasks.update(&bob, task.id, "mine now").await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.tasks.set_status(&bob, task.id, true).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.tasks.delete(&bob, task.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(h.tasks.list(&bob).await.unwrap().is_empty());

    let untouched = h.tasks.get(&alice, task.id).await.unwrap();
    assert_eq!(untouched.task, "buy milk");
    assert!(!untouched.status);
}

#[tokio::test]
async fn test_absent_task_is_not_found() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    assert!(matches!(
        h.tasks.get(&alice, 777).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.tasks.delete(&alice, 777).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_admin_gets_no_access_to_other_users_tasks() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let admin = h.users.create_admin("root", "", "rootpw").await.unwrap();
    let admin = Identity::new(admin.id, admin.role);

    let task = h.tasks.create(&alice, "private").await.unwrap();
    assert!(matches!(
        h.tasks.get(&admin, task.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_bulk_create_validates_before_writing() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    let texts = vec![
        "one".to_string(),
        "two".to_string(),
        " ".to_string(),
        "four".to_string(),
        "five".to_string(),
    ];
    let err = h.tasks.create_bulk(&alice, &texts).await.unwrap_err();
    match err {
        AppError::Validation(msg) => assert!(msg.starts_with("tasks[2]")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(h.tasks.list(&alice).await.unwrap().is_empty());

    assert!(matches!(
        h.tasks.create_bulk(&alice, &[]).await,
        Err(AppError::Validation(_))
    ));

    let created = h
        .tasks
        .create_bulk(&alice, &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|t| t.owner_id == alice.user_id));
}

// ============= Administration =============

#[tokio::test]
async fn test_list_users_requires_admin() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    assert!(matches!(
        h.users.list_users(&alice).await,
        Err(AppError::Forbidden(_))
    ));

    let admin = h.users.create_admin("root", "root@example.com", "rootpw").await.unwrap();
    let users = h
        .users
        .list_users(&Identity::new(admin.id, Role::Admin))
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_self_delete_is_refused_for_every_role() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let admin = h.users.create_admin("root", "", "rootpw").await.unwrap();
    let admin = Identity::new(admin.id, Role::Admin);

    assert!(matches!(
        h.users.delete_user(&alice, alice.user_id).await,
        Err(AppError::SelfDeleteForbidden)
    ));
    assert!(matches!(
        h.users.delete_user(&admin, admin.user_id).await,
        Err(AppError::SelfDeleteForbidden)
    ));
}

#[tokio::test]
async fn test_admins_cannot_delete_admins() {
    let h = harness().await;
    let first = h.users.create_admin("root", "", "rootpw").await.unwrap();
    let second = h.users.create_admin("ops", "", "opspw").await.unwrap();

    let result = h
        .users
        .delete_user(&Identity::new(first.id, Role::Admin), second.id)
        .await;

    assert!(matches!(result, Err(AppError::AdminProtected)));
    assert!(h.db.get_user_by_id(second.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_regular_user_cannot_delete_others() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;

    assert!(matches!(
        h.users.delete_user(&alice, bob.user_id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_admin_deletes_user_and_tasks() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let task = h.tasks.create(&alice, "buy milk").await.unwrap();
    let admin = h.users.create_admin("root", "", "rootpw").await.unwrap();
    let admin = Identity::new(admin.id, Role::Admin);

    h.users.delete_user(&admin, alice.user_id).await.unwrap();

    assert!(h.db.get_user_by_id(alice.user_id).await.unwrap().is_none());
    assert!(!h.db.task_exists(task.id).await.unwrap());
    assert!(matches!(
        h.users.delete_user(&admin, alice.user_id).await,
        Err(AppError::NotFound(_))
    ));
}
