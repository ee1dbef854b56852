//! Integration tests for concurrent logins, failed attempts, and refreshes.

mod helpers;

use tokio::task::JoinSet;

use helpers::{PASSWORD, TestApp};
use pawhaven_auth::{AuthError, LoginRequest};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_leave_one_active_session() {
    let app = TestApp::new();
    app.register("ana@example.com").await;

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let service = app.service.clone();
        tasks.spawn(async move {
            service
                .login(LoginRequest::new("ana@example.com", PASSWORD))
                .await
        });
    }

    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 20);
    assert_eq!(app.sessions.active_count().await, 1);
    assert_eq!(app.account("ana@example.com").await.core.login_count, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_are_all_counted() {
    let app = TestApp::new();
    app.register("ana@example.com").await;

    let mut tasks = JoinSet::new();
    for _ in 0..5 {
        let service = app.service.clone();
        tasks.spawn(async move {
            service
                .login(LoginRequest::new("ana@example.com", "Wrong-Pass-123"))
                .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(joined.unwrap().is_err());
    }

    let account = app.account("ana@example.com").await;
    assert_eq!(account.core.login_attempts, 5);
    assert!(account.core.locked_until.is_some());

    assert!(matches!(
        app.login("ana@example.com", PASSWORD).await,
        Err(AuthError::AccountLocked { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_rotates_once() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let login = app.login_ok("ana@example.com").await;
    let refresh_token = login.tokens.refresh_token.clone().unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let service = app.service.clone();
        let token = refresh_token.clone();
        tasks.spawn(async move { service.refresh(&token).await });
    }

    let mut rotated = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(result) => rotated.push(result),
            Err(e) => assert!(matches!(e, AuthError::TokenInvalid), "unexpected error: {e}"),
        }
    }

    assert_eq!(rotated.len(), 1);
    let new_token = rotated[0].tokens.refresh_token.clone().unwrap();
    assert!(app.service.refresh(&new_token).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_login_racing_delete_leaves_no_session() {
    let app = TestApp::new();
    let mut tasks = JoinSet::new();

    for i in 0..25 {
        let email = format!("member{i}@example.com");
        let account = app.register(&email).await;

        let service = app.service.clone();
        let login_email = email.clone();
        tasks.spawn(async move {
            let _ = service.login(LoginRequest::new(login_email, PASSWORD)).await;
        });
        let service = app.service.clone();
        tasks.spawn(async move {
            service.delete_account(account.id).await.unwrap();
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    assert_eq!(app.sessions.active_count().await, 0);
}
