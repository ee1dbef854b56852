//! Integration tests for login, lockout, and account status.

mod helpers;

use chrono::Duration;

use helpers::{PASSWORD, TestApp};
use pawhaven_auth::{AccountRepository, AuthError, SessionRepository};
use pawhaven_core::clock::Clock;
use pawhaven_entity::account::AccountStatus;

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    let registered = app.register("robin@example.com").await;

    let result = app.login_ok("robin@example.com").await;

    assert_eq!(result.account.id, registered.id);
    assert_eq!(result.session.user_id, registered.id);
    assert_eq!(result.session.auth_entity, "users");
    assert!(result.session.is_active);
    assert!(!result.tokens.access_token.is_empty());
    assert!(result.tokens.refresh_token.is_some());

    let account = app.account("robin@example.com").await;
    assert_eq!(account.core.login_count, 1);
    assert_eq!(account.core.last_login_at, Some(app.clock.now()));
    assert_eq!(account.core.last_login_ip.as_deref(), Some("192.0.2.10"));
    assert_eq!(account.core.last_user_agent.as_deref(), Some("TestAgent/1.0"));
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let app = TestApp::new();
    app.register("robin@example.com").await;

    assert!(app.login("  Robin@Example.COM ", PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new();
    app.register("robin@example.com").await;

    let wrong = app.login("robin@example.com", "nope").await.unwrap_err();
    let unknown = app.login("nobody@example.com", PASSWORD).await.unwrap_err();

    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn test_sixth_attempt_is_locked_even_with_correct_password() {
    let app = TestApp::new();
    app.register("robin@example.com").await;

    for _ in 0..5 {
        let err = app.login("robin@example.com", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    let err = app.login("robin@example.com", PASSWORD).await.unwrap_err();
    match err {
        AuthError::AccountLocked { until } => {
            assert_eq!(until, app.clock.now() + Duration::minutes(15));
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }

    let account = app.account("robin@example.com").await;
    assert_eq!(account.core.login_attempts, 5);
    assert_eq!(app.sessions.active_count().await, 0);
}

#[tokio::test]
async fn test_attempts_during_lock_are_not_counted() {
    let app = TestApp::new();
    app.register("robin@example.com").await;
    for _ in 0..5 {
        let _ = app.login("robin@example.com", "wrong-password").await;
    }
    let locked_until = app.account("robin@example.com").await.core.locked_until;

    app.clock.advance(Duration::minutes(5));
    let err = app.login("robin@example.com", "wrong-password").await.unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { .. }));

    let account = app.account("robin@example.com").await;
    assert_eq!(account.core.login_attempts, 5);
    assert_eq!(account.core.locked_until, locked_until);
}

#[tokio::test]
async fn test_lock_expires() {
    let app = TestApp::new();
    app.register("robin@example.com").await;
    for _ in 0..5 {
        let _ = app.login("robin@example.com", "wrong-password").await;
    }

    app.clock.advance(Duration::minutes(15));
    app.login_ok("robin@example.com").await;

    let account = app.account("robin@example.com").await;
    assert_eq!(account.core.login_attempts, 0);
    assert_eq!(account.core.locked_until, None);
}

#[tokio::test]
async fn test_failure_after_lock_expiry_starts_a_new_window() {
    let app = TestApp::new();
    app.register("robin@example.com").await;
    for _ in 0..5 {
        let _ = app.login("robin@example.com", "wrong-password").await;
    }
    app.clock.advance(Duration::minutes(20));

    let err = app.login("robin@example.com", "wrong-password").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let account = app.account("robin@example.com").await;
    assert_eq!(account.core.login_attempts, 1);
    assert!(app.login("robin@example.com", PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_success_resets_attempt_counter() {
    let app = TestApp::new();
    app.register("robin@example.com").await;

    for _ in 0..4 {
        let _ = app.login("robin@example.com", "wrong-password").await;
    }
    app.login_ok("robin@example.com").await;
    assert_eq!(app.account("robin@example.com").await.core.login_attempts, 0);

    for _ in 0..4 {
        let _ = app.login("robin@example.com", "wrong-password").await;
    }
    assert!(app.login("robin@example.com", PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_banned_account_cannot_login() {
    let app = TestApp::new();
    app.register("robin@example.com").await;
    let mut account = app.account("robin@example.com").await;
    account.core.status = AccountStatus::Banned;
    app.accounts.save(&account).await.unwrap();

    let err = app.login("robin@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::AccountInactiveOrDeleted));

    let err = app.login("robin@example.com", "wrong-password").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(app.account("robin@example.com").await.core.login_attempts, 0);
}

#[tokio::test]
async fn test_deleted_account_cannot_login() {
    let app = TestApp::new();
    let registered = app.register("robin@example.com").await;
    let login = app.login_ok("robin@example.com").await;

    app.service.delete_account(registered.id).await.unwrap();

    let err = app.login("robin@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::AccountInactiveOrDeleted));

    let session = app.sessions.find_by_id(login.session.id).await.unwrap().unwrap();
    assert!(!session.is_active);
    assert!(app.account("robin@example.com").await.is_deleted());
}

#[tokio::test]
async fn test_public_view_hides_security_state() {
    let app = TestApp::new();
    app.register("robin@example.com").await;
    let _ = app.login("robin@example.com", "wrong-password").await;
    let result = app.login_ok("robin@example.com").await;

    let json = serde_json::to_value(&result.account).unwrap();
    let object = json.as_object().unwrap();
    for hidden in [
        "password_hash",
        "verification",
        "password_reset",
        "login_attempts",
        "locked_until",
        "last_login_ip",
        "last_user_agent",
    ] {
        assert!(!object.contains_key(hidden), "{hidden} leaked");
    }
    assert_eq!(object["email"], "robin@example.com");
}
