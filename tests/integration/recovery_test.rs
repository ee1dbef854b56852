//! Integration tests for registration, email verification, and password reset.

mod helpers;

use chrono::Duration;

use helpers::{NEW_PASSWORD, PASSWORD, TestApp};
use pawhaven_auth::{AuthError, SessionRepository};
use pawhaven_entity::account::{AccountKind, NewAccount};

#[tokio::test]
async fn test_register_creates_unverified_account_and_sends_code() {
    let app = TestApp::new();
    let account = app.register("  Ana.Silva@Example.com ").await;

    assert_eq!(account.email, "ana.silva@example.com");
    assert!(!account.is_email_verified);
    assert_eq!(account.auth_entity, "users");

    let code = app.delivery.last_code("ana.silva@example.com").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let stored = app.account("ana.silva@example.com").await;
    assert_ne!(stored.core.password_hash, PASSWORD);
    assert_ne!(stored.core.verification.as_ref().unwrap().digest, code);
}

#[tokio::test]
async fn test_register_vendor_uses_its_own_session_namespace() {
    let app = TestApp::new();
    let input = NewAccount {
        kind: AccountKind::Vendor {
            organization: Some("Happy Tails Supply".into()),
        },
        ..NewAccount::user("shop@example.com", "Dee", "Morgan")
    };
    let account = app.service.register(input, PASSWORD).await.unwrap();
    assert_eq!(account.auth_entity, "vendors");

    let login = app.login_ok("shop@example.com").await;
    assert_eq!(login.session.auth_entity, "vendors");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    app.register("ana@example.com").await;

    let duplicate = app
        .service
        .register(NewAccount::user("ANA@example.com", "Ana", "Silva"), PASSWORD)
        .await;
    assert!(matches!(duplicate, Err(AuthError::Validation(_))));

    let weak = app
        .service
        .register(NewAccount::user("weak@example.com", "Wes", "Kim"), "password")
        .await;
    assert!(matches!(weak, Err(AuthError::Validation(_))));

    let bad_email = app
        .service
        .register(NewAccount::user("not-an-email", "Wes", "Kim"), PASSWORD)
        .await;
    assert!(matches!(bad_email, Err(AuthError::Validation(_))));

    assert_eq!(app.delivery.code_count(), 1);
}

#[tokio::test]
async fn test_register_survives_delivery_failure() {
    let app = TestApp::new();
    app.delivery.set_failing(true);

    let account = app
        .service
        .register(NewAccount::user("ana@example.com", "Ana", "Silva"), PASSWORD)
        .await
        .unwrap();
    assert_eq!(account.email, "ana@example.com");
    assert_eq!(app.delivery.code_count(), 0);
    assert!(app.account("ana@example.com").await.core.verification.is_some());

    app.delivery.set_failing(false);
    app.service.request_verification("ana@example.com").await.unwrap();
    let code = app.delivery.last_code("ana@example.com").unwrap();
    assert!(app.service.verify_account("ana@example.com", &code).await.is_ok());
}

#[tokio::test]
async fn test_verify_account_consumes_code() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let code = app.delivery.last_code("ana@example.com").unwrap();

    let verified = app.service.verify_account("ana@example.com", &code).await.unwrap();
    assert!(verified.is_email_verified);

    let stored = app.account("ana@example.com").await;
    assert!(stored.core.is_email_verified);
    assert!(stored.core.verification.is_none());

    assert!(matches!(
        app.service.verify_account("ana@example.com", &code).await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn test_wrong_code_leaves_pending_code_usable() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let code = app.delivery.last_code("ana@example.com").unwrap();
    let wrong = if code == "AAAAAA" { "BBBBBB" } else { "AAAAAA" };

    assert!(matches!(
        app.service.verify_account("ana@example.com", wrong).await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(app.service.verify_account("ana@example.com", &code).await.is_ok());
}

#[tokio::test]
async fn test_expired_code_is_rejected_and_kept() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let code = app.delivery.last_code("ana@example.com").unwrap();

    app.clock.advance(Duration::minutes(15));
    assert!(matches!(
        app.service.verify_account("ana@example.com", &code).await,
        Err(AuthError::TokenExpired)
    ));

    let stored = app.account("ana@example.com").await;
    assert!(stored.core.verification.is_some());
    assert!(!stored.core.is_email_verified);
}

#[tokio::test]
async fn test_request_verification_replaces_code() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let first = app.delivery.last_code("ana@example.com").unwrap();

    app.clock.advance(Duration::minutes(20));
    app.service.request_verification("ana@example.com").await.unwrap();
    let second = app.delivery.last_code("ana@example.com").unwrap();
    assert_eq!(app.delivery.code_count(), 2);

    if first != second {
        assert!(matches!(
            app.service.verify_account("ana@example.com", &first).await,
            Err(AuthError::TokenInvalid)
        ));
    }
    assert!(app.service.verify_account("ana@example.com", &second).await.is_ok());

    app.service.request_verification("ana@example.com").await.unwrap();
    assert_eq!(app.delivery.code_count(), 2);
}

#[tokio::test]
async fn test_secret_requests_for_unknown_email_are_silent() {
    let app = TestApp::new();

    assert!(app.service.request_verification("ghost@example.com").await.is_ok());
    assert!(app.service.request_password_reset("ghost@example.com").await.is_ok());
    assert_eq!(app.delivery.code_count(), 0);
    assert_eq!(app.delivery.reset_count(), 0);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    let login = app.login_ok("ana@example.com").await;

    app.service.request_password_reset("ana@example.com").await.unwrap();
    let token = app.delivery.last_reset_token("ana@example.com").unwrap();
    assert_eq!(token.len(), 32);

    app.service.reset_password(&token, NEW_PASSWORD).await.unwrap();

    let session = app
        .sessions
        .find_by_id(login.session.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!session.is_active);

    assert!(matches!(
        app.login("ana@example.com", PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(app.login("ana@example.com", NEW_PASSWORD).await.is_ok());

    assert!(matches!(
        app.service.reset_password(&token, PASSWORD).await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn test_reset_clears_lockout() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    for _ in 0..5 {
        let _ = app.login("ana@example.com", "wrong-password").await;
    }
    assert!(matches!(
        app.login("ana@example.com", PASSWORD).await,
        Err(AuthError::AccountLocked { .. })
    ));

    app.service.request_password_reset("ana@example.com").await.unwrap();
    let token = app.delivery.last_reset_token("ana@example.com").unwrap();
    app.service.reset_password(&token, NEW_PASSWORD).await.unwrap();

    let stored = app.account("ana@example.com").await;
    assert_eq!(stored.core.login_attempts, 0);
    assert_eq!(stored.core.locked_until, None);
    assert!(app.login("ana@example.com", NEW_PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_expired_reset_token() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    app.service.request_password_reset("ana@example.com").await.unwrap();
    let token = app.delivery.last_reset_token("ana@example.com").unwrap();

    app.clock.advance(Duration::hours(1));
    assert!(matches!(
        app.service.reset_password(&token, NEW_PASSWORD).await,
        Err(AuthError::TokenExpired)
    ));
    assert!(app.login("ana@example.com", PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_weak_new_password_keeps_token() {
    let app = TestApp::new();
    app.register("ana@example.com").await;
    app.service.request_password_reset("ana@example.com").await.unwrap();
    let token = app.delivery.last_reset_token("ana@example.com").unwrap();

    assert!(matches!(
        app.service.reset_password(&token, "short").await,
        Err(AuthError::Validation(_))
    ));
    assert!(app.service.reset_password(&token, NEW_PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_unknown_reset_token() {
    let app = TestApp::new();
    app.register("ana@example.com").await;

    assert!(matches!(
        app.service.reset_password("no-such-token", NEW_PASSWORD).await,
        Err(AuthError::TokenInvalid)
    ));
}
