//! Integration tests for the session lifecycle.

mod helpers;

use chrono::Duration;

use helpers::{PASSWORD, TestApp};
use pawhaven_auth::{AccountRepository, AuthError, LoginRequest, SessionRepository};
use pawhaven_core::clock::Clock;
use pawhaven_core::config::AppConfig;
use pawhaven_core::types::id::SessionId;
use pawhaven_entity::account::AccountStatus;
use pawhaven_entity::session::Session;

async fn stored(app: &TestApp, id: SessionId) -> Session {
    app.sessions
        .find_by_id(id)
        .await
        .unwrap()
        .expect("Session not found")
}

fn assert_unchanged(before: &Session, after: &Session) {
    assert_eq!(before.is_active, after.is_active);
    assert_eq!(before.access_token_digest, after.access_token_digest);
    assert_eq!(before.access_token_expires, after.access_token_expires);
    assert_eq!(before.refresh, after.refresh);
    assert_eq!(before.last_activity, after.last_activity);
    assert_eq!(before.updated_at, after.updated_at);
}

#[tokio::test]
async fn test_second_device_replaces_first_session() {
    let app = TestApp::new();
    app.register("kai@example.com").await;

    let phone = app
        .service
        .login(LoginRequest {
            device_name: Some("Kai's phone".into()),
            device_type: Some("mobile".into()),
            ..LoginRequest::new("kai@example.com", PASSWORD)
        })
        .await
        .unwrap();
    app.clock.advance(Duration::minutes(1));
    let laptop = app.login_ok("kai@example.com").await;

    assert!(!stored(&app, phone.session.id).await.is_active);
    assert!(stored(&app, laptop.session.id).await.is_active);
    assert_eq!(app.sessions.active_count().await, 1);

    assert!(matches!(
        app.service.validate_access_token(&phone.tokens.access_token).await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(
        app.service
            .validate_access_token(&laptop.tokens.access_token)
            .await
            .is_ok()
    );

    let history = app
        .service
        .sessions()
        .list_sessions(&app.account("kai@example.com").await.session_key())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].device_name.as_deref(), Some("Kai's phone"));
}

#[tokio::test]
async fn test_access_token_expires_after_one_hour() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;

    app.clock.advance(Duration::minutes(59));
    assert!(
        app.service
            .validate_access_token(&login.tokens.access_token)
            .await
            .is_ok()
    );

    app.clock.advance(Duration::minutes(1));
    assert!(matches!(
        app.service.validate_access_token(&login.tokens.access_token).await,
        Err(AuthError::TokenExpired)
    ));
    assert!(stored(&app, login.session.id).await.is_active);
}

#[tokio::test]
async fn test_garbage_access_token_is_invalid() {
    let app = TestApp::new();
    assert!(matches!(
        app.service.validate_access_token("definitely.not.valid").await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let old_refresh = login.tokens.refresh_token.clone().unwrap();

    app.clock.advance(Duration::minutes(55));
    let refreshed = app.service.refresh(&old_refresh).await.unwrap();

    assert_eq!(refreshed.session.id, login.session.id);
    assert_eq!(
        refreshed.tokens.access_token_expires,
        app.clock.now() + Duration::hours(1)
    );
    let new_refresh = refreshed.tokens.refresh_token.clone().unwrap();
    assert_ne!(new_refresh, old_refresh);

    assert!(matches!(
        app.service.refresh(&old_refresh).await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(app.service.refresh(&new_refresh).await.is_ok());
}

#[tokio::test]
async fn test_refresh_without_rotation() {
    let mut config = AppConfig::default();
    config.session.rotate_refresh_tokens = false;
    let app = TestApp::with_config(config);
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let refresh_token = login.tokens.refresh_token.clone().unwrap();

    let refreshed = app.service.refresh(&refresh_token).await.unwrap();
    assert!(refreshed.tokens.refresh_token.is_none());
    assert!(app.service.refresh(&refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_unknown_refresh_token_changes_nothing() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let before = stored(&app, login.session.id).await;

    app.clock.advance(Duration::minutes(5));
    assert!(matches!(
        app.service.refresh("not-a-real-refresh-token").await,
        Err(AuthError::TokenInvalid)
    ));

    assert_unchanged(&before, &stored(&app, login.session.id).await);
}

#[tokio::test]
async fn test_expired_refresh_token_changes_nothing() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let before = stored(&app, login.session.id).await;

    app.clock.advance(Duration::days(7));
    let refresh_token = login.tokens.refresh_token.unwrap();
    assert!(matches!(
        app.service.refresh(&refresh_token).await,
        Err(AuthError::TokenExpired)
    ));

    assert_unchanged(&before, &stored(&app, login.session.id).await);
}

#[tokio::test]
async fn test_refresh_of_replaced_session_is_invalid() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let first = app.login_ok("kai@example.com").await;
    app.login_ok("kai@example.com").await;

    let refresh_token = first.tokens.refresh_token.unwrap();
    assert!(matches!(
        app.service.refresh(&refresh_token).await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn test_refresh_refused_for_inactive_account() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let before = stored(&app, login.session.id).await;

    let mut account = app.account("kai@example.com").await;
    account.core.status = AccountStatus::Inactive;
    app.accounts.save(&account).await.unwrap();

    let refresh_token = login.tokens.refresh_token.unwrap();
    assert!(matches!(
        app.service.refresh(&refresh_token).await,
        Err(AuthError::AccountInactiveOrDeleted)
    ));
    assert_unchanged(&before, &stored(&app, login.session.id).await);
}

#[tokio::test]
async fn test_stale_refresh_hides_account_status() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let first = app.login_ok("kai@example.com").await;
    let replaced_token = first.tokens.refresh_token.unwrap();

    app.clock.advance(Duration::minutes(1));
    let second = app.login_ok("kai@example.com").await;
    let current_token = second.tokens.refresh_token.unwrap();

    let mut account = app.account("kai@example.com").await;
    account.core.status = AccountStatus::Banned;
    app.accounts.save(&account).await.unwrap();

    assert!(matches!(
        app.service.refresh(&replaced_token).await,
        Err(AuthError::TokenInvalid)
    ));

    app.clock.advance(Duration::days(8));
    assert!(matches!(
        app.service.refresh(&current_token).await,
        Err(AuthError::TokenExpired)
    ));
}

#[tokio::test]
async fn test_logout() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;

    app.clock.advance(Duration::minutes(3));
    app.service.logout(login.session.id).await.unwrap();

    let session = stored(&app, login.session.id).await;
    assert!(!session.is_active);
    assert_eq!(session.last_activity, app.clock.now());

    assert!(app.service.logout(login.session.id).await.is_ok());
    assert!(matches!(
        app.service.logout(SessionId::new()).await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(matches!(
        app.service.validate_access_token(&login.tokens.access_token).await,
        Err(AuthError::TokenInvalid)
    ));
    assert!(matches!(
        app.service.refresh(&login.tokens.refresh_token.unwrap()).await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn test_update_activity_never_fails() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;

    app.clock.advance(Duration::minutes(10));
    app.service
        .update_activity(login.session.id, Some("203.0.113.5"), Some("Safari"))
        .await;
    let session = stored(&app, login.session.id).await;
    assert_eq!(session.last_activity, app.clock.now());
    assert_eq!(session.device.ip_address.as_deref(), Some("203.0.113.5"));
    assert_eq!(session.device.user_agent.as_deref(), Some("Safari"));

    app.service.logout(login.session.id).await.unwrap();
    app.service
        .update_activity(login.session.id, Some("198.51.100.1"), None)
        .await;
    app.service.update_activity(SessionId::new(), None, None).await;

    let session = stored(&app, login.session.id).await;
    assert!(!session.is_active);
    assert_eq!(session.device.ip_address.as_deref(), Some("203.0.113.5"));
}

#[tokio::test]
async fn test_needs_refresh_is_advisory() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    let session = stored(&app, login.session.id).await;
    let manager = app.service.sessions();

    assert!(!manager.needs_refresh(&session, None));
    app.clock.advance(Duration::minutes(45));
    assert!(manager.needs_refresh(&session, None));
    assert!(!manager.needs_refresh(&session, Some(5)));
    assert!(
        app.service
            .validate_access_token(&login.tokens.access_token)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_cleanup_deactivates_expired_sessions() {
    let app = TestApp::new();
    app.register("kai@example.com").await;
    app.register("lena@example.com").await;
    let kai = app.login_ok("kai@example.com").await;
    app.clock.advance(Duration::days(3));
    let lena = app.login_ok("lena@example.com").await;
    let cleanup = app.service.cleanup();

    assert_eq!(cleanup.run_cleanup().await.unwrap(), 0);

    app.clock.advance(Duration::days(4));
    assert_eq!(cleanup.run_cleanup().await.unwrap(), 1);
    assert!(!stored(&app, kai.session.id).await.is_active);
    assert!(stored(&app, lena.session.id).await.is_active);
}

#[tokio::test]
async fn test_absolute_timeout_caps_session_lifetime() {
    let mut config = AppConfig::default();
    config.session.absolute_timeout_hours = Some(2);
    let app = TestApp::with_config(config);
    app.register("kai@example.com").await;
    let login = app.login_ok("kai@example.com").await;
    assert_eq!(
        login.session.expires_at,
        Some(app.clock.now() + Duration::hours(2))
    );

    app.clock.advance(Duration::minutes(90));
    let refreshed = app
        .service
        .refresh(&login.tokens.refresh_token.unwrap())
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(30));
    assert!(matches!(
        app.service
            .refresh(&refreshed.tokens.refresh_token.unwrap())
            .await,
        Err(AuthError::TokenExpired)
    ));
}
