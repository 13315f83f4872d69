//! End-to-end flows through the auth service facade

mod common;

use chrono::Duration;

use common::{harness, harness_with, TEST_SECRET};
use lumen_auth_core::{AuthConfig, AuthError, Environment};
use lumen_types::{AuthProvider, Clock, EntitlementStatus, Plan, Platform};

#[tokio::test]
async fn test_magic_link_login_end_to_end() {
    let h = harness();

    let token = h
        .service
        .request_magic_link("Alice@Example.com", Some("en".into()), "10.0.0.1")
        .await
        .unwrap();
    let (identity, session) = h.service.redeem_magic_link(&token).await.unwrap();

    assert_eq!(identity.email, "alice@example.com");
    assert_eq!(identity.origin_provider, AuthProvider::MagicLink);

    let resolved = h.service.resolve_session(&session).unwrap();
    assert_eq!(resolved.id, identity.id);
}

#[tokio::test]
async fn test_magic_link_replay_denied() {
    let h = harness();

    let token = h
        .service
        .request_magic_link("alice@example.com", None, "10.0.0.1")
        .await
        .unwrap();
    assert!(h.service.redeem_magic_link(&token).await.is_ok());

    let replay = h.service.redeem_magic_link(&token).await;
    assert!(matches!(replay, Err(AuthError::AlreadyConsumed)));
    assert!(replay.unwrap_err().is_unauthenticated());
}

#[tokio::test]
async fn test_expired_magic_link_denied() {
    let h = harness();

    let token = h
        .service
        .request_magic_link("alice@example.com", None, "10.0.0.1")
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(16));

    assert!(matches!(
        h.service.redeem_magic_link(&token).await,
        Err(AuthError::Expired)
    ));
}

#[tokio::test]
async fn test_magic_link_rate_limit_per_client() {
    let h = harness();

    for _ in 0..5 {
        h.service
            .request_magic_link("alice@example.com", None, "10.0.0.1")
            .await
            .unwrap();
    }
    let sixth = h
        .service
        .request_magic_link("alice@example.com", None, "10.0.0.1")
        .await;
    assert!(matches!(sixth, Err(AuthError::RateLimited)));

    // An unrelated client is not affected
    assert!(h
        .service
        .request_magic_link("bob@example.com", None, "10.0.0.2")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_magic_link_rate_limit_window_slides() {
    let h = harness();

    for _ in 0..5 {
        h.service
            .request_magic_link("alice@example.com", None, "10.0.0.1")
            .await
            .unwrap();
    }
    h.clock.advance(Duration::seconds(61));

    assert!(h
        .service
        .request_magic_link("alice@example.com", None, "10.0.0.1")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_oauth_start_rate_limit_per_client() {
    let h = harness();

    for _ in 0..5 {
        h.service.begin_oauth(None, "10.0.0.1").unwrap();
    }
    assert!(matches!(
        h.service.begin_oauth(None, "10.0.0.1"),
        Err(AuthError::RateLimited)
    ));

    // Unrelated client unaffected; magic-link buckets are independent
    assert!(h.service.begin_oauth(None, "10.0.0.2").is_ok());
    assert!(h
        .service
        .request_magic_link("alice@example.com", None, "10.0.0.1")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_oauth_login_end_to_end() {
    let h = harness();

    let state = h.service.begin_oauth(Some("fr".into()), "10.0.0.1").unwrap();
    let locale = h.service.consume_oauth_state(&state).unwrap();
    assert_eq!(locale.as_deref(), Some("fr"));

    let (identity, session) = h
        .service
        .oauth_login("Carol@Example.com", locale)
        .await
        .unwrap();
    assert_eq!(identity.email, "carol@example.com");
    assert_eq!(identity.origin_provider, AuthProvider::Google);
    assert!(h.service.resolve_session(&session).is_ok());
}

#[tokio::test]
async fn test_oauth_state_expires() {
    let h = harness();

    let state = h.service.begin_oauth(None, "10.0.0.1").unwrap();
    h.clock.advance(Duration::minutes(11));

    assert!(matches!(
        h.service.consume_oauth_state(&state),
        Err(AuthError::Expired)
    ));
}

#[tokio::test]
async fn test_same_email_same_identity_across_providers() {
    let h = harness();

    let token = h
        .service
        .request_magic_link("dana@example.com", None, "10.0.0.1")
        .await
        .unwrap();
    let (via_link, _) = h.service.redeem_magic_link(&token).await.unwrap();

    let (via_oauth, _) = h
        .service
        .oauth_login("DANA@example.com", None)
        .await
        .unwrap();

    assert_eq!(via_link.id, via_oauth.id);
    // The directory keeps the first provider seen
    assert_eq!(via_oauth.origin_provider, AuthProvider::MagicLink);
}

#[tokio::test]
async fn test_session_outlives_restart() {
    // Stateless sessions resolve on any instance that holds the secret
    let h = harness();
    let (_, session) = h.service.oauth_login("eve@example.com", None).await.unwrap();

    let other = harness();
    assert!(other.service.resolve_session(&session).is_ok());
}

#[tokio::test]
async fn test_secret_rotation_grace() {
    let old = harness();
    let (_, session) = old.service.oauth_login("frank@example.com", None).await.unwrap();

    // A restarted deployment mints with the new secret but still
    // verifies tokens signed with the old one.
    let rotated = harness_with(
        AuthConfig::new(
            Environment::Development,
            vec![
                "rotated-secret-rotated-secret-rotated".to_string(),
                TEST_SECRET.to_string(),
            ],
        )
        .unwrap(),
    );
    assert!(rotated.service.resolve_session(&session).is_ok());

    // Dropping the old secret invalidates old tokens
    let dropped = harness_with(
        AuthConfig::new(
            Environment::Development,
            vec!["rotated-secret-rotated-secret-rotated".to_string()],
        )
        .unwrap(),
    );
    assert!(matches!(
        dropped.service.resolve_session(&session),
        Err(AuthError::SignatureMismatch)
    ));
}

#[tokio::test]
async fn test_entitlement_defaults_to_free() {
    let h = harness();
    let (identity, _) = h.service.oauth_login("gabe@example.com", None).await.unwrap();

    let record = h.service.entitlement_or_default(identity.id).await.unwrap();
    assert_eq!(record.plan, Plan::Free);
    assert_eq!(record.status, EntitlementStatus::Active);
    // Active but free: no paid access
    assert!(!record.is_entitled());

    // The default is persisted, not re-derived
    let again = h.service.entitlement_or_default(identity.id).await.unwrap();
    assert_eq!(again.id, record.id);
}

#[tokio::test]
async fn test_purchase_upgrades_entitlement() {
    let h = harness();
    let (identity, _) = h.service.oauth_login("hana@example.com", None).await.unwrap();
    let free = h.service.entitlement_or_default(identity.id).await.unwrap();

    let renew_at = h.clock.now() + Duration::days(30);
    let upgraded = h
        .service
        .record_purchase(identity.id, Plan::Pro, Platform::Ios, "com.lumen.pro", renew_at)
        .await
        .unwrap();

    assert_eq!(upgraded.id, free.id);
    assert_eq!(upgraded.plan, Plan::Pro);
    assert_eq!(upgraded.product_id.as_deref(), Some("com.lumen.pro"));
    assert!(upgraded.is_entitled());
}

#[tokio::test]
async fn test_failures_collapse_to_unauthenticated() {
    let h = harness();

    let cases: Vec<AuthError> = vec![
        h.service.resolve_session("not-a-token").unwrap_err(),
        h.service.resolve_session("").unwrap_err(),
        h.service.redeem_magic_link("a.b").await.unwrap_err(),
    ];
    for err in cases {
        assert!(err.is_unauthenticated());
        assert_eq!(err.status_code(), 401);
    }
}
