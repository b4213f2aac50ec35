//! Integration tests for the auth gate
//!
//! Exercises `require_auth` over real HTTP with tokens issued by the service
//! and tokens forged with `TestTokenBuilder`.

use auth_test_utils::{test_signing_key, TestAuthServer, TestTokenBuilder};
use chrono::Utc;
use jsonwebtoken::Algorithm;
use reqwest::{header, StatusCode};

async fn account_status(server: &TestAuthServer, token: &str) -> Result<StatusCode, anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/account", server.url()))
        .bearer_auth(token)
        .send()
        .await?;
    Ok(response.status())
}

#[tokio::test]
async fn test_gate_valid_token_reaches_handler() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "admin").await?;
    let token = server.login("alice", "wonderland").await?;

    // Act
    let response = server
        .client()
        .get(format!("{}/account", server.url()))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["subject"], "alice");
    assert_eq!(body["role"], "admin");

    Ok(())
}

#[tokio::test]
async fn test_gate_missing_token_returns_401_with_challenge() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .client()
        .get(format!("{}/account", server.url()))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(challenge.starts_with("Bearer"), "Unexpected challenge: {challenge}");

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    Ok(())
}

#[tokio::test]
async fn test_gate_forged_tokens_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let key = server.signing_key();

    let cases = [
        (
            "expired",
            TestTokenBuilder::new().for_user("alice").expires_in(-10).sign(&key),
        ),
        (
            "wrong key",
            TestTokenBuilder::new().for_user("alice").sign(&test_signing_key(2)),
        ),
        (
            "alg none",
            TestTokenBuilder::new().for_user("alice").sign_unsecured(),
        ),
        (
            "other algorithm",
            TestTokenBuilder::new()
                .for_user("alice")
                .sign_with(Algorithm::HS512, &key),
        ),
        (
            "missing role",
            TestTokenBuilder::new().for_user("alice").without_role().sign(&key),
        ),
        (
            "missing subject",
            TestTokenBuilder::new().without_subject().sign(&key),
        ),
        ("garbage", "not-a-jwt".to_string()),
    ];

    // Act & Assert
    for (name, token) in cases {
        assert_eq!(
            account_status(&server, &token).await?,
            StatusCode::UNAUTHORIZED,
            "{name} token should be rejected"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_gate_tampered_payload_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "user").await?;
    let token = server.login("alice", "wonderland").await?;

    // Swap in a payload claiming the admin role, keeping the original signature
    let forged = TestTokenBuilder::new()
        .for_user("alice")
        .with_role("admin")
        .sign(&test_signing_key(9));
    let mut original = token.split('.');
    let mut replacement = forged.split('.');
    let tampered = format!(
        "{}.{}.{}",
        original.next().unwrap(),
        replacement.nth(1).unwrap(),
        original.nth(1).unwrap()
    );

    // Act & Assert
    assert_eq!(account_status(&server, &token).await?, StatusCode::OK);
    assert_eq!(
        account_status(&server, &tampered).await?,
        StatusCode::UNAUTHORIZED
    );

    Ok(())
}

#[tokio::test]
async fn test_gate_forged_with_server_key_accepted() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("ops")
        .with_role("admin")
        .sign(&server.signing_key());

    // Act & Assert
    assert_eq!(account_status(&server, &token).await?, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_gate_unknown_path_depends_on_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new().sign(&server.signing_key());
    let client = server.client();

    // Act
    let anonymous = client
        .get(format!("{}/no/such/route", server.url()))
        .send()
        .await?;
    let authenticated = client
        .get(format!("{}/no/such/route", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    // Assert
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(authenticated.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_gate_public_path_ignores_bad_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .client()
        .get(format!("{}/", server.url()))
        .bearer_auth("garbage")
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_gate_clock_skew_tolerates_future_iat() -> Result<(), anyhow::Error> {
    // Arrange
    let strict = TestAuthServer::spawn().await?;
    let lenient = TestAuthServer::spawn_with(&[("JWT_CLOCK_SKEW_SECONDS", "120")]).await?;
    let now = Utc::now().timestamp();
    let token = TestTokenBuilder::new()
        .issued_at(now + 60)
        .expires_at(now + 3600)
        .sign(&strict.signing_key());

    // Act & Assert - both servers share the fixture key
    assert_eq!(
        account_status(&strict, &token).await?,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(account_status(&lenient, &token).await?, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_gate_metrics_endpoint_public_when_enabled() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn_with(&[("METRICS_ENABLED", "true")]).await?;

    // Act
    let response = server
        .client()
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
