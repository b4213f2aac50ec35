//! Integration tests for POST /login
//!
//! Covers the password exchange end to end: credential verification, token
//! issuance and the response shape.

use auth_test_utils::{TestAuthServer, TokenAssertions};
use reqwest::{header, StatusCode};
use serde_json::json;

/// Test that a correct password yields a bearer token in body and header.
#[tokio::test]
async fn test_login_valid_credentials_returns_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "user").await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/login", server.url()))
        .json(&json!({ "username": "alice", "password": "wonderland" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    let header_value = response
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("Login response should carry an Authorization header");

    let body: serde_json::Value = response.json().await?;
    let token = body["access_token"].as_str().expect("access_token").to_string();

    assert_eq!(header_value, format!("Bearer {token}"));
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    token
        .assert_valid_jwt()
        .assert_algorithm("HS256")
        .assert_for_subject("alice")
        .assert_has_role("user")
        .assert_expires_in(3600);

    Ok(())
}

/// Test that wrong password and unknown user are indistinguishable.
#[tokio::test]
async fn test_login_bad_credentials_are_indistinguishable() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "user").await?;
    let client = server.client();

    // Act
    let wrong_password = client
        .post(format!("{}/login", server.url()))
        .json(&json!({ "username": "alice", "password": "looking-glass" }))
        .send()
        .await?;
    let unknown_user = client
        .post(format!("{}/login", server.url()))
        .json(&json!({ "username": "mallory", "password": "wonderland" }))
        .send()
        .await?;

    // Assert
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let wrong_body: serde_json::Value = wrong_password.json().await?;
    let unknown_body: serde_json::Value = unknown_user.json().await?;
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"]["code"], "INVALID_CREDENTIALS");

    Ok(())
}

/// Test that form-encoded credentials are not accepted.
#[tokio::test]
async fn test_login_form_body_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "user").await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/login", server.url()))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("username=alice&password=wonderland")
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    Ok(())
}

/// Test that the configured lifetime is reflected in the token.
#[tokio::test]
async fn test_login_honors_configured_ttl() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn_with(&[("TOKEN_TTL_SECONDS", "120")]).await?;
    server.register_account("alice", "wonderland", "user").await?;

    // Act
    let token = server.login("alice", "wonderland").await?;

    // Assert
    token.assert_valid_jwt().assert_expires_in(120);

    Ok(())
}

/// Test that HS384 deployments issue HS384 tokens.
#[tokio::test]
async fn test_login_with_hs384_algorithm() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn_with(&[("JWT_ALGORITHM", "HS384")]).await?;
    server.register_account("alice", "wonderland", "user").await?;

    // Act
    let token = server.login("alice", "wonderland").await?;
    let response = server
        .client()
        .get(format!("{}/account", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    // Assert
    token.assert_valid_jwt().assert_algorithm("HS384");
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// Test that seed accounts from configuration can log in with their role.
#[tokio::test]
async fn test_login_seeded_account() -> Result<(), anyhow::Error> {
    // Arrange
    let server =
        TestAuthServer::spawn_with(&[("SEED_USERS", "root:toor-toor:admin;guest:guest-pass:user")])
            .await?;

    // Act
    let root = server.login("root", "toor-toor").await?;
    let guest = server.login("guest", "guest-pass").await?;

    // Assert
    root.assert_for_subject("root").assert_has_role("admin");
    guest.assert_for_subject("guest").assert_has_role("user");

    Ok(())
}
