//! Integration tests for POST /join

use auth_test_utils::{TestAuthServer, TokenAssertions};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_join_then_login_succeeds() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/join", server.url()))
        .json(&json!({ "username": "bob", "password": "builder123" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body, json!({ "username": "bob", "role": "user" }));

    let token = server.login("bob", "builder123").await?;
    token.assert_for_subject("bob").assert_has_role("user");

    Ok(())
}

#[tokio::test]
async fn test_join_duplicate_username_conflicts() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register_account("alice", "wonderland", "admin").await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/join", server.url()))
        .json(&json!({ "username": "alice", "password": "takeover1" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Original account is untouched
    let token = server.login("alice", "wonderland").await?;
    token.assert_has_role("admin");

    Ok(())
}

#[tokio::test]
async fn test_join_short_password_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/join", server.url()))
        .json(&json!({ "username": "carol", "password": "short" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.login("carol", "short").await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_join_cannot_choose_role() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act - extra fields are ignored
    let response = server
        .client()
        .post(format!("{}/join", server.url()))
        .json(&json!({ "username": "dave", "password": "password1", "role": "admin" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = server.login("dave", "password1").await?;
    token.assert_has_role("user");

    Ok(())
}
