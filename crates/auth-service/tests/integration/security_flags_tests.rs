//! Integration tests for the CSRF and stateless-session switches

use auth_test_utils::TestAuthServer;
use reqwest::{header, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_csrf_disabled_by_default() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/join", server.url()))
        .json(&json!({ "username": "erin", "password": "password1" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    Ok(())
}

#[tokio::test]
async fn test_csrf_enabled_requires_header() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn_with(&[("DISABLE_CSRF", "false")]).await?;
    server.register_account("alice", "wonderland", "user").await?;
    let client = server.client();
    let credentials = json!({ "username": "alice", "password": "wonderland" });

    // Act
    let without_header = client
        .post(format!("{}/login", server.url()))
        .json(&credentials)
        .send()
        .await?;
    let with_header = client
        .post(format!("{}/login", server.url()))
        .header("X-Requested-With", "XMLHttpRequest")
        .json(&credentials)
        .send()
        .await?;

    // Assert
    assert_eq!(without_header.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = without_header.json().await?;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(with_header.status(), StatusCode::OK);

    Ok(())
}
