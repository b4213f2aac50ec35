//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real auth service instances in tests.

use crate::crypto_fixtures::test_signing_key_base64;
use auth_service::config::{Config, MIN_BCRYPT_COST};
use auth_service::credentials::InMemoryCredentialStore;
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::routes::{self, AppState};
use common::secret::{ExposeSecret, SecretString};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestAuthServer::spawn().await?;
///     server.register_account("alice", "wonderland", "user").await?;
///
///     let response = server
///         .client()
///         .get(format!("{}/account", server.url()))
///         .bearer_auth(server.login("alice", "wonderland").await?)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(&[]).await
    }

    /// Spawn a server with extra environment-style settings layered over the
    /// test defaults.
    ///
    /// The server will:
    /// - Sign with the seed-1 fixture key unless `JWT_SIGNING_KEY` is given
    /// - Use the minimum bcrypt cost unless `BCRYPT_COST` is given
    /// - Register any `SEED_USERS`
    /// - Bind to a random available port (127.0.0.1:0)
    pub async fn spawn_with(vars: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let mut env: HashMap<String, String> = HashMap::from([
            ("JWT_SIGNING_KEY".to_string(), test_signing_key_base64(1)),
            ("BCRYPT_COST".to_string(), MIN_BCRYPT_COST.to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);
        for (key, value) in vars {
            env.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&env)
            .map_err(|e| anyhow::anyhow!("Invalid test configuration: {}", e))?;

        let state = AppState::new(config, Arc::new(InMemoryCredentialStore::new()))
            .map_err(|e| anyhow::anyhow!("Failed to build application state: {}", e))?;
        state
            .verifier
            .seed(&state.config.seed_users)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed accounts: {}", e))?;
        let state = Arc::new(state);

        // Initialize metrics recorder for test server
        // Note: This may fail if already installed in the test process.
        // In that case, we create a new recorder without installing it globally.
        let metrics_handle = if state.config.metrics_enabled {
            Some(match init_metrics_recorder() {
                Ok(handle) => handle,
                Err(_) => {
                    use metrics_exporter_prometheus::PrometheusBuilder;
                    let recorder = PrometheusBuilder::new().build_recorder();
                    recorder.handle()
                }
            })
        } else {
            None
        };

        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind(state.config.bind_address.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Get the shared application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Raw signing key, for forging tokens the server will accept
    pub fn signing_key(&self) -> Vec<u8> {
        self.state.config.signing_key.expose_secret().clone()
    }

    /// A fresh HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    /// Register an account directly through the credential verifier.
    pub async fn register_account(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<(), anyhow::Error> {
        self.state
            .verifier
            .register(username, &SecretString::from(password), role)
            .await?;
        Ok(())
    }

    /// Log in over HTTP and return the issued token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, anyhow::Error> {
        let response = self
            .client()
            .post(format!("{}/login", self.url()))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Login failed with status {}", status);
        }

        let body: serde_json::Value = response.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Login response has no access_token"))
    }
}
