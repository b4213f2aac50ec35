//! HTTP routes for the auth service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::credentials::{CredentialStore, CredentialVerifier};
use crate::gate::AuthGate;
use crate::handlers;
use crate::middleware::{apply_security_flags, require_auth, AuthState};
use crate::token::{ClaimsPolicy, TokenCodec, TokenError};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout applied to every route.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// Everything here is immutable after startup; the credential store behind
/// the verifier handles its own locking.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token signer/verifier built from the configured key.
    pub codec: Arc<TokenCodec>,

    /// Password verification and account registration.
    pub verifier: Arc<CredentialVerifier>,

    /// Per-request authorization decision.
    pub gate: Arc<AuthGate>,
}

impl AppState {
    /// Build the codec, gate and verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `WeakKey` if the signing key is too short for the algorithm.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, TokenError> {
        let codec = Arc::new(TokenCodec::new(config.jwt_algorithm, &config.signing_key)?);
        let policy = ClaimsPolicy::new(config.jwt_clock_skew());
        let gate = Arc::new(AuthGate::new(
            Arc::clone(&codec),
            policy,
            config.public_paths.iter().cloned(),
        ));
        let verifier = Arc::new(CredentialVerifier::new(store, config.bcrypt_cost));

        Ok(Self {
            config,
            codec,
            verifier,
            gate,
        })
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/` - Banner (public)
/// - `/login` - Exchange username/password for a bearer token (public)
/// - `/join` - Create an account (public)
/// - `/account` - Current principal (authenticated)
/// - `/metrics` - Prometheus metrics, only when enabled (public)
///
/// Layer order, outermost first:
/// 1. TraceLayer - request spans
/// 2. TimeoutLayer - 30 second request timeout
/// 3. Security flags - CSRF header check, `Set-Cookie` stripping
/// 4. `require_auth` - the auth gate, covering the fallback too
pub fn build_routes(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_state = Arc::new(AuthState {
        gate: Arc::clone(&state.gate),
    });
    let security = state.config.security;
    let metrics_enabled = state.config.metrics_enabled;

    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/login", post(handlers::handle_login))
        .route("/join", post(handlers::handle_join))
        .route("/account", get(handlers::get_account))
        .with_state(state);

    if let (true, Some(handle)) = (metrics_enabled, metrics_handle) {
        let metrics_routes = Router::new()
            .route("/metrics", get(handlers::metrics_handler))
            .with_state(handle);
        router = router.merge(metrics_routes);
    }

    router
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(auth_state, require_auth))
        .layer(middleware::from_fn_with_state(security, apply_security_flags))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}
